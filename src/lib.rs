//! Intrusive, comparator driven [red-black tree][rbtree].
//!
//! Records embed a [`Link`] and implement [`Linked`]. The tree orders them
//! with the [`Comparator`] it was constructed with, and never allocates,
//! moves or frees a record.
//!
//! ```
//! use std::cmp::Ordering;
//! use intrusive_rb::{Link, Linked, RbTree};
//!
//! struct Entry<'a> {
//!     key: i64,
//!     link: Link<'a, Entry<'a>>,
//! }
//!
//! impl<'a> Linked<'a> for Entry<'a> {
//!     fn link(&self) -> &Link<'a, Self> {
//!         &self.link
//!     }
//! }
//!
//! fn by_key(a: &Entry, b: &Entry) -> Ordering {
//!     a.key.cmp(&b.key)
//! }
//!
//! let entries: Vec<Entry> = [30, 10, 20]
//!     .iter()
//!     .map(|key| Entry { key: *key, link: Link::new() })
//!     .collect();
//!
//! let mut tree = RbTree::new("example", by_key);
//! for entry in entries.iter() {
//!     tree.insert(entry).unwrap();
//! }
//! let keys: Vec<i64> = tree.iter().map(|e| e.key).collect();
//! assert_eq!(keys, vec![10, 20, 30]);
//! assert!(tree.is_valid());
//! ```
//!
//! [rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree

mod compare;
mod depth;
mod error;
mod link;
mod rbtree;

pub use crate::compare::{Comparator, Natural, Reverse};
pub use crate::depth::Depth;
pub use crate::error::Error;
pub use crate::link::{Color, Link, Linked};
pub use crate::rbtree::{first, last, next, prev, Iter, RbTree, Stats};
