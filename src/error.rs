use std::{error, fmt};

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Returned by insert() API when an equal node is already present.
    DuplicateKey,
    /// Returned by remove() API when the node is not linked into the tree.
    NotFound,
    /// Returned by insert() API when the node's link is already in use,
    /// either by this tree or by another one.
    AlreadyLinked,
    /// Fatal case, root of the tree is colored red.
    RedRoot,
    /// Fatal case, a red node has a red child.
    ConsecutiveReds,
    /// Fatal case, paths from root to leaf carry different number of
    /// black nodes. The String component can be used for debugging.
    UnbalancedBlacks(String),
    /// Fatal case, node at this in-order position is not strictly greater
    /// than its predecessor.
    SortError(usize),
    /// Fatal case, parent and child links disagree. The String component
    /// can be used for debugging.
    BrokenLink(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateKey => write!(f, "duplicate key"),
            Error::NotFound => write!(f, "node not found"),
            Error::AlreadyLinked => write!(f, "node already linked"),
            Error::RedRoot => write!(f, "root is red"),
            Error::ConsecutiveReds => write!(f, "consecutive red nodes"),
            Error::UnbalancedBlacks(msg) => write!(f, "unbalanced blacks, {}", msg),
            Error::SortError(pos) => write!(f, "sort error at position {}", pos),
            Error::BrokenLink(msg) => write!(f, "broken link, {}", msg),
        }
    }
}

impl error::Error for Error {}
