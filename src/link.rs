use std::{cell::Cell, fmt, ptr};

/// Color of a linked node. Absent children count as black.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Direction of a child link, used to fold the mirrored halves of the
/// balancing algorithms into one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    pub(crate) fn opposite(self) -> Dir {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Link is the balancing record of a red black tree, embedded inside
/// the caller's own record. The tree only ever rewrites a link's color
/// and its parent, left and right references; the rest of the record is
/// left untouched.
///
/// A fresh link, and a link that was just removed from a tree, is
/// _unlinked_: colored red with no parent and no children.
pub struct Link<'a, T> {
    color: Cell<Color>,
    parent: Cell<Option<&'a T>>,
    left: Cell<Option<&'a T>>,
    right: Cell<Option<&'a T>>,
}

/// Records that embed a [`Link`] and can be inserted into a
/// [`RbTree`](crate::RbTree).
///
/// ```
/// use intrusive_rb::{Link, Linked};
///
/// struct Entry<'a> {
///     key: u64,
///     link: Link<'a, Entry<'a>>,
/// }
///
/// impl<'a> Linked<'a> for Entry<'a> {
///     fn link(&self) -> &Link<'a, Self> {
///         &self.link
///     }
/// }
/// ```
pub trait Linked<'a>: Sized + 'a {
    /// Return the link embedded in this record.
    fn link(&self) -> &Link<'a, Self>;
}

impl<'a, T> Link<'a, T> {
    /// Create an unlinked link.
    pub const fn new() -> Link<'a, T> {
        Link {
            color: Cell::new(Color::Red),
            parent: Cell::new(None),
            left: Cell::new(None),
            right: Cell::new(None),
        }
    }

    /// Check whether this link is part of a tree. Every linked node either
    /// has a parent, or is a root and hence black.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.parent.get().is_some() || self.color.get() == Color::Black
    }

    /// Return the current color of this link.
    #[inline]
    pub fn color(&self) -> Color {
        self.color.get()
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&'a T> {
        self.parent.get()
    }

    #[inline]
    pub(crate) fn left(&self) -> Option<&'a T> {
        self.left.get()
    }

    #[inline]
    pub(crate) fn right(&self) -> Option<&'a T> {
        self.right.get()
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Option<&'a T> {
        match dir {
            Dir::Left => self.left.get(),
            Dir::Right => self.right.get(),
        }
    }

    #[inline]
    pub(crate) fn set_parent(&self, parent: Option<&'a T>) {
        self.parent.set(parent)
    }

    #[inline]
    pub(crate) fn set_child(&self, dir: Dir, child: Option<&'a T>) {
        match dir {
            Dir::Left => self.left.set(child),
            Dir::Right => self.right.set(child),
        }
    }

    #[inline]
    pub(crate) fn set_color(&self, color: Color) {
        self.color.set(color)
    }

    #[inline]
    pub(crate) fn set_red(&self) {
        self.color.set(Color::Red)
    }

    #[inline]
    pub(crate) fn set_black(&self) {
        self.color.set(Color::Black)
    }

    #[inline]
    pub(crate) fn is_red(&self) -> bool {
        self.color.get() == Color::Red
    }

    // back to the unlinked state.
    pub(crate) fn reset(&self) {
        self.color.set(Color::Red);
        self.parent.set(None);
        self.left.set(None);
        self.right.set(None);
    }
}

impl<'a, T> Default for Link<'a, T> {
    fn default() -> Self {
        Link::new()
    }
}

impl<'a, T> fmt::Debug for Link<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Link")
            .field("color", &self.color.get())
            .field("linked", &self.is_linked())
            .finish()
    }
}

#[inline]
pub(crate) fn is_red<'a, T: Linked<'a>>(node: Option<&'a T>) -> bool {
    node.map_or(false, |node| node.link().is_red())
}

#[inline]
pub(crate) fn is_black<'a, T: Linked<'a>>(node: Option<&'a T>) -> bool {
    !is_red(node)
}

/// Identity comparison of two optional node handles, `None` being the
/// same as `None`.
#[inline]
pub(crate) fn same<T>(a: Option<&T>, b: Option<&T>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Rec<'a> {
        link: Link<'a, Rec<'a>>,
    }

    impl<'a> Linked<'a> for Rec<'a> {
        fn link(&self) -> &Link<'a, Self> {
            &self.link
        }
    }

    #[test]
    fn test_new_link() {
        let rec = Rec { link: Link::new() };
        assert!(!rec.link.is_linked());
        assert_eq!(rec.link.color(), Color::Red);
        assert!(rec.link.parent().is_none());
        assert!(rec.link.left().is_none());
        assert!(rec.link.right().is_none());
    }

    #[test]
    fn test_color_of_none() {
        assert!(is_black::<Rec>(None));
        assert!(!is_red::<Rec>(None));
    }

    #[test]
    fn test_reset() {
        let recs = vec![Rec { link: Link::new() }, Rec { link: Link::new() }];
        recs[0].link.set_black();
        recs[0].link.set_child(Dir::Left, Some(&recs[1]));
        recs[1].link.set_parent(Some(&recs[0]));
        assert!(recs[0].link.is_linked());
        assert!(recs[1].link.is_linked());
        assert!(same(recs[0].link.child(Dir::Left), Some(&recs[1])));

        recs[0].link.reset();
        assert!(!recs[0].link.is_linked());
        assert!(recs[0].link.left().is_none());
    }

    #[test]
    fn test_same() {
        let recs = vec![Rec { link: Link::new() }, Rec { link: Link::new() }];
        assert!(same::<Rec>(None, None));
        assert!(same(Some(&recs[0]), Some(&recs[0])));
        assert!(!same(Some(&recs[0]), Some(&recs[1])));
        assert!(!same(Some(&recs[0]), None));
        assert_eq!(Dir::Left.opposite(), Dir::Right);
    }
}
