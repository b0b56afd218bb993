use std::cmp::Ordering;

/// Comparator defines the strict total order of records in a tree. It is
/// bound to the tree at construction and called on every descent step, so
/// it must be pure: the same pair of records shall always compare the same
/// way for as long as they are linked.
///
/// Any `Fn(&T, &T) -> Ordering` closure is a comparator.
pub trait Comparator<T> {
    /// Compare `a` with `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Order records by their own [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Natural;

impl<T: Ord> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

/// Reverse the order of another comparator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse<C>(pub C);

impl<T, C: Comparator<T>> Comparator<T> for Reverse<C> {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self.0.compare(b, a)
    }
}
