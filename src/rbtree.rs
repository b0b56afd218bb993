use std::{
    cmp::Ordering,
    marker::PhantomData,
    mem,
    ops::Bound,
    ptr,
};

use log::{debug, warn};
use rand::Rng;

use crate::compare::Comparator;
use crate::depth::Depth;
use crate::error::Error;
use crate::link::{is_black, same, Color, Dir, Link, Linked};

/// RbTree manage a single instance of an intrusive, in-memory index using
/// [red-black][rbtree] tree.
///
/// The tree never allocates and never owns its nodes. Records embed a
/// [`Link`] and are handed to the tree as shared references that must
/// outlive it, and are ordered by the [`Comparator`] bound at construction.
/// Equal records are never linked together.
///
/// [rbtree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    name: String,
    root: Option<&'a T>,
    cmp: C,
    n_count: usize, // number of entries in the tree.
}

/// Different ways to construct a new RbTree instance.
impl<'a, T, C> RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    /// Create an empty instance of RbTree, identified by `name` and
    /// ordered by `cmp`. Applications can choose unique names.
    pub fn new<S>(name: S, cmp: C) -> RbTree<'a, T, C>
    where
        S: AsRef<str>,
    {
        RbTree {
            name: name.as_ref().to_string(),
            root: Default::default(),
            cmp,
            n_count: Default::default(),
        }
    }

    /// Create a new instance of RbTree and link every record from
    /// `iter`. On the first failing insert, every record linked so far is
    /// unlinked again and the error is returned.
    pub fn load_from<S, I>(name: S, cmp: C, iter: I) -> Result<RbTree<'a, T, C>, Error>
    where
        S: AsRef<str>,
        I: Iterator<Item = &'a T>,
    {
        let mut tree = RbTree::new(name, cmp);
        for node in iter {
            if let Err(err) = tree.insert(node) {
                tree.clear();
                return Err(err);
            }
        }
        Ok(tree)
    }
}

/// Maintenance API.
impl<'a, T, C> RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating RbTree instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return quickly with basic statisics, only entries() and link_size()
    /// are valid with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.n_count, mem::size_of::<Link<'a, T>>())
    }

    /// Unlink every record from this instance. Records are left in the
    /// unlinked state and can be inserted again, into this tree or another.
    /// Dropping a tree without clearing it leaves its records marked as
    /// linked.
    pub fn clear(&mut self) {
        let mut stack: Vec<&'a T> = self.root.take().into_iter().collect();
        while let Some(node) = stack.pop() {
            let link = node.link();
            stack.extend(link.left());
            stack.extend(link.right());
            link.reset();
        }
        debug!("{}: cleared {} entries", self.name, self.n_count);
        self.n_count = 0;
    }
}

/// Write operations on RbTree instance.
impl<'a, T, C> RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    /// Link `node` into the tree and return it. If an equal record is
    /// already present return [`Error::DuplicateKey`], if `node` is already
    /// linked somewhere return [`Error::AlreadyLinked`]. In both cases the
    /// tree is left untouched.
    pub fn insert(&mut self, node: &'a T) -> Result<&'a T, Error> {
        let link = node.link();
        if link.is_linked() {
            return Err(Error::AlreadyLinked);
        }

        let mut parent = match self.root {
            Some(root) => root,
            None => {
                link.reset();
                link.set_black();
                self.root = Some(node);
                self.n_count += 1;
                return Ok(node);
            }
        };

        let dir = loop {
            let dir = match self.cmp.compare(node, parent) {
                Ordering::Less => Dir::Left,
                Ordering::Greater => Dir::Right,
                Ordering::Equal => return Err(Error::DuplicateKey),
            };
            match parent.link().child(dir) {
                Some(child) => parent = child,
                None => break dir,
            }
        };

        link.reset();
        link.set_parent(Some(parent));
        parent.link().set_child(dir, Some(node));
        self.insert_fixup(node);

        self.n_count += 1;
        Ok(node)
    }

    /// Unlink `node` from the tree and return it. The very same record,
    /// not merely an equal one, must be linked into this tree, else
    /// return [`Error::NotFound`]. On success the record is back in the
    /// unlinked state and the caller may reuse or drop it.
    pub fn remove(&mut self, node: &'a T) -> Result<&'a T, Error> {
        match self.search(node) {
            Some(found) if ptr::eq(found, node) => (),
            _ => return Err(Error::NotFound),
        }

        let link = node.link();
        let (child, parent, color) = match (link.left(), link.right()) {
            (None, child) | (child, None) => {
                let parent = link.parent();
                self.transplant(node, child);
                (child, parent, link.color())
            }
            (Some(left), Some(right)) => {
                let next = first(right);
                let nlink = next.link();
                let (color, child) = (nlink.color(), nlink.right());

                let parent = if ptr::eq(next, right) {
                    Some(next)
                } else {
                    let parent = nlink.parent();
                    self.transplant(next, child);
                    nlink.set_child(Dir::Right, Some(right));
                    right.link().set_parent(Some(next));
                    parent
                };

                self.transplant(node, Some(next));
                nlink.set_child(Dir::Left, Some(left));
                left.link().set_parent(Some(next));
                nlink.set_color(link.color());
                (child, parent, color)
            }
        };

        // a black node went missing from every path through `child`.
        if color == Color::Black {
            self.remove_fixup(child, parent);
        }

        link.reset();
        self.n_count -= 1;
        Ok(node)
    }

    /// Validate red-black tree with following rules:
    ///
    /// * Root is black.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Every path from root to leaf carries the same number of blacks.
    /// * Every child links back to its parent.
    /// * Records are in strictly increasing order.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error> {
        let res = self.do_validate();
        if let Err(err) = &res {
            warn!("{}: invalid tree, {}", self.name, err);
        }
        res
    }

    /// Same as [`RbTree::validate`], without the statistics.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Read operations on RbTree instance.
impl<'a, T, C> RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    /// Return the linked record that compares equal to `probe`. `probe`
    /// itself need not be linked.
    pub fn search(&self, probe: &T) -> Option<&'a T> {
        let mut node = self.root;
        while let Some(curr) = node {
            node = match self.cmp.compare(probe, curr) {
                Ordering::Less => curr.link().left(),
                Ordering::Greater => curr.link().right(),
                Ordering::Equal => return Some(curr),
            };
        }
        None
    }

    /// Return the smallest record in this instance.
    pub fn first(&self) -> Option<&'a T> {
        self.root.map(first)
    }

    /// Return the largest record in this instance.
    pub fn last(&self) -> Option<&'a T> {
        self.root.map(last)
    }

    /// Return a random record from this index.
    pub fn random<R: Rng>(&self, rng: &mut R) -> Option<&'a T> {
        let mut node = self.root?;

        let mut at_depth = rng.gen::<u8>() % 40;
        loop {
            let next = match rng.gen::<u8>() % 2 {
                0 => node.link().left(),
                _ => node.link().right(),
            };
            match next {
                Some(next) if at_depth > 0 => {
                    at_depth -= 1;
                    node = next;
                }
                _ => break Some(node),
            }
        }
    }

    /// Return an iterator over all records in ascending order. The
    /// iterator is double ended, use `rev()` for descending order.
    pub fn iter(&self) -> Iter<'_, 'a, T> {
        Iter::new(self.first(), self.last())
    }

    /// Range over records between `low` and `high` probes, in ascending
    /// order. Bounds are compared with the tree's comparator, and the
    /// probes need not be linked.
    pub fn range(&self, low: Bound<&T>, high: Bound<&T>) -> Iter<'_, 'a, T> {
        match (self.lower_bound(low), self.upper_bound(high)) {
            (Some(front), Some(back)) => match self.cmp.compare(front, back) {
                Ordering::Greater => Iter::new(None, None),
                _ => Iter::new(Some(front), Some(back)),
            },
            _ => Iter::new(None, None),
        }
    }

    // smallest record after `bound`.
    fn lower_bound(&self, bound: Bound<&T>) -> Option<&'a T> {
        let (probe, inclusive) = match bound {
            Bound::Included(probe) => (probe, true),
            Bound::Excluded(probe) => (probe, false),
            Bound::Unbounded => return self.first(),
        };

        let (mut node, mut found) = (self.root, None);
        while let Some(curr) = node {
            let ok = match self.cmp.compare(curr, probe) {
                Ordering::Greater => true,
                Ordering::Equal => inclusive,
                Ordering::Less => false,
            };
            node = if ok {
                found = Some(curr);
                curr.link().left()
            } else {
                curr.link().right()
            };
        }
        found
    }

    // largest record before `bound`.
    fn upper_bound(&self, bound: Bound<&T>) -> Option<&'a T> {
        let (probe, inclusive) = match bound {
            Bound::Included(probe) => (probe, true),
            Bound::Excluded(probe) => (probe, false),
            Bound::Unbounded => return self.last(),
        };

        let (mut node, mut found) = (self.root, None);
        while let Some(curr) = node {
            let ok = match self.cmp.compare(curr, probe) {
                Ordering::Less => true,
                Ordering::Equal => inclusive,
                Ordering::Greater => false,
            };
            node = if ok {
                found = Some(curr);
                curr.link().right()
            } else {
                curr.link().left()
            };
        }
        found
    }
}

impl<'a, T, C> RbTree<'a, T, C>
where
    T: Linked<'a>,
    C: Comparator<T>,
{
    fn insert_fixup(&mut self, mut node: &'a T) {
        while let Some(parent) = node.link().parent().filter(|p| p.link().is_red()) {
            let grand = match parent.link().parent() {
                Some(grand) => grand,
                None => panic!("insert_fixup(): red root ? Call the programmer"),
            };
            let side = if same(grand.link().left(), Some(parent)) {
                Dir::Left
            } else {
                Dir::Right
            };

            match grand.link().child(side.opposite()) {
                // case 1: red uncle, push the red up to grand parent.
                Some(uncle) if uncle.link().is_red() => {
                    parent.link().set_black();
                    uncle.link().set_black();
                    grand.link().set_red();
                    node = grand;
                }
                _ => {
                    let mut parent = parent;
                    // case 2: inner child, rotate it to the outside.
                    if same(parent.link().child(side.opposite()), Some(node)) {
                        self.rotate(parent, side);
                        parent = node;
                    }
                    // case 3: outer child.
                    parent.link().set_black();
                    grand.link().set_red();
                    self.rotate(grand, side.opposite());
                    break;
                }
            }
        }

        if let Some(root) = self.root {
            root.link().set_black();
        }
    }

    // `node` is where the black went missing, possibly an absent child of
    // `parent`, hence the explicit parent.
    fn remove_fixup(&mut self, mut node: Option<&'a T>, mut parent: Option<&'a T>) {
        while is_black(node) && !same(node, self.root) {
            let pnode = match parent {
                Some(pnode) => pnode,
                None => break,
            };
            let plink = pnode.link();
            let side = if same(plink.left(), node) {
                Dir::Left
            } else {
                Dir::Right
            };

            let mut sibling = sibling_of(pnode, side);
            // case 1: red sibling, make it the grand parent.
            if sibling.link().is_red() {
                sibling.link().set_black();
                plink.set_red();
                self.rotate(pnode, side);
                sibling = sibling_of(pnode, side);
            }

            let slink = sibling.link();
            if is_black(slink.left()) && is_black(slink.right()) {
                // case 2: push the deficiency up to parent.
                slink.set_red();
                node = Some(pnode);
                parent = plink.parent();
                continue;
            }

            // case 3: far child is black, near child is red.
            if is_black(slink.child(side.opposite())) {
                if let Some(near) = slink.child(side) {
                    near.link().set_black();
                }
                slink.set_red();
                self.rotate(sibling, side.opposite());
                sibling = sibling_of(pnode, side);
            }

            // case 4: far child is red.
            let slink = sibling.link();
            slink.set_color(plink.color());
            plink.set_black();
            if let Some(far) = slink.child(side.opposite()) {
                far.link().set_black();
            }
            self.rotate(pnode, side);
            node = self.root;
            parent = None;
        }

        if let Some(node) = node {
            node.link().set_black();
        }
    }

    //--------- rotation routines ----------------

    // Rotate `node` down towards `dir`, its child on the other side takes
    // its place. Dir::Left is a left rotation:
    //
    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    \                    /   \
    //            /      \                  /     \
    //          left      x              node      xr
    //                   / \             /  \
    //                 xl   xr        left   xl
    //
    fn rotate(&mut self, node: &'a T, dir: Dir) {
        let link = node.link();
        let x = match link.child(dir.opposite()) {
            Some(x) => x,
            None => panic!("rotate(): nothing to rotate ? Call the programmer"),
        };
        let xlink = x.link();

        let inner = xlink.child(dir);
        link.set_child(dir.opposite(), inner);
        if let Some(inner) = inner {
            inner.link().set_parent(Some(node));
        }

        let parent = link.parent();
        self.replace_child(parent, node, Some(x));
        xlink.set_parent(parent);

        xlink.set_child(dir, Some(node));
        link.set_parent(Some(x));
    }

    // Replace `old`'s position with `new`, leaving new's children alone.
    fn transplant(&mut self, old: &'a T, new: Option<&'a T>) {
        let parent = old.link().parent();
        self.replace_child(parent, old, new);
        if let Some(new) = new {
            new.link().set_parent(parent);
        }
    }

    fn replace_child(&mut self, parent: Option<&'a T>, old: &'a T, new: Option<&'a T>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let plink = parent.link();
                if same(plink.left(), Some(old)) {
                    plink.set_child(Dir::Left, new);
                } else {
                    plink.set_child(Dir::Right, new);
                }
            }
        }
    }

    //--------- validation routines ----------------

    fn do_validate(&self) -> Result<Stats, Error> {
        let mut stats = Stats::new(self.n_count, mem::size_of::<Link<'a, T>>());
        stats.set_depths(Depth::new());

        let root = match self.root {
            Some(root) => root,
            None if self.n_count == 0 => {
                if let Some(depths) = stats.depths.as_mut() {
                    depths.sample(0);
                }
                stats.set_blacks(1);
                return Ok(stats);
            }
            None => {
                let err = format!("empty tree with {} entries", self.n_count);
                return Err(Error::BrokenLink(err));
            }
        };

        if root.link().is_red() {
            return Err(Error::RedRoot);
        }
        if root.link().parent().is_some() {
            return Err(Error::BrokenLink("root has a parent".to_string()));
        }

        let (mut prev, mut count) = (None, 0);
        let mut node = Some(first(root));
        while let Some(curr) = node {
            if let Some(prev) = prev {
                if self.cmp.compare(prev, curr) != Ordering::Less {
                    return Err(Error::SortError(count));
                }
            }
            count += 1;
            prev = Some(curr);
            node = next(curr);
        }
        if count != self.n_count {
            let err = format!("walked {} entries, counted {}", count, self.n_count);
            return Err(Error::BrokenLink(err));
        }

        // black height, absent leaves included, along the left spine.
        let mut blacks = 1;
        let mut node = Some(root);
        while let Some(curr) = node {
            if curr.link().color() == Color::Black {
                blacks += 1;
            }
            node = curr.link().left();
        }

        Self::validate_tree(Some(root), None, false, 0, 0, blacks, &mut stats)?;
        stats.set_blacks(blacks);
        Ok(stats)
    }

    fn validate_tree(
        node: Option<&'a T>,
        parent: Option<&'a T>,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        blacks: usize,
        stats: &mut Stats,
    ) -> Result<(), Error> {
        let node = match node {
            Some(node) => node,
            None => {
                if let Some(depths) = stats.depths.as_mut() {
                    depths.sample(depth);
                }
                if nb + 1 != blacks {
                    let err = format!("expected: {} actual: {}", blacks, nb + 1);
                    return Err(Error::UnbalancedBlacks(err));
                }
                return Ok(());
            }
        };

        let link = node.link();
        if !same(link.parent(), parent) {
            let err = format!("child at depth {} does not link back", depth);
            return Err(Error::BrokenLink(err));
        }

        let red = link.is_red();
        if fromred && red {
            return Err(Error::ConsecutiveReds);
        }
        if !red {
            nb += 1;
        }

        let (left, right) = (link.left(), link.right());
        Self::validate_tree(left, Some(node), red, nb, depth + 1, blacks, stats)?;
        Self::validate_tree(right, Some(node), red, nb, depth + 1, blacks, stats)
    }
}

fn sibling_of<'a, T: Linked<'a>>(parent: &'a T, side: Dir) -> &'a T {
    match parent.link().child(side.opposite()) {
        Some(sibling) => sibling,
        None => panic!("remove_fixup(): missing sibling ? Call the programmer"),
    }
}

/// Return the left-most record in the subtree rooted at `node`.
pub fn first<'a, T: Linked<'a>>(node: &'a T) -> &'a T {
    let mut node = node;
    while let Some(left) = node.link().left() {
        node = left;
    }
    node
}

/// Return the right-most record in the subtree rooted at `node`.
pub fn last<'a, T: Linked<'a>>(node: &'a T) -> &'a T {
    let mut node = node;
    while let Some(right) = node.link().right() {
        node = right;
    }
    node
}

/// Return the in-order successor of a linked `node`, None if `node` is
/// the last record in its tree, or is not linked.
pub fn next<'a, T: Linked<'a>>(node: &'a T) -> Option<&'a T> {
    if let Some(right) = node.link().right() {
        return Some(first(right));
    }

    let (mut node, mut parent) = (node, node.link().parent());
    while let Some(pnode) = parent {
        if !same(pnode.link().right(), Some(node)) {
            break;
        }
        node = pnode;
        parent = pnode.link().parent();
    }
    parent
}

/// Return the in-order predecessor of a linked `node`, None if `node` is
/// the first record in its tree, or is not linked.
pub fn prev<'a, T: Linked<'a>>(node: &'a T) -> Option<&'a T> {
    if let Some(left) = node.link().left() {
        return Some(last(left));
    }

    let (mut node, mut parent) = (node, node.link().parent());
    while let Some(pnode) = parent {
        if !same(pnode.link().left(), Some(node)) {
            break;
        }
        node = pnode;
        parent = pnode.link().parent();
    }
    parent
}

/// Double ended iterator over a run of linked records, returned by
/// [`RbTree::iter`] and [`RbTree::range`].
pub struct Iter<'t, 'a, T> {
    front: Option<&'a T>,
    back: Option<&'a T>,
    _tree: PhantomData<&'t ()>,
}

impl<'t, 'a, T> Iter<'t, 'a, T> {
    fn new(front: Option<&'a T>, back: Option<&'a T>) -> Iter<'t, 'a, T> {
        Iter {
            front,
            back,
            _tree: PhantomData,
        }
    }

    // yielding the last item of the run.
    #[inline]
    fn finish(&mut self) {
        self.front = None;
        self.back = None;
    }
}

impl<'t, 'a, T> Iterator for Iter<'t, 'a, T>
where
    T: Linked<'a>,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.front?;
        if same(self.front, self.back) {
            self.finish();
        } else {
            self.front = next(item);
        }
        Some(item)
    }
}

impl<'t, 'a, T> DoubleEndedIterator for Iter<'t, 'a, T>
where
    T: Linked<'a>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.back?;
        if same(self.front, self.back) {
            self.finish();
        } else {
            self.back = prev(item);
        }
        Some(item)
    }
}

/// Statistics on [`RbTree`]. Serves two purpose:
///
/// * To get partial but quick statistics via [`RbTree::stats`] method.
/// * To get full statisics via [`RbTree::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    link_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, link_size: usize) -> Stats {
        Stats {
            entries,
            link_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number entries in [`RbTree`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return the size of the [`Link`] embedded in every record, which is
    /// the entire per-record overhead of the tree.
    #[inline]
    pub fn link_size(&self) -> usize {
        self.link_size
    }

    /// Return number of black nodes from root to leaf, counting the
    /// absent leaf itself.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths.as_ref().filter(|d| d.samples() > 0).cloned()
    }
}
