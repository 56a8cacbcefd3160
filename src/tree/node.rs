//! MPQ-tree node model
//!
//! Two variants share one `Node` type:
//!   P-node: unordered children plus a vertex bag (no children = leaf)
//!   Q-node: ordered sections, one child each; every vertex of the Q-node
//!           occupies a consecutive span of sections
//!
//! A Q-node owns its vertices as a whole (the locator points at the Q-node).
//! Each section keeps the bag of vertices covering it, kept in step with the
//! spans by every mutation.

use super::NodeId;
use crate::graph::Vertex;
use std::collections::{vec_deque, BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::ops::Range;
use std::slice;

/// Inclusive range of Q-node sections occupied by one vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Leftmost section (inclusive)
    pub first: usize,

    /// Rightmost section (inclusive)
    pub last: usize,
}

impl Span {
    /// Create a span over `first..=last`
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "span must not be empty");
        Self { first, last }
    }

    /// Check whether section `j` lies inside the span
    #[inline]
    pub fn contains(&self, j: usize) -> bool {
        self.first <= j && j <= self.last
    }

    /// Number of sections covered
    #[inline]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// P-node (or leaf when `children` is empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PNode {
    pub(crate) bag: BTreeSet<Vertex>,
    pub(crate) children: Vec<NodeId>,
}

impl PNode {
    /// P-node holding `bag` above `children`
    pub fn new(bag: BTreeSet<Vertex>, children: Vec<NodeId>) -> Self {
        Self { bag, children }
    }

    /// Leaf holding `bag`
    pub fn leaf(bag: BTreeSet<Vertex>) -> Self {
        Self {
            bag,
            children: Vec::new(),
        }
    }

    /// Vertices stored at this node
    pub fn bag(&self) -> &BTreeSet<Vertex> {
        &self.bag
    }

    /// Children (order carries no meaning)
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True when the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// One Q-node section: its child and the vertices covering it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    child: NodeId,
    bag: BTreeSet<Vertex>,
}

impl Section {
    fn new(child: NodeId) -> Self {
        Self {
            child,
            bag: BTreeSet::new(),
        }
    }
}

/// Q-node: ordered sections with vertex spans
///
/// Sections live in a deque and carry integer coordinates (`origin` plus
/// their deque index). Spans are stored in coordinates, so growing the node
/// at either end leaves them untouched; a gap opened inside the node moves
/// the shorter side only. Reversal flips an orientation flag. Section
/// indices seen through the public API run left to right in the current
/// orientation.
#[derive(Debug, Clone, Default)]
pub struct QNode {
    sections: VecDeque<Section>,
    origin: isize,
    reversed: bool,
    spans: BTreeMap<Vertex, (isize, isize)>,
    slots: HashMap<NodeId, isize>,
}

impl QNode {
    /// Q-node with one child per section
    pub fn new(sections: Vec<NodeId>, spans: BTreeMap<Vertex, Span>) -> Self {
        let mut q = Self::default();
        q.insert_sections(0, sections);
        for (v, span) in spans {
            q.cover(v, span.first as isize, span.last as isize);
        }
        q
    }

    /// Child of every section, left to right
    pub fn sections(&self) -> Sections<'_> {
        Sections {
            inner: self.sections.iter(),
            reversed: self.reversed,
        }
    }

    /// Child of section `j`
    pub fn section(&self, j: usize) -> Option<NodeId> {
        self.get(j).map(|s| s.child)
    }

    /// Number of sections
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Span of every vertex owned by the Q-node, by ascending vertex
    pub fn spans(&self) -> impl Iterator<Item = (Vertex, Span)> + '_ {
        self.spans.iter().map(move |(&v, &ends)| (v, self.logical(ends)))
    }

    /// Span of `v`, if the Q-node owns it
    pub fn span(&self, v: Vertex) -> Option<Span> {
        self.spans.get(&v).map(|&ends| self.logical(ends))
    }

    /// Check whether the Q-node owns `v`
    pub fn contains(&self, v: Vertex) -> bool {
        self.spans.contains_key(&v)
    }

    /// Number of vertices owned
    pub fn vertex_count(&self) -> usize {
        self.spans.len()
    }

    /// Vertices owned, ascending
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.spans.keys().copied()
    }

    /// Vertices covering section `j`
    pub fn section_bag(&self, j: usize) -> Option<&BTreeSet<Vertex>> {
        self.get(j).map(|s| &s.bag)
    }

    /// Index of the section whose child is `child`
    pub fn section_of(&self, child: NodeId) -> Option<usize> {
        self.slots.get(&child).map(|&c| self.index_of(c))
    }

    /// Mirror the section order
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Coordinate of section `j`
    pub(crate) fn coord(&self, j: usize) -> isize {
        self.origin + self.physical(j) as isize
    }

    /// Insert `children`, left to right, as new sections in front of section
    /// `gap` (`gap == section_count()` appends). Returns their coordinates,
    /// left to right. New sections start with empty bags.
    pub(crate) fn insert_sections(&mut self, gap: usize, children: Vec<NodeId>) -> Vec<isize> {
        let m = self.sections.len();
        let n = children.len();
        let mut physical = children;
        if self.reversed {
            physical.reverse();
        }
        let h = if self.reversed { m - gap } else { gap };
        let delta = n as isize;

        let start = if h <= m - h {
            self.shift(0..h, -delta);
            self.origin -= delta;
            let head: Vec<Section> = self.sections.drain(..h).collect();
            for &child in physical.iter().rev() {
                self.sections.push_front(Section::new(child));
            }
            for section in head.into_iter().rev() {
                self.sections.push_front(section);
            }
            self.origin + h as isize
        } else {
            self.shift(h..m, delta);
            let tail = self.sections.split_off(h);
            self.sections
                .extend(physical.iter().map(|&child| Section::new(child)));
            self.sections.extend(tail);
            self.origin + h as isize
        };

        let mut coords: Vec<isize> = (0..delta).map(|i| start + i).collect();
        for (&child, &c) in physical.iter().zip(&coords) {
            self.slots.insert(child, c);
        }
        if self.reversed {
            coords.reverse();
        }
        coords
    }

    /// Stretch the span of `v` over the coordinates `a..=b` and enter `v` in
    /// the bag of every section in that range and in the stretch
    pub(crate) fn cover(&mut self, v: Vertex, a: isize, b: isize) {
        let (a, b) = (a.min(b), a.max(b));
        let old = self.spans.get(&v).copied();
        let (first, last) = match old {
            Some((f, l)) => (f.min(a), l.max(b)),
            None => (a, b),
        };
        self.spans.insert(v, (first, last));
        self.fill(v, a, b);
        if let Some((f, l)) = old {
            self.fill(v, first, f - 1);
            self.fill(v, l + 1, last);
        }
    }

    /// Put `new` where `old` was; false when `old` is not a section child
    pub(crate) fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(c) = self.slots.remove(&old) else {
            return false;
        };
        if let Some(section) = self.at_mut(c) {
            section.child = new;
        }
        self.slots.insert(new, c);
        true
    }

    /// Bags, spans and child slots agree; `Err` carries the first bad section
    pub(crate) fn audit(&self) -> Result<(), usize> {
        let mut entries = 0;
        for (&v, &(first, last)) in &self.spans {
            for c in first..=last {
                match self.at(c) {
                    Some(section) if section.bag.contains(&v) => entries += 1,
                    _ => return Err(self.index_of(c).min(self.sections.len())),
                }
            }
        }
        for (j, child) in self.sections().enumerate() {
            if self.section_of(child) != Some(j) {
                return Err(j);
            }
        }
        let stored: usize = self.sections.iter().map(|s| s.bag.len()).sum();
        if stored != entries || self.slots.len() != self.sections.len() {
            return Err(0);
        }
        Ok(())
    }

    fn physical(&self, j: usize) -> usize {
        if self.reversed {
            self.sections.len() - 1 - j
        } else {
            j
        }
    }

    fn index_of(&self, c: isize) -> usize {
        let i = usize::try_from(c - self.origin).unwrap_or(usize::MAX);
        if self.reversed {
            i.checked_add(1)
                .and_then(|i| self.sections.len().checked_sub(i))
                .unwrap_or(usize::MAX)
        } else {
            i
        }
    }

    fn logical(&self, (a, b): (isize, isize)) -> Span {
        let (x, y) = (self.index_of(a), self.index_of(b));
        Span::new(x.min(y), x.max(y))
    }

    fn get(&self, j: usize) -> Option<&Section> {
        if j >= self.sections.len() {
            return None;
        }
        self.sections.get(self.physical(j))
    }

    fn at(&self, c: isize) -> Option<&Section> {
        usize::try_from(c - self.origin)
            .ok()
            .and_then(|i| self.sections.get(i))
    }

    fn at_mut(&mut self, c: isize) -> Option<&mut Section> {
        usize::try_from(c - self.origin)
            .ok()
            .and_then(|i| self.sections.get_mut(i))
    }

    fn fill(&mut self, v: Vertex, from: isize, to: isize) {
        for c in from..=to {
            if let Some(section) = self.at_mut(c) {
                section.bag.insert(v);
            }
        }
    }

    /// Move the sections at deque positions `range` by `delta` coordinates
    fn shift(&mut self, range: Range<usize>, delta: isize) {
        if range.is_empty() {
            return;
        }
        let lo = self.origin + range.start as isize;
        let hi = self.origin + range.end as isize - 1;
        let mut moved = BTreeSet::new();
        for section in self.sections.range(range) {
            moved.extend(section.bag.iter().copied());
            if let Some(slot) = self.slots.get_mut(&section.child) {
                *slot += delta;
            }
        }
        for v in moved {
            if let Some((first, last)) = self.spans.get_mut(&v) {
                if (lo..=hi).contains(first) {
                    *first += delta;
                }
                if (lo..=hi).contains(last) {
                    *last += delta;
                }
            }
        }
    }
}

/// Equal when the sections, bags and spans read the same left to right
impl PartialEq for QNode {
    fn eq(&self, other: &Self) -> bool {
        self.sections().eq(other.sections())
            && (0..self.section_count()).all(|j| self.section_bag(j) == other.section_bag(j))
            && self.spans().eq(other.spans())
    }
}

impl Eq for QNode {}

/// Section children of a Q-node in left-to-right order
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    inner: vec_deque::Iter<'a, Section>,
    reversed: bool,
}

impl Iterator for Sections<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let section = if self.reversed {
            self.inner.next_back()
        } else {
            self.inner.next()
        };
        section.map(|s| s.child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Sections<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let section = if self.reversed {
            self.inner.next()
        } else {
            self.inner.next_back()
        };
        section.map(|s| s.child)
    }
}

impl ExactSizeIterator for Sections<'_> {}

/// Child handles of a node
#[derive(Debug, Clone)]
pub enum Children<'a> {
    /// P-node children
    P(slice::Iter<'a, NodeId>),
    /// Q-node sections, left to right
    Q(Sections<'a>),
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        match self {
            Children::P(it) => it.next().copied(),
            Children::Q(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Children::P(it) => it.size_hint(),
            Children::Q(it) => it.size_hint(),
        }
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        match self {
            Children::P(it) => it.next_back().copied(),
            Children::Q(it) => it.next_back(),
        }
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Node variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Unordered node or leaf
    P(PNode),
    /// Ordered node
    Q(QNode),
}

/// Tree node: variant plus parent link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn p(bag: BTreeSet<Vertex>, children: Vec<NodeId>) -> Self {
        Self {
            parent: None,
            kind: NodeKind::P(PNode::new(bag, children)),
        }
    }

    pub(crate) fn leaf(bag: BTreeSet<Vertex>) -> Self {
        Self {
            parent: None,
            kind: NodeKind::P(PNode::leaf(bag)),
        }
    }

    pub(crate) fn q(sections: Vec<NodeId>, spans: BTreeMap<Vertex, Span>) -> Self {
        Self::chain(QNode::new(sections, spans))
    }

    pub(crate) fn chain(q: QNode) -> Self {
        Self {
            parent: None,
            kind: NodeKind::Q(q),
        }
    }

    /// Parent handle (`None` for the root)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Variant
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// True for P-nodes without children
    pub fn is_leaf(&self) -> bool {
        matches!(&self.kind, NodeKind::P(p) if p.is_leaf())
    }

    /// Child handles (section order for Q-nodes)
    pub fn children(&self) -> Children<'_> {
        match &self.kind {
            NodeKind::P(p) => Children::P(p.children.iter()),
            NodeKind::Q(q) => Children::Q(q.sections()),
        }
    }

    /// Child at position `idx` of `children()`
    pub fn child(&self, idx: usize) -> Option<NodeId> {
        match &self.kind {
            NodeKind::P(p) => p.children.get(idx).copied(),
            NodeKind::Q(q) => q.section(idx),
        }
    }

    /// Number of children
    pub fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::P(p) => p.children.len(),
            NodeKind::Q(q) => q.section_count(),
        }
    }

    /// Number of vertices owned by the node
    pub fn bag_len(&self) -> usize {
        match &self.kind {
            NodeKind::P(p) => p.bag.len(),
            NodeKind::Q(q) => q.vertex_count(),
        }
    }

    /// Check whether the node owns `v`
    pub fn contains(&self, v: Vertex) -> bool {
        match &self.kind {
            NodeKind::P(p) => p.bag.contains(&v),
            NodeKind::Q(q) => q.contains(v),
        }
    }

    /// Vertices owned by the node, ascending
    pub fn vertices(&self) -> Vec<Vertex> {
        match &self.kind {
            NodeKind::P(p) => p.bag.iter().copied().collect(),
            NodeKind::Q(q) => q.vertices().collect(),
        }
    }

    /// Short name of the variant ("leaf", "P", "Q")
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::P(p) if p.is_leaf() => "leaf",
            NodeKind::P(_) => "P",
            NodeKind::Q(_) => "Q",
        }
    }
}

pub(crate) fn format_bag<'a, I>(f: &mut fmt::Formatter<'_>, bag: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Vertex>,
{
    let parts: Vec<String> = bag.into_iter().map(|v| v.to_string()).collect();
    write!(f, "{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: Range<u32>) -> Vec<NodeId> {
        range.map(NodeId::from_raw).collect()
    }

    fn bags(q: &QNode) -> Vec<Vec<Vertex>> {
        (0..q.section_count())
            .map(|j| q.section_bag(j).unwrap().iter().copied().collect())
            .collect()
    }

    #[test]
    fn test_span_bounds() {
        let span = Span::new(1, 2);
        assert_eq!(span.len(), 2);
        assert!(span.contains(2));
        assert!(!span.contains(3));
    }

    #[test]
    fn test_section_bags_follow_spans() {
        let spans = BTreeMap::from([(7, Span::new(0, 1)), (8, Span::new(1, 2))]);
        let mut q = QNode::new(ids(0..3), spans);

        assert_eq!(bags(&q), vec![vec![7], vec![7, 8], vec![8]]);
        assert_eq!(q.section_of(NodeId::from_raw(2)), Some(2));

        q.reverse();
        assert_eq!(bags(&q), vec![vec![8], vec![7, 8], vec![7]]);
        assert_eq!(q.span(7), Some(Span::new(1, 2)));
        assert_eq!(q.section_of(NodeId::from_raw(2)), Some(0));
        assert_eq!(q.sections().collect::<Vec<_>>(), ids(0..3).into_iter().rev().collect::<Vec<_>>());
        assert_eq!(q.audit(), Ok(()));
    }

    #[test]
    fn test_growing_at_either_end_keeps_stored_spans() {
        let spans = BTreeMap::from([(1, Span::new(0, 1)), (2, Span::new(1, 2))]);
        let mut q = QNode::new(ids(0..3), spans);
        let stored = q.spans.clone();

        let front = q.insert_sections(0, vec![NodeId::from_raw(10)]);
        q.cover(3, front[0], q.coord(1));
        let back = q.insert_sections(q.section_count(), vec![NodeId::from_raw(11)]);
        q.cover(4, q.coord(3), back[0]);

        assert_eq!(q.spans[&1], stored[&1]);
        assert_eq!(q.spans[&2], stored[&2]);
        assert_eq!(q.span(1), Some(Span::new(1, 2)));
        assert_eq!(q.span(3), Some(Span::new(0, 1)));
        assert_eq!(q.span(4), Some(Span::new(3, 4)));
        assert_eq!(bags(&q), vec![vec![3], vec![1, 3], vec![1, 2], vec![2, 4], vec![4]]);
        assert_eq!(q.audit(), Ok(()));
    }

    #[test]
    fn test_inner_gap_moves_the_shorter_side() {
        let spans = BTreeMap::from([
            (1, Span::new(0, 1)),
            (2, Span::new(1, 3)),
            (3, Span::new(3, 4)),
        ]);
        let mut q = QNode::new(ids(0..5), spans);
        let right = q.spans[&3];

        let coords = q.insert_sections(2, vec![NodeId::from_raw(9)]);
        q.cover(2, coords[0], coords[0]);

        assert_eq!(q.spans[&3], right);
        assert_eq!(q.span(1), Some(Span::new(0, 1)));
        assert_eq!(q.span(2), Some(Span::new(1, 4)));
        assert_eq!(q.span(3), Some(Span::new(4, 5)));
        assert_eq!(q.section(2), Some(NodeId::from_raw(9)));
        assert_eq!(q.section_of(NodeId::from_raw(4)), Some(5));
        assert_eq!(bags(&q)[2], vec![2]);
        assert_eq!(q.audit(), Ok(()));
    }

    #[test]
    fn test_reversed_insert_keeps_logical_order() {
        let spans = BTreeMap::from([(1, Span::new(0, 1)), (2, Span::new(1, 2))]);
        let mut q = QNode::new(ids(0..3), spans);
        q.reverse();

        let coords = q.insert_sections(0, ids(20..22));
        q.cover(2, coords[0], coords[1]);

        assert_eq!(q.section(0), Some(NodeId::from_raw(20)));
        assert_eq!(q.section(1), Some(NodeId::from_raw(21)));
        assert_eq!(q.span(2), Some(Span::new(0, 3)));
        assert_eq!(q.span(1), Some(Span::new(3, 4)));
        assert!(q.replace_child(NodeId::from_raw(21), NodeId::from_raw(30)));
        assert_eq!(q.section_of(NodeId::from_raw(30)), Some(1));
        assert_eq!(q.audit(), Ok(()));
    }

    #[test]
    fn test_equality_ignores_storage_layout() {
        let spans = BTreeMap::from([(1, Span::new(0, 1)), (2, Span::new(1, 2))]);
        let original = QNode::new(ids(0..3), spans);

        let mut flipped = original.clone();
        flipped.reverse();
        assert_ne!(flipped, original);
        flipped.reverse();
        assert_eq!(flipped, original);

        // same node grown from its last section towards the front
        let mut grown = QNode::new(ids(2..3), BTreeMap::from([(2, Span::new(0, 0))]));
        let coords = grown.insert_sections(0, ids(0..2));
        grown.cover(2, coords[1], coords[1]);
        grown.cover(1, coords[0], coords[1]);
        assert_eq!(grown, original);
    }
}
