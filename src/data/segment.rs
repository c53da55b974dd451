//! # Alignment Segments
//!
//! The two alignment units of the segment graph:
//!
//! - `TopSegment` faces the genome's parent: it carries an optional index into
//!   the parent's bottom-segment array (NULL = insertion), a strand flag for
//!   that edge, and a circular `next_paralog` index linking duplicates within
//!   the same genome.
//! - `BottomSegment` faces the genome's children: one `ChildLink` per child
//!   genome, each an optional index into that child's top-segment array
//!   (NULL = deletion on that branch) plus a strand flag.
//!
//! All linkage is expressed as plain `u32` indices into fixed arrays; there
//! are no owned cross-references anywhere in the graph.

/// Shared coordinate accessors for the two segment kinds, used by the
/// position-to-segment binary search.
pub trait SegmentRange {
    /// First genome position covered by the segment
    fn start(&self) -> i64;

    /// Number of bases covered (always >= 1 in a valid alignment)
    fn length(&self) -> u64;

    /// Last genome position covered by the segment
    fn last_position(&self) -> i64 {
        self.start() + self.length() as i64 - 1
    }

    /// Whether the segment covers the given genome position
    fn contains(&self, position: i64) -> bool {
        position >= self.start() && position <= self.last_position()
    }
}

/// Alignment unit linking a genome toward its parent
#[derive(Clone, Debug)]
pub struct TopSegment {
    start: i64,
    length: u64,
    parent: Option<u32>,
    parent_reversed: bool,
    next_paralog: u32,
}

impl TopSegment {
    /// Create a segment with no parent linkage (an insertion) and no
    /// duplicates (`next_paralog` pointing at itself).
    pub fn new(index: u32, start: i64, length: u64) -> Self {
        Self {
            start,
            length,
            parent: None,
            parent_reversed: false,
            next_paralog: index,
        }
    }

    /// Create a segment aligned to a parent bottom segment
    pub fn with_parent(index: u32, start: i64, length: u64, parent: u32, reversed: bool) -> Self {
        Self {
            start,
            length,
            parent: Some(parent),
            parent_reversed: reversed,
            next_paralog: index,
        }
    }

    /// Index into the parent's bottom-segment array, or `None` for an
    /// insertion absent from the parent
    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    /// Whether the edge to the parent flips strand
    pub fn parent_reversed(&self) -> bool {
        self.parent_reversed
    }

    /// Index of the next duplicate in this genome's top-segment array.
    /// Equals the segment's own index when it has no duplicates, so the
    /// cycle terminates after one step.
    pub fn next_paralog(&self) -> u32 {
        self.next_paralog
    }

    pub fn set_parent(&mut self, parent: Option<u32>, reversed: bool) {
        self.parent = parent;
        self.parent_reversed = reversed;
    }

    pub fn set_next_paralog(&mut self, next: u32) {
        self.next_paralog = next;
    }
}

impl SegmentRange for TopSegment {
    fn start(&self) -> i64 {
        self.start
    }

    fn length(&self) -> u64 {
        self.length
    }
}

/// Per-child linkage of a bottom segment
#[derive(Clone, Copy, Debug, Default)]
pub struct ChildLink {
    /// Index into the child's top-segment array, or `None` for a deletion
    pub child: Option<u32>,
    /// Whether the edge to the child flips strand
    pub reversed: bool,
}

impl ChildLink {
    pub fn new(child: Option<u32>, reversed: bool) -> Self {
        Self { child, reversed }
    }
}

/// Alignment unit linking a genome toward its children
#[derive(Clone, Debug)]
pub struct BottomSegment {
    start: i64,
    length: u64,
    children: Vec<ChildLink>,
}

impl BottomSegment {
    /// Create a segment with one unlinked slot per child genome
    pub fn new(start: i64, length: u64, n_children: usize) -> Self {
        Self {
            start,
            length,
            children: vec![ChildLink::default(); n_children],
        }
    }

    pub fn n_children(&self) -> usize {
        self.children.len()
    }

    /// Link for a child slot, if the slot exists
    pub fn child_link(&self, slot: usize) -> Option<ChildLink> {
        self.children.get(slot).copied()
    }

    pub fn child_links(&self) -> &[ChildLink] {
        &self.children
    }

    pub fn set_child_link(&mut self, slot: usize, child: Option<u32>, reversed: bool) {
        self.children[slot] = ChildLink::new(child, reversed);
    }
}

impl SegmentRange for BottomSegment {
    fn start(&self) -> i64 {
        self.start
    }

    fn length(&self) -> u64 {
        self.length
    }
}

/// Find the segment containing `position` in a start-ordered, tiling segment
/// array. Returns the segment index and the forward-strand offset within it.
pub fn locate<S: SegmentRange>(segments: &[S], position: i64) -> Option<(usize, u64)> {
    let idx = segments.partition_point(|s| s.last_position() < position);
    let seg = segments.get(idx)?;
    if !seg.contains(position) {
        return None;
    }
    Some((idx, (position - seg.start()) as u64))
}

/// Translate a forward-strand offset across an alignment edge: a reversed
/// edge maps offset `o` in a segment of length `len` to `len - 1 - o`.
pub fn transform_offset(offset: u64, length: u64, reversed: bool) -> u64 {
    if reversed {
        length - 1 - offset
    } else {
        offset
    }
}
