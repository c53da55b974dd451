//! # Sliced Segment Views
//!
//! A read-only, sliceable, reversible window over one segment. The same
//! capability set is shared by top and bottom segments through a tagged
//! variant rather than a trait-object hierarchy.
//!
//! Offsets are strand-relative: `start_offset` trims from the view's begin,
//! `end_offset` from its end. Flipping to the reverse complement swaps the
//! two, so the visible array-coordinate window is invariant under flips.
//! Views never mutate the underlying store.

use crate::data::{Alignment, GenomeIdx, SegmentRange};
use crate::error::{RehalError, Result};

/// Shared coordinate state of a view; opaque outside this module
#[derive(Clone, Copy, Debug)]
pub struct ViewCoords {
    genome: GenomeIdx,
    index: u32,
    start: i64,
    full_length: u64,
    start_offset: u64,
    end_offset: u64,
    reversed: bool,
}

/// Sliced, reversible view over a top or bottom segment
#[derive(Clone, Copy, Debug)]
pub enum SegmentView {
    Top(ViewCoords),
    Bottom(ViewCoords),
}

impl SegmentView {
    /// View over a genome's top segment
    pub fn top(alignment: &Alignment, genome: GenomeIdx, index: u32) -> Result<Self> {
        let g = alignment.genome(genome);
        let seg = g.top_segments().get(index as usize).ok_or_else(|| {
            RehalError::invalid_data(format!(
                "top segment {} does not exist in genome '{}'",
                index,
                g.name()
            ))
        })?;
        Ok(Self::Top(ViewCoords::new(genome, index, seg.start(), seg.length())))
    }

    /// View over a genome's bottom segment
    pub fn bottom(alignment: &Alignment, genome: GenomeIdx, index: u32) -> Result<Self> {
        let g = alignment.genome(genome);
        let seg = g.bottom_segments().get(index as usize).ok_or_else(|| {
            RehalError::invalid_data(format!(
                "bottom segment {} does not exist in genome '{}'",
                index,
                g.name()
            ))
        })?;
        Ok(Self::Bottom(ViewCoords::new(genome, index, seg.start(), seg.length())))
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Self::Top(_))
    }

    fn coords(&self) -> &ViewCoords {
        match self {
            Self::Top(c) | Self::Bottom(c) => c,
        }
    }

    fn coords_mut(&mut self) -> &mut ViewCoords {
        match self {
            Self::Top(c) | Self::Bottom(c) => c,
        }
    }

    pub fn genome(&self) -> GenomeIdx {
        self.coords().genome
    }

    /// Index of the viewed segment in its array
    pub fn index(&self) -> u32 {
        self.coords().index
    }

    pub fn start_offset(&self) -> u64 {
        self.coords().start_offset
    }

    pub fn end_offset(&self) -> u64 {
        self.coords().end_offset
    }

    pub fn reversed(&self) -> bool {
        self.coords().reversed
    }

    /// Visible length after trimming
    pub fn length(&self) -> u64 {
        let c = self.coords();
        c.full_length - c.start_offset - c.end_offset
    }

    /// Trim the view to `[start_offset, length - end_offset)` of the segment
    pub fn slice(&mut self, start_offset: u64, end_offset: u64) -> Result<()> {
        let c = self.coords_mut();
        if start_offset + end_offset >= c.full_length {
            return Err(RehalError::invalid_data(format!(
                "slice offsets {}+{} leave no bases of a length-{} segment",
                start_offset, end_offset, c.full_length
            )));
        }
        c.start_offset = start_offset;
        c.end_offset = end_offset;
        Ok(())
    }

    /// Flip to the reverse-complement view; the visible window is unchanged
    pub fn to_reverse(&mut self) {
        let c = self.coords_mut();
        std::mem::swap(&mut c.start_offset, &mut c.end_offset);
        c.reversed = !c.reversed;
    }

    /// Absolute position of the view-relative offset `o` (strand-relative)
    pub fn position_at(&self, offset: u64) -> i64 {
        let c = self.coords();
        if c.reversed {
            self.window().1 - offset as i64
        } else {
            self.window().0 + offset as i64
        }
    }

    /// First visible position in view orientation
    pub fn first_position(&self) -> i64 {
        self.position_at(0)
    }

    /// Last visible position in view orientation
    pub fn last_position(&self) -> i64 {
        self.position_at(self.length() - 1)
    }

    /// Whether the entire visible window lies left of a genome position
    pub fn left_of(&self, position: i64) -> bool {
        self.window().1 < position
    }

    /// Whether the entire visible window lies right of a genome position
    pub fn right_of(&self, position: i64) -> bool {
        self.window().0 > position
    }

    /// Visible window in array coordinates, `(low, high)` inclusive
    fn window(&self) -> (i64, i64) {
        let c = self.coords();
        let (lead, trail) = if c.reversed {
            (c.end_offset, c.start_offset)
        } else {
            (c.start_offset, c.end_offset)
        };
        (
            c.start + lead as i64,
            c.start + (c.full_length - 1 - trail) as i64,
        )
    }
}

impl ViewCoords {
    fn new(genome: GenomeIdx, index: u32, start: i64, full_length: u64) -> Self {
        Self {
            genome,
            index,
            start,
            full_length,
            start_offset: 0,
            end_offset: 0,
            reversed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BottomSegment, TopSegment};
    use crate::query::dna::DnaCursor;

    fn alignment_with_segments() -> (Alignment, GenomeIdx) {
        let mut aln = Alignment::new();
        let g = aln.add_root_genome("g").unwrap();
        let genome = aln.genome_mut(g);
        genome.add_sequence("seq", 10);
        genome.set_dna(b"ACGTACGTAC".to_vec()).unwrap();
        genome.push_top(TopSegment::new(0, 0, 10));
        genome.push_bottom(BottomSegment::new(0, 10, 0));
        (aln, g)
    }

    #[test]
    fn test_forward_positions() {
        let (aln, g) = alignment_with_segments();
        let view = SegmentView::top(&aln, g, 0).unwrap();
        assert_eq!(view.length(), 10);
        assert_eq!(view.first_position(), 0);
        assert_eq!(view.last_position(), 9);
        assert_eq!(view.position_at(3), 3);
    }

    #[test]
    fn test_slice_trims_window() {
        let (aln, g) = alignment_with_segments();
        let mut view = SegmentView::top(&aln, g, 0).unwrap();
        view.slice(2, 3).unwrap();
        assert_eq!(view.length(), 5);
        assert_eq!(view.first_position(), 2);
        assert_eq!(view.last_position(), 6);
        assert!(view.left_of(7));
        assert!(view.right_of(1));
        assert!(!view.left_of(6));
    }

    #[test]
    fn test_reverse_keeps_window() {
        let (aln, g) = alignment_with_segments();
        let mut view = SegmentView::top(&aln, g, 0).unwrap();
        view.slice(2, 3).unwrap();
        view.to_reverse();
        assert!(view.reversed());
        assert_eq!(view.length(), 5);
        // same array window, walked from the other side
        assert_eq!(view.first_position(), 6);
        assert_eq!(view.last_position(), 2);
        view.to_reverse();
        assert_eq!(view.first_position(), 2);
        assert_eq!(view.start_offset(), 2);
        assert_eq!(view.end_offset(), 3);
    }

    #[test]
    fn test_slice_rejects_empty_window() {
        let (aln, g) = alignment_with_segments();
        let mut view = SegmentView::top(&aln, g, 0).unwrap();
        assert!(view.slice(5, 5).is_err());
    }

    #[test]
    fn test_bottom_view_and_cursor_construction() {
        let (aln, g) = alignment_with_segments();
        let mut view = SegmentView::bottom(&aln, g, 0).unwrap();
        assert!(!view.is_top());
        view.to_reverse();
        let cursor = DnaCursor::from_view(&view, 0);
        assert_eq!(cursor.position(), 9);
        assert!(cursor.reversed());
        // base 9 is 'C', complemented to 'G'
        assert_eq!(cursor.base(&aln).unwrap(), b'G');
    }
}
