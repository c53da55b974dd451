//! # DNA Accessor
//!
//! `DnaCursor` is a lightweight cursor bound to one absolute position in one
//! genome. It reads the base at that position, complementing when the cursor
//! is flagged reversed, and steps left/right in strand-relative direction.
//! Cursors never mutate the store.
//!
//! Two cursors compare equal iff they reference the same genome and absolute
//! position; strand is deliberately excluded so that the same locus reached
//! through different edge paths deduplicates.

use crate::data::{Alignment, GenomeIdx, SequenceId};
use crate::error::{RehalError, Result};
use crate::query::view::SegmentView;

/// Complement a base, preserving case; non-ACGT bytes pass through
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        other => other,
    }
}

/// Positional cursor into one genome's base sequence
#[derive(Clone, Copy, Debug)]
pub struct DnaCursor {
    genome: GenomeIdx,
    position: i64,
    reversed: bool,
}

impl DnaCursor {
    pub fn new(genome: GenomeIdx, position: i64) -> Self {
        Self {
            genome,
            position,
            reversed: false,
        }
    }

    pub fn with_strand(genome: GenomeIdx, position: i64, reversed: bool) -> Self {
        Self {
            genome,
            position,
            reversed,
        }
    }

    /// Construct from a segment view and a view-relative offset
    pub fn from_view(view: &SegmentView, offset: u64) -> Self {
        Self {
            genome: view.genome(),
            position: view.position_at(offset),
            reversed: view.reversed(),
        }
    }

    pub fn genome(&self) -> GenomeIdx {
        self.genome
    }

    /// Absolute position in the genome's coordinate space
    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn reversed(&self) -> bool {
        self.reversed
    }

    /// Same cursor flipped to the reverse-complement view
    pub fn to_reverse(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Base under the cursor, complemented when reversed
    pub fn base(&self, alignment: &Alignment) -> Result<u8> {
        let genome = alignment.genome(self.genome);
        let raw = genome
            .base(self.position)
            .ok_or_else(|| RehalError::out_of_range(genome.name(), self.position))?;
        Ok(if self.reversed { complement(raw) } else { raw })
    }

    /// Id of the sequence containing the cursor position
    pub fn sequence(&self, alignment: &Alignment) -> Result<SequenceId> {
        let genome = alignment.genome(self.genome);
        let seq = genome
            .sequence_at(self.position)
            .ok_or_else(|| RehalError::out_of_range(genome.name(), self.position))?;
        Ok(SequenceId::new(self.genome, seq as u32))
    }

    /// Step one base rightward in strand-relative direction
    pub fn to_right(&mut self) {
        self.position += if self.reversed { -1 } else { 1 };
    }

    /// Step one base leftward in strand-relative direction
    pub fn to_left(&mut self) {
        self.position += if self.reversed { 1 } else { -1 };
    }

    /// Read `n` bases starting at the cursor, stepping rightward; stops at
    /// the genome boundary
    pub fn read(&self, alignment: &Alignment, n: usize) -> Result<String> {
        let mut cursor = *self;
        let mut out = String::with_capacity(n);
        for _ in 0..n {
            match cursor.base(alignment) {
                Ok(b) => out.push(b as char),
                Err(RehalError::OutOfRange { .. }) => break,
                Err(e) => return Err(e),
            }
            cursor.to_right();
        }
        Ok(out)
    }
}

impl PartialEq for DnaCursor {
    fn eq(&self, other: &Self) -> bool {
        self.genome == other.genome && self.position == other.position
    }
}

impl Eq for DnaCursor {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Alignment;

    fn one_genome() -> (Alignment, GenomeIdx) {
        let mut aln = Alignment::new();
        let g = aln.add_root_genome("g").unwrap();
        let genome = aln.genome_mut(g);
        genome.add_sequence("seq", 8);
        genome.set_dna(b"ACGTacgt".to_vec()).unwrap();
        (aln, g)
    }

    #[test]
    fn test_forward_read() {
        let (aln, g) = one_genome();
        let cursor = DnaCursor::new(g, 0);
        assert_eq!(cursor.base(&aln).unwrap(), b'A');
        assert_eq!(cursor.read(&aln, 8).unwrap(), "ACGTacgt");
    }

    #[test]
    fn test_reverse_complement_read() {
        let (aln, g) = one_genome();
        let cursor = DnaCursor::new(g, 7).to_reverse();
        assert_eq!(cursor.base(&aln).unwrap(), b'a');
        // walks leftward in array coords, complementing case-preserved
        assert_eq!(cursor.read(&aln, 8).unwrap(), "acgtACGT");
    }

    #[test]
    fn test_read_stops_at_boundary() {
        let (aln, g) = one_genome();
        let cursor = DnaCursor::new(g, 6);
        assert_eq!(cursor.read(&aln, 10).unwrap(), "gt");
    }

    #[test]
    fn test_out_of_range() {
        let (aln, g) = one_genome();
        let cursor = DnaCursor::new(g, 8);
        assert!(matches!(
            cursor.base(&aln),
            Err(RehalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_equality_ignores_strand() {
        let (_aln, g) = one_genome();
        let fwd = DnaCursor::new(g, 3);
        let rev = DnaCursor::with_strand(g, 3, true);
        assert_eq!(fwd, rev);
        assert_ne!(fwd, DnaCursor::new(g, 4));
    }
}
