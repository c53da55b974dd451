//! # Sequence Definitions
//!
//! A `Sequence` is a named contiguous coordinate range within one genome's
//! global coordinate space (e.g., a chromosome). Sequences are immutable once
//! created and are owned by their `Genome`.

use crate::data::GenomeIdx;

/// A named contiguous range `[start, start + length)` in genome coordinates
#[derive(Clone, Debug)]
pub struct Sequence {
    name: String,
    start: i64,
    length: u64,
}

impl Sequence {
    pub fn new(name: impl Into<String>, start: i64, length: u64) -> Self {
        Self {
            name: name.into(),
            start,
            length,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First genome position of the sequence
    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Inclusive `(start, end)` bounds in genome coordinates
    pub fn bounds(&self) -> (i64, i64) {
        (self.start, self.start + self.length as i64 - 1)
    }

    /// Whether the sequence contains the given genome position
    pub fn contains(&self, position: i64) -> bool {
        position >= self.start && position < self.start + self.length as i64
    }
}

/// Globally unique sequence handle: arena index of the owning genome plus the
/// ordinal of the sequence within it. Orderable, so it can key the column map
/// with a deterministic iteration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId {
    genome: GenomeIdx,
    seq: u32,
}

impl SequenceId {
    pub fn new(genome: GenomeIdx, seq: u32) -> Self {
        Self { genome, seq }
    }

    pub fn genome(self) -> GenomeIdx {
        self.genome
    }

    /// Ordinal of the sequence within its genome
    pub fn seq(self) -> u32 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_contains() {
        let seq = Sequence::new("chr1", 10, 5);
        assert_eq!(seq.bounds(), (10, 14));
        assert!(seq.contains(10));
        assert!(seq.contains(14));
        assert!(!seq.contains(9));
        assert!(!seq.contains(15));
    }

    #[test]
    fn test_sequence_id_ordering() {
        let a = SequenceId::new(GenomeIdx::new(0), 1);
        let b = SequenceId::new(GenomeIdx::new(1), 0);
        assert!(a < b);
    }
}
