//! # Data Module
//!
//! In-memory representation of a hierarchical alignment. This is the core
//! "Segment Model" layer.
//!
//! ## Design Philosophy
//! - **Arena + index:** every cross-reference (parent genome, child genome,
//!   linked segment, next paralog) is an integer index into a fixed array,
//!   never an owned or raw pointer. A paralogy cycle is just an index that
//!   may equal its own position.
//! - **Zero-cost newtypes:** `GenomeIdx` and `SequenceId` prevent index bugs
//!   at compile time with no runtime overhead.
//! - **Read-only queries:** the model is built once, then only read; the
//!   query layer holds shared borrows and owns no alignment data.

pub mod genome;
pub mod segment;
pub mod sequence;

// Re-export commonly used types
pub use genome::{Alignment, Genome};
pub use segment::{BottomSegment, ChildLink, SegmentRange, TopSegment};
pub use sequence::{Sequence, SequenceId};

/// Genome identifier (index into the alignment's genome arena)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomeIdx(pub u32);

impl GenomeIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for GenomeIdx {
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl From<GenomeIdx> for usize {
    fn from(idx: GenomeIdx) -> usize {
        idx.0 as usize
    }
}
