//! # Rehal Library Root
//!
//! ## Role
//! Storage and column queries over hierarchical multiple-genome alignments:
//! a phylogenetic tree of genomes, each decomposed into ordered alignment
//! segments cross-linked to parent and child genomes. The central query is,
//! for one reference base, "what base does every other genome (and every
//! duplicate copy) align to here", answered by a graph traversal with
//! strand-sensitive coordinate transforms, cycle detection, and
//! multi-branch fan-out.
//!
//! ## Module Structure
//! ```text
//! rehal
//! ├── data    # Segment model (genomes, sequences, top/bottom segments)
//! ├── query   # Column iterator, DNA cursor, position cache, segment views
//! └── error   # Unified error type
//! ```

pub mod data;
pub mod error;
pub mod query;

pub use data::{Alignment, BottomSegment, Genome, GenomeIdx, Sequence, SequenceId, TopSegment};
pub use error::{RehalError, Result};
pub use query::{ColumnIterator, ColumnIteratorBuilder, ColumnMap, DnaCursor, PositionCache};
