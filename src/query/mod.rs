//! # Query Module
//!
//! The algorithms that walk the segment model: the DNA cursor, the
//! visited-position cache, sliced segment views, and the column iterator
//! that ties them together.
//!
//! Everything here is per-query scratch state over a shared read-only
//! [`Alignment`](crate::data::Alignment); independent iterators may run
//! concurrently without synchronization.

pub mod cache;
pub mod column;
pub mod dna;
pub mod view;

// Re-export commonly used types
pub use cache::PositionCache;
pub use column::{ColumnIterator, ColumnIteratorBuilder, ColumnMap};
pub use dna::{complement, DnaCursor};
pub use view::SegmentView;
