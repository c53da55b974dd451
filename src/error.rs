//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for rehal operations
#[derive(Error, Debug)]
pub enum RehalError {
    /// A queried position lies outside every sequence of a genome
    #[error("position {position} out of range for genome '{genome}'")]
    OutOfRange { genome: String, position: i64 },

    /// A parent/child/paralog index whose reverse-link does not point back
    /// (structural corruption in the segment graph)
    #[error("inconsistent link: {message}")]
    InconsistentLink { message: String },

    /// Advancing a column iterator past its configured range
    #[error("column iterator exhausted")]
    IteratorExhausted,

    /// Invalid data errors (segment tiling violations, bad configuration)
    #[error("invalid data: {message}")]
    InvalidData { message: String },
}

/// Type alias for Results using RehalError
pub type Result<T> = std::result::Result<T, RehalError>;

impl RehalError {
    /// Create an out-of-range error
    pub fn out_of_range(genome: impl Into<String>, position: i64) -> Self {
        Self::OutOfRange {
            genome: genome.into(),
            position,
        }
    }

    /// Create an inconsistent-link error
    pub fn inconsistent_link(message: impl Into<String>) -> Self {
        Self::InconsistentLink {
            message: message.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
