//! Error types for comom-btf

use comom_core::ComomError;
use thiserror::Error;

/// Errors raised while assembling, factoring or solving the block system
#[derive(Debug, Error)]
pub enum BtfError {
    /// A pivot column without any nonzero candidate
    #[error("Singular system: no nonzero pivot in column {column}")]
    SingularSystem { column: usize },

    /// The normalising constant itself came out undefined
    #[error("Inconsistent system: G is undefined after class {class} reached population {population}")]
    InconsistentSystem { class: usize, population: u32 },

    /// A coefficient, row or block that does not fit the block structure
    #[error("Block structure error: {message}")]
    Structure { message: String },

    /// The basis ordering does not keep supports contiguous and colex-sorted
    #[error("Ordering {ordering} cannot be laid out in block triangular form")]
    UnsupportedOrdering { ordering: String },

    /// Dimension mismatch between a block and the vectors it is applied to
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Error from the shared core types
    #[error(transparent)]
    Core(#[from] ComomError),
}

/// Result type for block system operations
pub type Result<T> = std::result::Result<T, BtfError>;

pub(crate) fn structure(message: impl Into<String>) -> BtfError {
    BtfError::Structure {
        message: message.into(),
    }
}
