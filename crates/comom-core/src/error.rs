//! Error types for comom-core

use thiserror::Error;

/// Errors raised while building models, bases and state stores
#[derive(Debug, Error)]
pub enum ComomError {
    /// A population-change vector is not part of the canonical enumeration
    #[error("Invalid population-change vector {vector}: not in the basis")]
    InvalidVector { vector: String },

    /// A queue index outside `0..=M`
    #[error("Invalid queue index {queue}: the model has {stations} stations")]
    InvalidQueue { queue: usize, stations: usize },

    /// A flat index outside the state vector
    #[error("Index {index} is out of bounds for a basis of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Inconsistent model parameters
    #[error("Invalid model: {message}")]
    InvalidModel { message: String },

    /// Dimension mismatch between two collaborating objects
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The normalising constant may only be stored once
    #[error("The normalising constant has already been set")]
    ConstantAlreadySet,

    /// Performance measures cannot be derived from G = 0
    #[error("Cannot derive performance measures from a zero normalising constant")]
    ZeroNormalisingConstant,

    /// Every tried demand perturbation of a degenerate model was singular
    #[error("No nonsingular demand perturbation found in {attempts} attempts")]
    DegenerateModel { attempts: usize },

    /// A value needed by a read-only pass is undefined
    #[error("Undefined value at index {index}")]
    UndefinedValue { index: usize },
}

/// Result type for comom-core operations
pub type Result<T> = std::result::Result<T, ComomError>;
