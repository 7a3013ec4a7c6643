//! Error types for comom-modular

use comom_core::ComomError;
use thiserror::Error;

/// Errors raised by the multi-modular backend
#[derive(Debug, Error)]
pub enum ModularError {
    /// The system matrix vanished modulo one of the chosen primes
    #[error("Singular system modulo prime {prime}")]
    SingularSystem { prime: u64 },

    /// A value needed to build a step was undefined
    #[error("Inconsistent system: undefined input while class {class} reached population {population}")]
    InconsistentSystem { class: usize, population: u32 },

    /// Invalid backend options
    #[error("Invalid modular options: {message}")]
    InvalidOptions { message: String },

    /// The worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Error from the shared core types
    #[error(transparent)]
    Core(#[from] ComomError),
}

/// Result type for modular backend operations
pub type Result<T> = std::result::Result<T, ModularError>;
