//! Core types for exact normalising-constant solvers of closed queueing networks
//!
//! This crate provides the pieces shared by every solver backend:
//! - [`Value`]: exact rationals with an absorbing undefined state
//! - [`QnModel`]: the closed multi-class network being solved
//! - [`Basis`], [`StandardIndexer`], [`BtfIndexer`]: canonical enumeration of
//!   population-change vectors and the flat state layouts built on it
//! - [`StateStore`]: the current/previous state arrays of a solve pass
//! - [`ConvolutionOracle`]: recursive convolution used as a reference
//! - [`performance_measures`]: throughputs and queue lengths from a solved state
//! - [`DemandPerturbation`]: exact recovery of models whose recurrences are singular
//!
//! # Example
//!
//! ```
//! use comom_core::{Basis, BtfIndexer, Indexer, PopulationChangeVector, VectorOrdering};
//!
//! let basis = Basis::generate(3, 2, VectorOrdering::SupportColex).unwrap();
//! let indexer = BtfIndexer::new(basis);
//!
//! // queue 0 entries live after all queue >= 1 entries
//! let zero = PopulationChangeVector::zeros(2);
//! assert_eq!(indexer.index_of(&zero, 0).unwrap(), indexer.x_size());
//! assert_eq!(indexer.size(), 18);
//! ```

pub mod basis;
pub mod combinatorics;
pub mod convolution;
pub mod error;
pub mod matrix;
pub mod measures;
pub mod model;
pub mod ordering;
pub mod perturbation;
pub mod reordering;
pub mod store;
pub mod value;
pub mod vector;

// Re-export main types
pub use basis::{state_size, Basis, BtfIndexer, Indexer, StandardIndexer};
pub use combinatorics::{binomial, vector_count};
pub use convolution::ConvolutionOracle;
pub use error::{ComomError, Result};
pub use matrix::Matrix;
pub use measures::{performance_measures, PerformanceMeasures};
pub use model::QnModel;
pub use ordering::VectorOrdering;
pub use perturbation::DemandPerturbation;
pub use reordering::ReorderingTable;
pub use store::StateStore;
pub use value::Value;
pub use vector::PopulationChangeVector;
