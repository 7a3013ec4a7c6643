//! Multi-modular backend for exact normalising constants
//!
//! Every population step is assembled as one dense integer system over the
//! standard state layout (any vector ordering), solved modulo enough
//! random word-sized primes to cover its Hadamard bound, and lifted back
//! to exact rationals:
//! - [`primes`]: Miller-Rabin and the seeded prime supply
//! - [`residue`]: Gaussian elimination with determinant modulo one prime
//! - [`crt`]: reconstruction to symmetric residues
//! - [`dense`]: the per-step system
//! - [`ModularSolver`]: the class-by-class driver, one rayon pool per solver
//!
//! # Example
//!
//! ```
//! use comom_core::{QnModel, VectorOrdering};
//! use comom_modular::{ModularOptions, ModularSolver};
//! use num_rational::BigRational;
//!
//! let model = QnModel::from_integers(vec![4], vec![3], vec![vec![2]]).unwrap();
//! let mut solver =
//!     ModularSolver::new(&model, VectorOrdering::LeftmostNonzero, &ModularOptions::default())
//!         .unwrap();
//! let g = solver.compute_normalising_constant().unwrap();
//! assert_eq!(g, BigRational::new(563.into(), 8.into()));
//! ```

pub mod crt;
pub mod dense;
pub mod error;
pub mod primes;
pub mod residue;
pub mod solver;

// Re-export main types
pub use crt::CrtBasis;
pub use dense::{DenseSystem, StepInput};
pub use error::{ModularError, Result};
pub use primes::{is_prime, PrimeSource};
pub use residue::{ResidueSolution, ResidueSystem};
pub use solver::{ModularOptions, ModularSolver};
