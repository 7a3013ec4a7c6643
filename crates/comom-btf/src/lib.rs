//! Block-triangular-form engine for exact normalising constants
//!
//! This crate assembles the class-oriented method of moments recurrence
//! once, permuted into block triangular form, and re-solves it for every
//! population step of every class:
//! - [`PatternLayout`]: support patterns of the basis and their macro groups
//! - [`BlockArena`], [`BlockKind`]: the leaf blocks holding every coefficient
//! - [`TopLevelBlock`]: quadrants, macro and secondary blocks over the arena
//! - [`ClassView`]: the live and carried part of the master for one class
//! - [`LupDecomposition`]: exact LU factorisation of the diagonal leaves
//! - [`BtfSolver`]: the class-by-class driver
//!
//! # Example
//!
//! ```
//! use comom_btf::BtfSolver;
//! use comom_core::QnModel;
//! use num_rational::BigRational;
//!
//! // one class, one station: D = 2, Z = 3, N = 4
//! let model = QnModel::from_integers(vec![4], vec![3], vec![vec![2]]).unwrap();
//! let mut solver = BtfSolver::new(&model).unwrap();
//! let g = solver.compute_normalising_constant().unwrap();
//! assert_eq!(g, BigRational::new(563.into(), 8.into()));
//! ```

pub mod assembly;
pub mod block;
pub mod error;
pub mod hierarchy;
pub mod lup;
pub mod partition;
pub mod pattern;
pub mod selection;
pub mod solver;
pub mod system;
pub mod view;

// Re-export main types
pub use assembly::{assemble, MasterStructure};
pub use block::{BlockArena, BlockKind, Leaf, LeafId, Span, Weight};
pub use error::{BtfError, Result};
pub use hierarchy::{MacroBlock, Quadrant, SecondaryBlock, TopLevelBlock};
pub use lup::{lup, lup_inplace, LupDecomposition, LupOptions, Pivoting};
pub use partition::BlockPartition;
pub use pattern::{Pattern, PatternLayout};
pub use solver::{solve_model, BtfSolver};
pub use system::BtfLinearSystem;
pub use view::{ClassView, MacroView, SecondaryView, TopLevelView};
