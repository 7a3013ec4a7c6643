//! Exact normalising constants of closed multi-class queueing networks
//!
//! Single entry point over both engines:
//! - [`comom_btf`]: the block-triangular engine, assembled once per model
//! - [`comom_modular`]: a dense per-step system solved over several primes
//!
//! Both return the same exact rational `G(N)`; pick one with
//! [`SolverConfig`].
//!
//! # Example
//!
//! ```
//! use comom::{solve, Backend, SolverConfig};
//! use comom_core::QnModel;
//! use num_rational::BigRational;
//!
//! let model = QnModel::from_integers(vec![4], vec![3], vec![vec![2]]).unwrap();
//! let config = SolverConfig::from_toml_str("backend = \"modular\"").unwrap();
//! assert_eq!(config.backend, Backend::Modular);
//! let solution = solve(&model, &config).unwrap();
//! assert_eq!(solution.normalising_constant, BigRational::new(563.into(), 8.into()));
//! ```

pub mod config;

use anyhow::{ensure, Context, Result};
use comom_btf::BtfSolver;
use comom_core::{PerformanceMeasures, QnModel, VectorOrdering};
use comom_modular::ModularSolver;
use num_rational::BigRational;
use tracing::info;

pub use config::{Backend, SolverConfig};

/// Normalising constant and the measures derived from the final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub normalising_constant: BigRational,
    pub measures: PerformanceMeasures,
}

/// Solve `model` with the configured backend.
pub fn solve(model: &QnModel, config: &SolverConfig) -> Result<Solution> {
    info!(
        backend = ?config.backend,
        ordering = ?config.ordering,
        classes = model.classes(),
        stations = model.stations(),
        "solving model"
    );
    match config.backend {
        Backend::Btf => {
            ensure!(
                config.ordering == VectorOrdering::SupportColex,
                "the block-triangular backend needs support_colex ordering, got {:?}",
                config.ordering
            );
            let mut solver = BtfSolver::with_options(model, &config.lup)
                .context("failed to assemble block-triangular system")?;
            let normalising_constant = solver
                .compute_normalising_constant()
                .context("block-triangular solve failed")?;
            let measures = solver
                .performance_measures()
                .context("failed to derive performance measures")?;
            Ok(Solution {
                normalising_constant,
                measures,
            })
        }
        Backend::Modular => {
            let mut solver = ModularSolver::new(model, config.ordering, &config.modular)
                .context("failed to set up modular solver")?;
            let normalising_constant = solver
                .compute_normalising_constant()
                .context("modular solve failed")?;
            let measures = solver
                .performance_measures()
                .context("failed to derive performance measures")?;
            Ok(Solution {
                normalising_constant,
                measures,
            })
        }
    }
}

/// Solve `model` and record its normalising constant on it.
pub fn solve_and_store(model: &mut QnModel, config: &SolverConfig) -> Result<Solution> {
    let solution = solve(model, config)?;
    model
        .set_normalising_constant(solution.normalising_constant.clone())
        .context("model already carries a normalising constant")?;
    Ok(solution)
}
