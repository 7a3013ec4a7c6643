//! Class-by-class orchestration of the block-triangular solve.

use comom_core::{
    performance_measures, Basis, BtfIndexer, DemandPerturbation, Indexer, PerformanceMeasures,
    QnModel, StateStore, VectorOrdering,
};
use num_rational::BigRational;
use tracing::{debug, info};

use crate::error::{BtfError, Result};
use crate::lup::LupOptions;
use crate::system::BtfLinearSystem;

/// Computes the normalising constant of one model.
///
/// Building the solver assembles and factors the block structure once;
/// [`BtfSolver::compute_normalising_constant`] then walks the classes
/// `1..=R` and, for each, the populations `1..=N_c`, swapping the state
/// arrays between steps.
///
/// When a diagonal leaf of the model's own master is singular (stations
/// sharing a demand), the solve goes through [`DemandPerturbation`]
/// instead, rebuilding the master for each perturbed model.
#[derive(Debug, Clone)]
pub struct BtfSolver {
    model: QnModel,
    options: LupOptions,
    indexer: BtfIndexer,
    /// `None` for a model whose master has a singular diagonal leaf
    system: Option<BtfLinearSystem>,
    store: StateStore,
    constant_index: usize,
}

impl BtfSolver {
    pub fn new(model: &QnModel) -> Result<Self> {
        Self::with_options(model, &LupOptions::default())
    }

    pub fn with_options(model: &QnModel, options: &LupOptions) -> Result<Self> {
        let indexer = BtfIndexer::new(Basis::for_model(model, VectorOrdering::SupportColex)?);
        let system = match BtfLinearSystem::build(model, options) {
            Ok(system) => Some(system),
            Err(BtfError::SingularSystem { column }) => {
                debug!(column, "singular master, solving by demand perturbation");
                None
            }
            Err(e) => return Err(e),
        };
        let store = StateStore::new(indexer.size(), indexer.x_size());
        let constant_index = indexer.index_of(&indexer.basis().zero_vector(), 0)?;
        Ok(Self {
            model: model.clone(),
            options: options.clone(),
            indexer,
            system,
            store,
            constant_index,
        })
    }

    /// The factored master, unless the model needs demand perturbation.
    pub fn system(&self) -> Option<&BtfLinearSystem> {
        self.system.as_ref()
    }

    /// True when the model's own master could not be factored.
    pub fn is_degenerate(&self) -> bool {
        self.system.is_none()
    }

    /// State arrays after the last solve.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run every population step and return `G(N)`.
    pub fn compute_normalising_constant(&mut self) -> Result<BigRational> {
        match &self.system {
            Some(system) => run_steps(system, &mut self.store)?,
            None => {
                let options = &self.options;
                self.store = DemandPerturbation::new(&self.model).recover(|perturbed| {
                    match BtfLinearSystem::build(perturbed, options) {
                        Ok(system) => {
                            let mut store = system.new_store();
                            run_steps(&system, &mut store)?;
                            Ok(Some(store))
                        }
                        Err(BtfError::SingularSystem { .. }) => Ok(None),
                        Err(e) => Err(e),
                    }
                })?;
            }
        }

        let g = self
            .store
            .current(self.constant_index)
            .as_rational()
            .cloned()
            .ok_or(BtfError::InconsistentSystem {
                class: self.model.classes(),
                population: self.model.population(self.model.classes() - 1),
            })?;
        info!(g = %g, "normalising constant");
        Ok(g)
    }

    /// Throughputs and queue lengths from the state of the last solve.
    pub fn performance_measures(&self) -> Result<PerformanceMeasures> {
        Ok(performance_measures(&self.model, &self.indexer, &self.store)?)
    }
}

/// Initialise `store` and walk every class and population of `system`.
fn run_steps(system: &BtfLinearSystem, store: &mut StateStore) -> Result<()> {
    let model = system.model();
    system.indexer().initialise(store)?;

    for class in 1..=model.classes() {
        let target = model.population(class - 1);
        if target == 0 {
            debug!(class, "no jobs, skipping class");
            continue;
        }
        let view = system.view(class);
        for population in 1..=target {
            store.swap();
            system.solve(&view, population, store)?;
            debug!(
                class,
                population,
                g = %store.current(system.constant_index()),
                "population step"
            );
        }
    }
    Ok(())
}

/// Solve `model` and store its normalising constant on it.
pub fn solve_model(model: &mut QnModel) -> Result<BigRational> {
    let g = BtfSolver::new(model)?.compute_normalising_constant()?;
    model.set_normalising_constant(g.clone())?;
    Ok(g)
}
