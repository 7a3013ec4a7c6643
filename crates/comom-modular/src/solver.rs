//! Class-by-class driver of the multi-modular backend.

use comom_core::{
    performance_measures, Basis, DemandPerturbation, Indexer, PerformanceMeasures, QnModel,
    ReorderingTable, StandardIndexer, StateStore, VectorOrdering,
};
use num_rational::BigRational;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::crt::CrtBasis;
use crate::dense::{DenseSystem, StepInput};
use crate::error::{ModularError, Result};
use crate::primes::PrimeSource;
use crate::residue::ResidueSolution;

/// Options of the multi-modular backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModularOptions {
    /// Worker threads; 0 uses the rayon default
    pub threads: usize,
    /// Bit length of the prime moduli
    pub prime_bits: u32,
    /// Seed of the prime generator
    pub seed: u64,
}

impl Default for ModularOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            prime_bits: 62,
            seed: 0x00c0_ffee,
        }
    }
}

/// Solves every population step by elimination modulo several primes in
/// parallel, then lifts the result with the Chinese remainder theorem.
pub struct ModularSolver {
    model: QnModel,
    indexer: StandardIndexer,
    store: StateStore,
    primes: PrimeSource,
    pool: ThreadPool,
}

impl std::fmt::Debug for ModularSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModularSolver")
            .field("classes", &self.model.classes())
            .field("stations", &self.model.stations())
            .field("ordering", &self.indexer.basis().ordering())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl ModularSolver {
    pub fn new(model: &QnModel, ordering: VectorOrdering, options: &ModularOptions) -> Result<Self> {
        let indexer = StandardIndexer::new(Basis::for_model(model, ordering)?);
        let store = StateStore::new(indexer.size(), 0);
        let primes = PrimeSource::new(options.prime_bits, options.seed)?;
        let pool = ThreadPoolBuilder::new().num_threads(options.threads).build()?;
        Ok(Self {
            model: model.clone(),
            indexer,
            store,
            primes,
            pool,
        })
    }

    pub fn indexer(&self) -> &StandardIndexer {
        &self.indexer
    }

    /// State arrays after the last solve.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Run every population step and return `G(N)`.
    ///
    /// A step that is singular modulo the primes drawn for it means the
    /// model itself is degenerate; it is then solved through
    /// [`DemandPerturbation`].
    pub fn compute_normalising_constant(&mut self) -> Result<BigRational> {
        let constant_index = self.indexer.index_of(&self.indexer.basis().zero_vector(), 0)?;
        self.store = match run_steps(&self.model, &self.indexer, &mut self.primes, &self.pool) {
            Ok(store) => store,
            Err(ModularError::SingularSystem { prime }) => {
                debug!(prime, "singular step, solving by demand perturbation");
                let (indexer, primes, pool) = (&self.indexer, &mut self.primes, &self.pool);
                DemandPerturbation::new(&self.model).recover(|perturbed| {
                    match run_steps(perturbed, indexer, primes, pool) {
                        Ok(store) => Ok(Some(store)),
                        Err(ModularError::SingularSystem { .. }) => Ok(None),
                        Err(e) => Err(e),
                    }
                })?
            }
            Err(e) => return Err(e),
        };

        let g = self
            .store
            .current(constant_index)
            .as_rational()
            .cloned()
            .ok_or(ModularError::InconsistentSystem {
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

/// Initialise a fresh store and walk every class and population of `model`.
fn run_steps(
    model: &QnModel,
    indexer: &StandardIndexer,
    primes: &mut PrimeSource,
    pool: &ThreadPool,
) -> Result<StateStore> {
    let mut store = StateStore::new(indexer.size(), 0);
    indexer.initialise(&mut store)?;
    let constant_index = indexer.index_of(&indexer.basis().zero_vector(), 0)?;

    for class in 1..=model.classes() {
        let target = model.population(class - 1);
        if target == 0 {
            debug!(class, "no jobs, skipping class");
            continue;
        }
        let table = ReorderingTable::for_class(indexer, class)?;
        for population in 1..=target {
            store.swap();
            step(model, indexer, &table, population, primes, pool, &mut store)?;
            debug!(
                class,
                population,
                g = %store.current(constant_index),
                "population step"
            );
        }
    }
    Ok(store)
}

fn step(
    model: &QnModel,
    indexer: &StandardIndexer,
    table: &ReorderingTable,
    population: u32,
    primes: &mut PrimeSource,
    pool: &ThreadPool,
    store: &mut StateStore,
) -> Result<()> {
    let system = DenseSystem::assemble(&StepInput {
        model,
        indexer,
        table,
        population,
        old: store.previous_values(),
    })?;
    let count = system.prime_count(primes.bits());
    let moduli = primes.take(count).to_vec();
    trace!(
        class = table.class(),
        population,
        order = system.order(),
        primes = count,
        coefficient_bits = system.max_coefficient_bits(),
        "modular step"
    );

    let residues: Vec<ResidueSolution> = pool.install(|| {
        moduli
            .par_iter()
            .map(|&p| system.residue(p).solve())
            .collect::<Result<Vec<_>>>()
    })?;

    let crt = CrtBasis::new(&moduli);
    let det = crt.reconstruct(&residues.iter().map(|r| r.det).collect::<Vec<_>>());
    let solution = (0..system.order())
        .map(|j| {
            let numerators: Vec<u64> = residues.iter().map(|r| r.cramer[j]).collect();
            BigRational::new(crt.reconstruct(&numerators), det.clone())
        })
        .collect();
    store.replace_current(system.to_standard(solution));
    Ok(())
}
