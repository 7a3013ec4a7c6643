//! Throughput and mean queue length from a solved state vector

use num_rational::BigRational;
use num_traits::Zero;

use crate::basis::Indexer;
use crate::error::{ComomError, Result};
use crate::model::QnModel;
use crate::store::StateStore;
use crate::value::Value;
use crate::vector::PopulationChangeVector;

/// Exact per-class throughputs and per-(station, class) mean queue lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceMeasures {
    throughputs: Vec<BigRational>,
    /// `queue_lengths[station][class]`
    queue_lengths: Vec<Vec<BigRational>>,
}

impl PerformanceMeasures {
    pub fn new(throughputs: Vec<BigRational>, queue_lengths: Vec<Vec<BigRational>>) -> Self {
        Self {
            throughputs,
            queue_lengths,
        }
    }

    /// Throughput `X_r`.
    pub fn throughput(&self, r: usize) -> &BigRational {
        &self.throughputs[r]
    }

    pub fn throughputs(&self) -> &[BigRational] {
        &self.throughputs
    }

    /// Mean number of class-`r` jobs at station `k` (all copies together).
    pub fn queue_length(&self, k: usize, r: usize) -> &BigRational {
        &self.queue_lengths[k][r]
    }

    /// Utilisation of one copy of station `k` by class `r`, `D_kr * X_r`.
    pub fn utilisation(&self, model: &QnModel, k: usize, r: usize) -> BigRational {
        model.demand(k, r) * &self.throughputs[r]
    }
}

/// Derive the measures from the final state of a class-by-class solve.
///
/// `store.current` must hold the state at the target population and, when
/// the last class has jobs, `store.previous` the state one job of the last
/// class earlier.
pub fn performance_measures<I: Indexer>(
    model: &QnModel,
    indexer: &I,
    store: &StateStore,
) -> Result<PerformanceMeasures> {
    let basis = indexer.basis();
    let classes = model.classes();
    let stations = model.stations();
    let zero = basis.zero_vector();

    let g = defined(store.current_values(), indexer.index_of(&zero, 0)?)?;
    if g.is_zero() {
        return Err(ComomError::ZeroNormalisingConstant);
    }

    let mut throughputs = Vec::with_capacity(classes);
    let mut queue_lengths = vec![Vec::with_capacity(classes); stations];
    for r in 0..classes {
        let last = r + 1 == classes;
        if last && model.population(r) == 0 {
            throughputs.push(BigRational::zero());
            for row in queue_lengths.iter_mut() {
                row.push(BigRational::zero());
            }
            continue;
        }
        // one job of class r removed: 1_r for the explicit classes, the
        // previous population step for the last one
        let (values, n) = if last {
            (store.previous_values(), zero.clone())
        } else {
            (
                store.current_values(),
                PopulationChangeVector::unit(basis.components(), r),
            )
        };
        throughputs.push(defined(values, indexer.index_of(&n, 0)?)? / &g);
        for (k, row) in queue_lengths.iter_mut().enumerate() {
            let gk = defined(values, indexer.index_of(&n, k + 1)?)?;
            row.push(model.demand(k, r) * gk / &g);
        }
    }
    Ok(PerformanceMeasures::new(throughputs, queue_lengths))
}

fn defined(values: &[Value], index: usize) -> Result<BigRational> {
    values[index]
        .as_rational()
        .cloned()
        .ok_or(ComomError::UndefinedValue { index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{Basis, StandardIndexer};
    use crate::ordering::VectorOrdering;
    use crate::value::integer;

    #[test]
    fn test_measures_from_hand_built_state() {
        // R = 1, M = 1, D = 2, Z = 3: G(1) = 5, G+(1) = 7, G(0) = G+(0) = 1
        let model = QnModel::from_integers(vec![1], vec![3], vec![vec![2]]).unwrap();
        let indexer =
            StandardIndexer::new(Basis::for_model(&model, VectorOrdering::SupportColex).unwrap());
        let mut store = StateStore::new(indexer.size(), 0);
        indexer.initialise(&mut store).unwrap();
        store.swap();
        store.set_current(0, Value::from_integer(5));
        store.set_current(1, Value::from_integer(7));

        let measures = performance_measures(&model, &indexer, &store).unwrap();
        assert_eq!(measures.throughput(0), &BigRational::new(1.into(), 5.into()));
        assert_eq!(measures.queue_length(0, 0), &BigRational::new(2.into(), 5.into()));
        assert_eq!(
            measures.utilisation(&model, 0, 0),
            BigRational::new(2.into(), 5.into())
        );
        // Little: N = X Z + Q
        assert_eq!(
            measures.throughput(0) * integer(3) + measures.queue_length(0, 0),
            integer(1)
        );
    }

    #[test]
    fn test_zero_constant_is_rejected() {
        let model = QnModel::from_integers(vec![1], vec![3], vec![vec![2]]).unwrap();
        let indexer =
            StandardIndexer::new(Basis::for_model(&model, VectorOrdering::SupportColex).unwrap());
        let store = StateStore::new(indexer.size(), 0);
        assert!(matches!(
            performance_measures(&model, &indexer, &store),
            Err(ComomError::ZeroNormalisingConstant)
        ));
    }
}
