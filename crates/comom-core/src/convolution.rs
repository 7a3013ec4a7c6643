//! Recursive convolution, used as an independent reference for the
//! linear-system solvers.
//!
//! `G(m, N)` is the normalising constant of the network in which station
//! `k` is replicated `m_k` times:
//!
//! ```text
//! G(m, N) = G(m - 1_k, N) + sum_r D_kr * G(m, N - 1_r)    (first k with m_k > 0)
//! G(0, N) = prod_r Z_r^N_r / N_r!
//! G(m, 0) = 1,  G(m, N) = 0 if some N_r < 0
//! ```

use std::collections::HashMap;

use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::debug;

use crate::basis::Indexer;
use crate::combinatorics::factorial;
use crate::error::{ComomError, Result};
use crate::measures::PerformanceMeasures;
use crate::model::QnModel;

/// Memoised convolution over multiplicity and population vectors.
#[derive(Debug)]
pub struct ConvolutionOracle<'a> {
    model: &'a QnModel,
    memo: HashMap<(Vec<u32>, Vec<u32>), BigRational>,
}

impl<'a> ConvolutionOracle<'a> {
    pub fn new(model: &'a QnModel) -> Self {
        Self {
            model,
            memo: HashMap::new(),
        }
    }

    /// `G` at the model's multiplicities and target populations.
    pub fn normalising_constant(&mut self) -> BigRational {
        let m = self.model.multiplicities().to_vec();
        let n: Vec<i64> = self.model.populations().iter().map(|&p| p as i64).collect();
        self.g(&m, &n)
    }

    /// `G(m, N)`; any negative population component gives zero.
    pub fn g(&mut self, multiplicities: &[u32], population: &[i64]) -> BigRational {
        if population.iter().any(|&p| p < 0) {
            return BigRational::zero();
        }
        let mut m = multiplicities.to_vec();
        let mut p: Vec<u32> = population.iter().map(|&v| v as u32).collect();
        self.compute(&mut m, &mut p)
    }

    fn compute(&mut self, m: &mut Vec<u32>, p: &mut Vec<u32>) -> BigRational {
        if p.iter().all(|&v| v == 0) {
            return BigRational::one();
        }
        if let Some(v) = self.memo.get(&(m.clone(), p.clone())) {
            return v.clone();
        }
        let value = match m.iter().position(|&copies| copies > 0) {
            None => self.initial_condition(p),
            Some(k) => {
                m[k] -= 1;
                let mut acc = self.compute(m, p);
                m[k] += 1;
                for r in 0..p.len() {
                    if p[r] == 0 {
                        continue;
                    }
                    let demand = self.model.demand(k, r).clone();
                    if demand.is_zero() {
                        continue;
                    }
                    p[r] -= 1;
                    let g = self.compute(m, p);
                    p[r] += 1;
                    acc += demand * g;
                }
                acc
            }
        };
        self.memo.insert((m.clone(), p.clone()), value.clone());
        value
    }

    fn initial_condition(&self, p: &[u32]) -> BigRational {
        p.iter()
            .enumerate()
            .fold(BigRational::one(), |acc, (r, &pr)| {
                if pr == 0 {
                    return acc;
                }
                let z = num_traits::pow(self.model.think_time(r).clone(), pr as usize);
                acc * z / BigRational::from_integer(factorial(pr))
            })
    }

    /// Every entry of a linear-system state vector at `population`:
    /// entry `(n, queue)` holds `G(m + 1_{queue-1}, population - n)`, the
    /// implicit last component of `n` being zero.
    pub fn state_vector<I: Indexer>(
        &mut self,
        indexer: &I,
        population: &[u32],
    ) -> Result<Vec<BigRational>> {
        if population.len() != self.model.classes() {
            return Err(ComomError::DimensionMismatch {
                expected: self.model.classes(),
                actual: population.len(),
            });
        }
        let mut out = Vec::with_capacity(indexer.size());
        for index in 0..indexer.size() {
            let (n, queue) = indexer.entry_at(index)?;
            let mut m = self.model.multiplicities().to_vec();
            if queue > 0 {
                m[queue - 1] += 1;
            }
            let p: Vec<i64> = population
                .iter()
                .enumerate()
                .map(|(r, &pr)| {
                    let removed = if r < n.len() { n.get(r) } else { 0 };
                    pr as i64 - removed as i64
                })
                .collect();
            out.push(self.g(&m, &p));
        }
        debug!(entries = out.len(), memo = self.memo.len(), "convolution state vector");
        Ok(out)
    }

    /// Throughputs and mean queue lengths at the target population.
    pub fn performance_measures(&mut self) -> Result<PerformanceMeasures> {
        let g = self.normalising_constant();
        if g.is_zero() {
            return Err(ComomError::ZeroNormalisingConstant);
        }
        let classes = self.model.classes();
        let stations = self.model.stations();
        let base_m = self.model.multiplicities().to_vec();
        let target: Vec<i64> = self.model.populations().iter().map(|&p| p as i64).collect();

        let mut throughputs = Vec::with_capacity(classes);
        let mut queue_lengths = vec![Vec::with_capacity(classes); stations];
        for r in 0..classes {
            let mut p = target.clone();
            p[r] -= 1;
            throughputs.push(self.g(&base_m, &p) / &g);
            for (k, row) in queue_lengths.iter_mut().enumerate() {
                let mut m = base_m.clone();
                m[k] += 1;
                let gk = self.g(&m, &p);
                row.push(self.model.demand(k, r) * gk / &g);
            }
        }
        Ok(PerformanceMeasures::new(throughputs, queue_lengths))
    }
}

/// `G` of a single-class, single-station network with think time, by direct
/// summation over the number of jobs `j` queued at the station:
/// `sum_j D^j * Z^(N-j) / (N-j)!`.
pub fn single_class_by_summation(demand: &BigRational, think: &BigRational, n: u32) -> BigRational {
    (0..=n).fold(BigRational::zero(), |acc, j| {
        let queued = num_traits::pow(demand.clone(), j as usize);
        let thinking = num_traits::pow(think.clone(), (n - j) as usize);
        acc + queued * thinking / BigRational::from_integer(factorial(n - j))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::integer as int;
    use num_bigint::BigInt;

    #[test]
    fn test_single_class_fixture() {
        let model = QnModel::from_integers(vec![4], vec![3], vec![vec![2]]).unwrap();
        let mut oracle = ConvolutionOracle::new(&model);
        let expected = BigRational::new(BigInt::from(563), BigInt::from(8));
        assert_eq!(oracle.normalising_constant(), expected);
        assert_eq!(single_class_by_summation(&int(2), &int(3), 4), expected);
    }

    #[test]
    fn test_no_think_time() {
        // two stations, demands 1 and 2, no delay: G(N) = sum_j 1^j 2^(N-j) = 2^(N+1) - 1
        let model = QnModel::from_integers(vec![3], vec![0], vec![vec![1], vec![2]]).unwrap();
        let mut oracle = ConvolutionOracle::new(&model);
        assert_eq!(oracle.normalising_constant(), int(15));
    }

    #[test]
    fn test_negative_population_is_zero() {
        let model = QnModel::from_integers(vec![1, 1], vec![1, 1], vec![vec![1, 1]]).unwrap();
        let mut oracle = ConvolutionOracle::new(&model);
        assert!(oracle.g(&[1], &[0, -1]).is_zero());
        assert_eq!(oracle.g(&[1], &[0, 0]), int(1));
    }

    #[test]
    fn test_replicated_station_matches_two_copies() {
        let replicated = QnModel::from_integers(vec![2, 1], vec![1, 2], vec![vec![1, 3]])
            .unwrap()
            .with_multiplicities(vec![2])
            .unwrap();
        let copies =
            QnModel::from_integers(vec![2, 1], vec![1, 2], vec![vec![1, 3], vec![1, 3]]).unwrap();
        let g1 = ConvolutionOracle::new(&replicated).normalising_constant();
        let g2 = ConvolutionOracle::new(&copies).normalising_constant();
        assert_eq!(g1, g2);
    }

    #[test]
    fn test_measures_satisfy_littles_law() {
        let model =
            QnModel::from_integers(vec![2, 1], vec![1, 2], vec![vec![1, 3], vec![2, 1]]).unwrap();
        let measures = ConvolutionOracle::new(&model).performance_measures().unwrap();
        for r in 0..2 {
            // N_r = X_r * Z_r + sum_k Q_kr
            let mut total = measures.throughput(r) * model.think_time(r);
            for k in 0..2 {
                total += measures.queue_length(k, r);
            }
            assert_eq!(total, int(model.population(r) as i64));
        }
    }
}
