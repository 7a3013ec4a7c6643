//! Exact recovery of degenerate models by demand perturbation.
//!
//! The moment recurrences lose rank when two stations share the demand of
//! a class that is not the last one, or when a class has no demand at any
//! station. Every entry of a solved state is a polynomial of degree at
//! most `sum(N)` in the demands, so the model with demands
//! `D_kr + t * (k + 1)` is solved at `sum(N) + 1` nonsingular points
//! `t = 1, 2, ...` and each entry is interpolated back to `t = 0`.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::{debug, info};

use crate::error::{ComomError, Result};
use crate::model::QnModel;
use crate::store::StateStore;
use crate::value::Value;

/// Demand perturbation of one model and the interpolation that undoes it.
#[derive(Debug, Clone)]
pub struct DemandPerturbation {
    model: QnModel,
    points: usize,
    max_attempts: usize,
}

impl DemandPerturbation {
    pub fn new(model: &QnModel) -> Self {
        let degree: usize = model.populations().iter().map(|&n| n as usize).sum();
        let points = degree + 1;
        Self {
            model: model.clone(),
            points,
            max_attempts: 4 * points + 16,
        }
    }

    /// Number of nonsingular samples needed.
    pub fn points(&self) -> usize {
        self.points
    }

    /// The model with `t * (k + 1)` added to every demand of station `k`.
    pub fn perturbed(&self, t: &BigRational) -> Result<QnModel> {
        let model = &self.model;
        let demands = (0..model.stations())
            .map(|k| {
                let shift = t * BigRational::from_integer(BigInt::from(k + 1));
                (0..model.classes())
                    .map(|r| model.demand(k, r) + &shift)
                    .collect()
            })
            .collect();
        let think_times = (0..model.classes())
            .map(|r| model.think_time(r).clone())
            .collect();
        QnModel::new(model.populations().to_vec(), think_times, demands)?
            .with_multiplicities(model.multiplicities().to_vec())
    }

    /// Solve perturbed models until enough of them are nonsingular, then
    /// interpolate their final stores back to the unperturbed model.
    ///
    /// `solve` returns `Ok(None)` for a perturbed model whose system is
    /// singular; that point is skipped.
    pub fn recover<E, F>(&self, mut solve: F) -> std::result::Result<StateStore, E>
    where
        E: From<ComomError>,
        F: FnMut(&QnModel) -> std::result::Result<Option<StateStore>, E>,
    {
        let mut samples: Vec<(BigRational, StateStore)> = Vec::with_capacity(self.points);
        let mut attempt = 0;
        while samples.len() < self.points {
            if attempt == self.max_attempts {
                return Err(ComomError::DegenerateModel { attempts: attempt }.into());
            }
            attempt += 1;
            let t = BigRational::from_integer(BigInt::from(attempt));
            match solve(&self.perturbed(&t)?)? {
                Some(store) => samples.push((t, store)),
                None => debug!(t = %t, "singular perturbation, trying the next point"),
            }
        }

        let points: Vec<BigRational> = samples.iter().map(|(t, _)| t.clone()).collect();
        let weights = lagrange_weights_at_zero(&points);
        let current: Vec<&[Value]> = samples.iter().map(|(_, s)| s.current_values()).collect();
        let previous: Vec<&[Value]> = samples.iter().map(|(_, s)| s.previous_values()).collect();
        let rhs_len = samples.first().map_or(0, |(_, s)| s.rhs().len());
        let store = StateStore::from_arrays(
            interpolate(&weights, &current)?,
            interpolate(&weights, &previous)?,
            rhs_len,
        )?;
        info!(points = self.points, attempts = attempt, "recovered degenerate model");
        Ok(store)
    }
}

/// `w_i` with `p(0) = sum_i w_i p(t_i)` for every polynomial `p` of degree
/// below `points.len()`. The points must be distinct.
pub fn lagrange_weights_at_zero(points: &[BigRational]) -> Vec<BigRational> {
    points
        .iter()
        .enumerate()
        .map(|(i, ti)| {
            points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(BigRational::one(), |acc, (_, tj)| acc * tj / (tj - ti))
        })
        .collect()
}

/// Entry-wise `sum_i w_i samples[i]`.
pub fn interpolate(weights: &[BigRational], samples: &[&[Value]]) -> Result<Vec<Value>> {
    let len = samples.first().map_or(0, |s| s.len());
    if weights.len() != samples.len() {
        return Err(ComomError::DimensionMismatch {
            expected: weights.len(),
            actual: samples.len(),
        });
    }
    if let Some(bad) = samples.iter().find(|s| s.len() != len) {
        return Err(ComomError::DimensionMismatch {
            expected: len,
            actual: bad.len(),
        });
    }
    Ok((0..len)
        .map(|e| {
            let mut acc = Value::zero();
            for (w, sample) in weights.iter().zip(samples) {
                acc.add_scaled(w, &sample[e]);
            }
            acc
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::integer;

    #[test]
    fn test_weights_recover_polynomial_at_zero() {
        // p(t) = 5 - 2t + 3t^2
        let points: Vec<BigRational> = (1..=3).map(integer).collect();
        let weights = lagrange_weights_at_zero(&points);
        let value = points
            .iter()
            .zip(&weights)
            .fold(BigRational::zero(), |acc, (t, w)| {
                acc + w * (integer(5) - integer(2) * t + integer(3) * t * t)
            });
        assert_eq!(value, integer(5));
    }

    #[test]
    fn test_interpolate_propagates_undefined() {
        let weights = lagrange_weights_at_zero(&[integer(1), integer(2)]);
        let a = [Value::from_integer(3), Value::Undefined];
        let b = [Value::from_integer(5), Value::from_integer(1)];
        let values = interpolate(&weights, &[&a, &b]).unwrap();
        // the line through (1, 3) and (2, 5) meets t = 0 at 1
        assert_eq!(values[0], Value::from_integer(1));
        assert!(values[1].is_undefined());
        assert!(interpolate(&weights, &[&a]).is_err());
    }

    #[test]
    fn test_perturbed_model_separates_stations() {
        let model = QnModel::from_integers(vec![1, 2], vec![1, 0], vec![vec![2, 2], vec![2, 2]])
            .unwrap()
            .with_multiplicities(vec![3, 1])
            .unwrap();
        let perturbation = DemandPerturbation::new(&model);
        assert_eq!(perturbation.points(), 4);
        let shifted = perturbation.perturbed(&integer(2)).unwrap();
        assert_eq!(shifted.demand(0, 1), &integer(4));
        assert_eq!(shifted.demand(1, 1), &integer(6));
        assert_eq!(shifted.multiplicities(), &[3, 1]);
        assert_eq!(shifted.think_time(0), model.think_time(0));
    }

    #[test]
    fn test_recover_interpolates_stores_and_skips_singular_points() {
        let model = QnModel::from_integers(vec![2], vec![1], vec![vec![1]]).unwrap();
        let perturbation = DemandPerturbation::new(&model);
        let mut calls = 0;
        // current entry: the perturbed demand squared; previous: its double
        let store = perturbation
            .recover(|m| {
                calls += 1;
                if calls == 2 {
                    return Ok::<_, ComomError>(None);
                }
                let d = m.demand(0, 0).clone();
                StateStore::from_arrays(
                    vec![Value::from(&d * &d)],
                    vec![Value::from(&d + &d)],
                    0,
                )
                .map(Some)
            })
            .unwrap();
        assert_eq!(calls, 4);
        assert_eq!(store.current(0), &Value::from_integer(1));
        assert_eq!(store.previous(0), &Value::from_integer(2));
    }

    #[test]
    fn test_recover_gives_up() {
        let model = QnModel::from_integers(vec![1], vec![1], vec![vec![1]]).unwrap();
        let result = DemandPerturbation::new(&model).recover(|_| Ok::<_, ComomError>(None));
        assert!(matches!(result, Err(ComomError::DegenerateModel { .. })));
    }
}
