//! Closed multi-class queueing network model

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::{ComomError, Result};

/// A closed, product-form queueing network with `R` classes and `M` stations.
///
/// Classes and stations are addressed 0-based. Demands are indexed
/// `demand(station, class)`. Solvers only read the model, except for
/// [`QnModel::set_normalising_constant`], which may succeed once.
#[derive(Debug, Clone)]
pub struct QnModel {
    populations: Vec<u32>,
    think_times: Vec<BigRational>,
    /// `demands[station][class]`
    demands: Vec<Vec<BigRational>>,
    multiplicities: Vec<u32>,
    normalising_constant: Option<BigRational>,
}

impl QnModel {
    /// Create a model with every station multiplicity equal to one.
    pub fn new(
        populations: Vec<u32>,
        think_times: Vec<BigRational>,
        demands: Vec<Vec<BigRational>>,
    ) -> Result<Self> {
        let stations = demands.len();
        let model = Self {
            populations,
            think_times,
            demands,
            multiplicities: vec![1; stations],
            normalising_constant: None,
        };
        model.validate()?;
        Ok(model)
    }

    /// Convenience constructor for integer think times and demands.
    pub fn from_integers(
        populations: Vec<u32>,
        think_times: Vec<i64>,
        demands: Vec<Vec<i64>>,
    ) -> Result<Self> {
        let int = |v: i64| BigRational::from_integer(BigInt::from(v));
        Self::new(
            populations,
            think_times.into_iter().map(int).collect(),
            demands
                .into_iter()
                .map(|row| row.into_iter().map(int).collect())
                .collect(),
        )
    }

    /// Replace the station multiplicities (number of identical copies of each station).
    pub fn with_multiplicities(mut self, multiplicities: Vec<u32>) -> Result<Self> {
        if multiplicities.len() != self.stations() {
            return Err(ComomError::InvalidModel {
                message: format!(
                    "{} multiplicities given for {} stations",
                    multiplicities.len(),
                    self.stations()
                ),
            });
        }
        self.multiplicities = multiplicities;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let r = self.populations.len();
        if r == 0 {
            return Err(ComomError::InvalidModel {
                message: "a model needs at least one class".to_string(),
            });
        }
        if self.demands.is_empty() {
            return Err(ComomError::InvalidModel {
                message: "a model needs at least one station".to_string(),
            });
        }
        if self.think_times.len() != r {
            return Err(ComomError::InvalidModel {
                message: format!("{} think times given for {} classes", self.think_times.len(), r),
            });
        }
        for (k, row) in self.demands.iter().enumerate() {
            if row.len() != r {
                return Err(ComomError::InvalidModel {
                    message: format!("station {} has {} demands for {} classes", k, row.len(), r),
                });
            }
            if row.iter().any(|d| d.is_negative()) {
                return Err(ComomError::InvalidModel {
                    message: format!("station {} has a negative demand", k),
                });
            }
        }
        if self.think_times.iter().any(|z| z.is_negative()) {
            return Err(ComomError::InvalidModel {
                message: "negative think time".to_string(),
            });
        }
        Ok(())
    }

    /// Number of classes `R`.
    pub fn classes(&self) -> usize {
        self.populations.len()
    }

    /// Number of stations `M`.
    pub fn stations(&self) -> usize {
        self.demands.len()
    }

    /// Target population of class `r`.
    pub fn population(&self, r: usize) -> u32 {
        self.populations[r]
    }

    /// All target populations.
    pub fn populations(&self) -> &[u32] {
        &self.populations
    }

    /// Largest class population.
    pub fn max_population(&self) -> u32 {
        self.populations.iter().copied().max().unwrap_or(0)
    }

    /// Think time (delay) of class `r`.
    pub fn think_time(&self, r: usize) -> &BigRational {
        &self.think_times[r]
    }

    /// Service demand of class `r` at station `k`.
    pub fn demand(&self, k: usize, r: usize) -> &BigRational {
        &self.demands[k][r]
    }

    /// Number of identical copies of station `k`.
    pub fn multiplicity(&self, k: usize) -> u32 {
        self.multiplicities[k]
    }

    /// All station multiplicities.
    pub fn multiplicities(&self) -> &[u32] {
        &self.multiplicities
    }

    /// `m_k * D_kr`, the demand of class `r` summed over the copies of station `k`.
    pub fn replicated_demand(&self, k: usize, r: usize) -> BigRational {
        self.demand(k, r) * BigRational::from_integer(BigInt::from(self.multiplicities[k]))
    }

    /// True if some class has zero think time.
    pub fn has_zero_think_time(&self) -> bool {
        self.think_times.iter().any(|z| z.is_zero())
    }

    /// Store the computed normalising constant. Fails on a second call.
    pub fn set_normalising_constant(&mut self, g: BigRational) -> Result<()> {
        if self.normalising_constant.is_some() {
            return Err(ComomError::ConstantAlreadySet);
        }
        self.normalising_constant = Some(g);
        Ok(())
    }

    /// The normalising constant, once a solver has stored it.
    pub fn normalising_constant(&self) -> Option<&BigRational> {
        self.normalising_constant.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_accessors() {
        let model = QnModel::from_integers(vec![3, 2], vec![1, 0], vec![vec![2, 1], vec![1, 3]])
            .unwrap()
            .with_multiplicities(vec![1, 2])
            .unwrap();
        assert_eq!(model.classes(), 2);
        assert_eq!(model.stations(), 2);
        assert_eq!(model.population(0), 3);
        assert_eq!(model.max_population(), 3);
        assert_eq!(model.demand(1, 1), &BigRational::from_integer(BigInt::from(3)));
        assert_eq!(model.replicated_demand(1, 1), BigRational::from_integer(BigInt::from(6)));
        assert!(model.has_zero_think_time());
    }

    #[test]
    fn test_model_validation() {
        assert!(QnModel::from_integers(vec![], vec![], vec![vec![]]).is_err());
        assert!(QnModel::from_integers(vec![1], vec![1], vec![]).is_err());
        assert!(QnModel::from_integers(vec![1, 1], vec![1], vec![vec![1, 1]]).is_err());
        assert!(QnModel::from_integers(vec![1], vec![1], vec![vec![1, 2]]).is_err());
        assert!(QnModel::from_integers(vec![1], vec![1], vec![vec![-1]]).is_err());
        let model = QnModel::from_integers(vec![1], vec![1], vec![vec![1]]).unwrap();
        assert!(model.with_multiplicities(vec![1, 1]).is_err());
    }

    #[test]
    fn test_normalising_constant_set_once() {
        let mut model = QnModel::from_integers(vec![1], vec![1], vec![vec![1]]).unwrap();
        assert!(model.normalising_constant().is_none());
        model
            .set_normalising_constant(BigRational::from_integer(BigInt::from(2)))
            .unwrap();
        assert!(matches!(
            model.set_normalising_constant(BigRational::zero()),
            Err(ComomError::ConstantAlreadySet)
        ));
        assert_eq!(
            model.normalising_constant(),
            Some(&BigRational::from_integer(BigInt::from(2)))
        );
    }
}
