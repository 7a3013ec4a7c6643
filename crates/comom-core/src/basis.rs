//! Canonical enumeration of population-change vectors and flat state indexing.
//!
//! A [`Basis`] lists every vector with `R - 1` components and sum at most
//! `M` in the order given by a [`VectorOrdering`]. An [`Indexer`] maps a
//! `(vector, queue)` pair, queue `0` meaning "no added station" and queue
//! `k >= 1` meaning "one extra copy of station `k - 1`", to a position in
//! the flat state arrays.

use std::collections::HashMap;

use num_traits::{One, Zero};

use crate::combinatorics::vector_count;
use crate::error::{ComomError, Result};
use crate::model::QnModel;
use crate::ordering::VectorOrdering;
use crate::store::StateStore;
use crate::value::Value;
use crate::vector::{enumerate_vectors, PopulationChangeVector};

/// Every population-change vector of a model, in canonical order.
#[derive(Debug, Clone)]
pub struct Basis {
    classes: usize,
    stations: usize,
    ordering: VectorOrdering,
    vectors: Vec<PopulationChangeVector>,
    positions: HashMap<PopulationChangeVector, usize>,
}

impl Basis {
    /// Enumerate the vectors of an `R`-class, `M`-station network.
    pub fn generate(classes: usize, stations: usize, ordering: VectorOrdering) -> Result<Self> {
        if classes == 0 || stations == 0 {
            return Err(ComomError::InvalidModel {
                message: format!(
                    "a basis needs at least one class and one station, got R = {}, M = {}",
                    classes, stations
                ),
            });
        }
        let mut vectors = enumerate_vectors(classes - 1, stations as u32);
        vectors.sort_by(|a, b| ordering.compare(a, b));
        let positions = vectors
            .iter()
            .enumerate()
            .map(|(pos, v)| (v.clone(), pos))
            .collect();
        Ok(Self {
            classes,
            stations,
            ordering,
            vectors,
            positions,
        })
    }

    /// Basis for the dimensions of `model`.
    pub fn for_model(model: &QnModel, ordering: VectorOrdering) -> Result<Self> {
        Self::generate(model.classes(), model.stations(), ordering)
    }

    /// Number of classes `R`.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Number of stations `M`.
    pub fn stations(&self) -> usize {
        self.stations
    }

    /// Number of components per vector, `R - 1`.
    pub fn components(&self) -> usize {
        self.classes - 1
    }

    /// Active ordering.
    pub fn ordering(&self) -> VectorOrdering {
        self.ordering
    }

    /// Number of vectors, `C(M + R - 1, M)`.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always false for a generated basis.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// All vectors in canonical order.
    pub fn vectors(&self) -> &[PopulationChangeVector] {
        &self.vectors
    }

    /// Vector at canonical position `pos`.
    pub fn vector(&self, pos: usize) -> &PopulationChangeVector {
        &self.vectors[pos]
    }

    /// Canonical position of `n`.
    pub fn position_of(&self, n: &PopulationChangeVector) -> Result<usize> {
        self.positions
            .get(n)
            .copied()
            .ok_or_else(|| ComomError::InvalidVector {
                vector: n.to_string(),
            })
    }

    /// The zero vector.
    pub fn zero_vector(&self) -> PopulationChangeVector {
        PopulationChangeVector::zeros(self.components())
    }
}

/// Bijection between `(vector, queue)` pairs and flat state positions.
pub trait Indexer {
    /// The enumeration this indexer is built on.
    fn basis(&self) -> &Basis;

    /// Flat index of the vector at canonical position `position` and `queue`.
    fn index_from_position(&self, position: usize, queue: usize) -> usize;

    /// `(canonical position, queue)` stored at `index`.
    fn position_at(&self, index: usize) -> Result<(usize, usize)>;

    /// Length of the state arrays, `(M + 1) * C(M + R - 1, M)`.
    fn size(&self) -> usize {
        self.basis().len() * (self.basis().stations() + 1)
    }

    /// Flat index of `(n, queue)`.
    fn index_of(&self, n: &PopulationChangeVector, queue: usize) -> Result<usize> {
        let stations = self.basis().stations();
        if queue > stations {
            return Err(ComomError::InvalidQueue { queue, stations });
        }
        let position = self.basis().position_of(n)?;
        Ok(self.index_from_position(position, queue))
    }

    /// Inverse of [`Indexer::index_of`].
    fn entry_at(&self, index: usize) -> Result<(&PopulationChangeVector, usize)> {
        let (position, queue) = self.position_at(index)?;
        Ok((self.basis().vector(position), queue))
    }

    /// Reset `store` to the boundary condition: every `(0, queue)` entry of
    /// the current array is one, everything else is zero.
    fn initialise(&self, store: &mut StateStore) -> Result<()> {
        if store.len() != self.size() {
            return Err(ComomError::DimensionMismatch {
                expected: self.size(),
                actual: store.len(),
            });
        }
        store.reset();
        let zero = self.basis().position_of(&self.basis().zero_vector())?;
        for queue in 0..=self.basis().stations() {
            store.set_current(self.index_from_position(zero, queue), Value::one());
        }
        Ok(())
    }
}

/// `position * (M + 1) + queue`
#[derive(Debug, Clone)]
pub struct StandardIndexer {
    basis: Basis,
}

impl StandardIndexer {
    pub fn new(basis: Basis) -> Self {
        Self { basis }
    }
}

impl Indexer for StandardIndexer {
    fn basis(&self) -> &Basis {
        &self.basis
    }

    fn index_from_position(&self, position: usize, queue: usize) -> usize {
        position * (self.basis.stations() + 1) + queue
    }

    fn position_at(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.size() {
            return Err(ComomError::IndexOutOfBounds {
                index,
                size: self.size(),
            });
        }
        let width = self.basis.stations() + 1;
        Ok((index / width, index % width))
    }
}

/// Block-triangular layout: all `queue >= 1` entries first, vector-major
/// (`position * M + queue - 1`), then one trailing block of `queue == 0`
/// entries (`C(M + R - 1, M) * M + position`).
#[derive(Debug, Clone)]
pub struct BtfIndexer {
    basis: Basis,
}

impl BtfIndexer {
    pub fn new(basis: Basis) -> Self {
        Self { basis }
    }

    /// Length of the leading `queue >= 1` region.
    pub fn x_size(&self) -> usize {
        self.basis.len() * self.basis.stations()
    }

    /// Index of the `queue == 0` entry of the vector at `position`.
    pub fn y_index(&self, position: usize) -> usize {
        self.x_size() + position
    }

    /// Index of the `queue >= 1` entry of the vector at `position`.
    pub fn x_index(&self, position: usize, queue: usize) -> usize {
        position * self.basis.stations() + queue - 1
    }
}

impl Indexer for BtfIndexer {
    fn basis(&self) -> &Basis {
        &self.basis
    }

    fn index_from_position(&self, position: usize, queue: usize) -> usize {
        if queue == 0 {
            self.y_index(position)
        } else {
            self.x_index(position, queue)
        }
    }

    fn position_at(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.size() {
            return Err(ComomError::IndexOutOfBounds {
                index,
                size: self.size(),
            });
        }
        let x_size = self.x_size();
        if index >= x_size {
            Ok((index - x_size, 0))
        } else {
            let m = self.basis.stations();
            Ok((index / m, index % m + 1))
        }
    }
}

/// Number of state entries for a model, without building a basis.
pub fn state_size(classes: usize, stations: usize) -> usize {
    vector_count(classes.saturating_sub(1), stations) * (stations + 1)
}

/// True if every entry of `values` outside the zero vector is exactly zero.
pub fn only_boundary_set<I: Indexer>(indexer: &I, values: &[Value]) -> Result<bool> {
    let zero = indexer.basis().position_of(&indexer.basis().zero_vector())?;
    for (index, value) in values.iter().enumerate() {
        let (position, _) = indexer.position_at(index)?;
        if position != zero && !value.is_zero() {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_basis_size() {
        let basis = Basis::generate(3, 2, VectorOrdering::SupportColex).unwrap();
        assert_eq!(basis.len(), 6);
        assert_eq!(basis.components(), 2);
        assert_eq!(basis.vector(0), &basis.zero_vector());
        assert_eq!(state_size(3, 2), 18);
    }

    #[test]
    fn test_single_class_basis() {
        let basis = Basis::generate(1, 3, VectorOrdering::SupportColex).unwrap();
        assert_eq!(basis.len(), 1);
        assert!(basis.vector(0).is_empty());
    }

    #[test]
    fn test_invalid_vector() {
        let basis = Basis::generate(3, 2, VectorOrdering::SupportColex).unwrap();
        let bad = PopulationChangeVector::new(vec![2, 1]);
        assert!(matches!(
            basis.position_of(&bad),
            Err(ComomError::InvalidVector { .. })
        ));
        let indexer = StandardIndexer::new(basis);
        assert!(matches!(
            indexer.index_of(&PopulationChangeVector::zeros(2), 3),
            Err(ComomError::InvalidQueue { .. })
        ));
    }

    #[test]
    fn test_btf_index_layout() {
        let basis = Basis::generate(3, 2, VectorOrdering::SupportColex).unwrap();
        let indexer = BtfIndexer::new(basis);
        assert_eq!(indexer.x_size(), 12);
        let zero = PopulationChangeVector::zeros(2);
        assert_eq!(indexer.index_of(&zero, 0).unwrap(), 12);
        assert_eq!(indexer.index_of(&zero, 1).unwrap(), 0);
        assert_eq!(indexer.index_of(&zero, 2).unwrap(), 1);
        let e1 = PopulationChangeVector::unit(2, 0);
        assert_eq!(indexer.index_of(&e1, 0).unwrap(), 13);
        assert_eq!(indexer.index_of(&e1, 2).unwrap(), 3);
    }

    #[test]
    fn test_indexers_are_bijections() {
        for ordering in [
            VectorOrdering::SupportColex,
            VectorOrdering::LeftmostNonzero,
            VectorOrdering::BinarySupport,
        ] {
            let basis = Basis::generate(4, 3, ordering).unwrap();
            let standard = StandardIndexer::new(basis.clone());
            let btf = BtfIndexer::new(basis.clone());
            for indexer in [&standard as &dyn Indexer, &btf as &dyn Indexer] {
                let mut seen = HashSet::new();
                for n in basis.vectors() {
                    for q in 0..=basis.stations() {
                        let i = indexer.index_of(n, q).unwrap();
                        assert!(i < indexer.size());
                        assert!(seen.insert(i));
                        let (back, queue) = indexer.entry_at(i).unwrap();
                        assert_eq!(back, n);
                        assert_eq!(queue, q);
                    }
                }
                assert_eq!(seen.len(), indexer.size());
            }
        }
    }

    #[test]
    fn test_initialise_sets_boundary() {
        let basis = Basis::generate(3, 2, VectorOrdering::SupportColex).unwrap();
        let indexer = BtfIndexer::new(basis);
        let mut store = StateStore::new(indexer.size(), indexer.x_size());
        store.set_current(5, Value::from_integer(9));
        indexer.initialise(&mut store).unwrap();
        let zero = PopulationChangeVector::zeros(2);
        for q in 0..=2 {
            let i = indexer.index_of(&zero, q).unwrap();
            assert_eq!(store.current(i), &Value::one());
        }
        let ones = store.current_values().iter().filter(|v| v.is_one()).count();
        assert_eq!(ones, 3);
        assert!(only_boundary_set(&indexer, store.current_values()).unwrap());
        assert!(store.previous_values().iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_initialise_rejects_wrong_store() {
        let basis = Basis::generate(2, 2, VectorOrdering::SupportColex).unwrap();
        let indexer = StandardIndexer::new(basis);
        let mut store = StateStore::new(4, 0);
        assert!(indexer.initialise(&mut store).is_err());
        assert!(Basis::generate(0, 2, VectorOrdering::SupportColex).is_err());
    }
}
