//! Per-class reordering of the standard state layout.
//!
//! While class `c` is being added, the `queue == 0` entries of the vectors
//! whose support lies inside classes `1..c-1` are the ones a solve pass
//! finalises. The table moves them to a trailing block, in canonical order,
//! and shifts every other entry forward so that the block-triangular
//! structure of the remaining system stays visible.

use crate::basis::{Indexer, StandardIndexer};
use crate::combinatorics::vector_count;
use crate::error::{ComomError, Result};
use crate::value::Value;
use crate::vector::PopulationChangeVector;

/// Permutation from standard indices to reordered indices for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderingTable {
    class: usize,
    target: Vec<usize>,
}

impl ReorderingTable {
    /// Build the table for `class` (1-based, `1..=R`).
    pub fn for_class(indexer: &StandardIndexer, class: usize) -> Result<Self> {
        let basis = indexer.basis();
        if class == 0 || class > basis.classes() {
            return Err(ComomError::InvalidModel {
                message: format!("class {} outside 1..={}", class, basis.classes()),
            });
        }
        let size = indexer.size();
        let moved_total = vector_count(class - 1, basis.stations());
        let tail_start = size - moved_total;

        let mut target = vec![0; size];
        let mut moved = 0;
        for (position, n) in basis.vectors().iter().enumerate() {
            for queue in 0..=basis.stations() {
                let index = indexer.index_from_position(position, queue);
                if queue == 0 && n.vanishes_from(class - 1) {
                    target[index] = tail_start + moved;
                    moved += 1;
                } else {
                    target[index] = index - moved;
                }
            }
        }
        debug_assert_eq!(moved, moved_total);
        Ok(Self { class, target })
    }

    /// Class this table was built for.
    pub fn class(&self) -> usize {
        self.class
    }

    /// Reordered position of each standard index.
    pub fn permutation(&self) -> &[usize] {
        &self.target
    }

    /// Reordered index of `(n, queue)`.
    pub fn index_of(
        &self,
        indexer: &StandardIndexer,
        n: &PopulationChangeVector,
        queue: usize,
    ) -> Result<usize> {
        Ok(self.target[indexer.index_of(n, queue)?])
    }

    /// Lay out standard-ordered `values` under this table.
    pub fn apply(&self, values: &[Value]) -> Result<Vec<Value>> {
        self.check_len(values.len())?;
        let mut out = vec![Value::Undefined; values.len()];
        for (index, value) in values.iter().enumerate() {
            out[self.target[index]] = value.clone();
        }
        Ok(out)
    }

    /// Move `values`, laid out under `from`, into this table's layout.
    pub fn reorder(&self, values: &[Value], from: &ReorderingTable) -> Result<Vec<Value>> {
        self.check_len(values.len())?;
        from.check_len(values.len())?;
        let mut out = vec![Value::Undefined; values.len()];
        for (&old, &new) in from.target.iter().zip(&self.target) {
            out[new] = values[old].clone();
        }
        Ok(out)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.target.len() {
            return Err(ComomError::DimensionMismatch {
                expected: self.target.len(),
                actual: len,
            });
        }
        Ok(())
    }
}
