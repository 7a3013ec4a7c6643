//! Shared state arrays of a solve pass

use num_traits::Zero;

use crate::error::{ComomError, Result};
use crate::value::Value;

/// The `current`/`previous` value arrays plus a right-hand-side workspace.
///
/// Solvers hold the store by `&mut` for the duration of a step, so at most
/// one block writes into it at a time. [`StateStore::swap`] turns the
/// results of one population step into the inputs of the next without
/// copying either array.
#[derive(Debug, Clone)]
pub struct StateStore {
    current: Vec<Value>,
    previous: Vec<Value>,
    rhs: Vec<Value>,
}

impl StateStore {
    /// A zeroed store with `size` state entries and `rhs_len` workspace entries.
    pub fn new(size: usize, rhs_len: usize) -> Self {
        Self {
            current: vec![Value::zero(); size],
            previous: vec![Value::zero(); size],
            rhs: vec![Value::zero(); rhs_len],
        }
    }

    /// A store holding the given state arrays and a zeroed workspace.
    pub fn from_arrays(current: Vec<Value>, previous: Vec<Value>, rhs_len: usize) -> Result<Self> {
        if current.len() != previous.len() {
            return Err(ComomError::DimensionMismatch {
                expected: current.len(),
                actual: previous.len(),
            });
        }
        Ok(Self {
            current,
            previous,
            rhs: vec![Value::zero(); rhs_len],
        })
    }

    /// Number of state entries.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// True for a store without state entries.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Zero every entry of both arrays and the workspace.
    pub fn reset(&mut self) {
        for v in self
            .current
            .iter_mut()
            .chain(self.previous.iter_mut())
            .chain(self.rhs.iter_mut())
        {
            *v = Value::zero();
        }
    }

    /// Exchange the current and previous arrays.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    pub fn current(&self, index: usize) -> &Value {
        &self.current[index]
    }

    pub fn previous(&self, index: usize) -> &Value {
        &self.previous[index]
    }

    pub fn set_current(&mut self, index: usize, value: Value) {
        self.current[index] = value;
    }

    pub fn current_values(&self) -> &[Value] {
        &self.current
    }

    pub fn previous_values(&self) -> &[Value] {
        &self.previous
    }

    /// Replace the current array wholesale (used when a backend computes
    /// a full step in a detached buffer).
    pub fn replace_current(&mut self, values: Vec<Value>) {
        self.current = values;
    }

    /// Right-hand-side workspace.
    pub fn rhs(&self) -> &[Value] {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> &mut [Value] {
        &mut self.rhs
    }

    /// Workspace and previous array, for accumulating right-hand sides from
    /// already known values.
    pub fn rhs_and_previous(&mut self) -> (&mut [Value], &[Value]) {
        (&mut self.rhs, &self.previous)
    }

    /// Workspace and current array, for subtracting couplings to values
    /// solved earlier in the same step.
    pub fn rhs_and_current(&mut self) -> (&mut [Value], &[Value]) {
        (&mut self.rhs, &self.current)
    }

    /// Workspace and mutable current array, for writing solutions.
    pub fn solve_buffers(&mut self) -> (&[Value], &mut [Value]) {
        (&self.rhs, &mut self.current)
    }

    /// Previous array and mutable current array, for copy-like blocks.
    pub fn step_buffers(&mut self) -> (&[Value], &mut [Value]) {
        (&self.previous, &mut self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_exchanges_arrays() {
        let mut store = StateStore::new(3, 1);
        store.set_current(1, Value::from_integer(4));
        store.swap();
        assert_eq!(store.previous(1), &Value::from_integer(4));
        assert!(store.current(1).is_zero());
        store.swap();
        assert_eq!(store.current(1), &Value::from_integer(4));
    }

    #[test]
    fn test_from_arrays() {
        let store = StateStore::from_arrays(
            vec![Value::from_integer(1), Value::from_integer(2)],
            vec![Value::from_integer(3), Value::Undefined],
            4,
        )
        .unwrap();
        assert_eq!(store.current(1), &Value::from_integer(2));
        assert!(store.previous(1).is_undefined());
        assert_eq!(store.rhs().len(), 4);
        assert!(StateStore::from_arrays(vec![Value::zero()], vec![], 0).is_err());
    }

    #[test]
    fn test_reset() {
        let mut store = StateStore::new(2, 2);
        store.set_current(0, Value::Undefined);
        store.rhs_mut()[1] = Value::from_integer(3);
        store.swap();
        store.reset();
        assert!(store.current_values().iter().all(|v| v.is_zero()));
        assert!(store.previous_values().iter().all(|v| v.is_zero()));
        assert!(store.rhs().iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_split_borrows() {
        let mut store = StateStore::new(2, 1);
        store.set_current(0, Value::from_integer(2));
        {
            let (rhs, current) = store.rhs_and_current();
            rhs[0] = &current[0] + &current[0];
        }
        let (rhs, current) = store.solve_buffers();
        current[1] = rhs[0].clone();
        assert_eq!(store.current(1), &Value::from_integer(4));
    }
}
