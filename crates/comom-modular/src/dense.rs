//! Dense per-step system over the standard layout.
//!
//! One population step of class `c` is written as `A * new = B * old` with
//! one row per state entry:
//! - entries of vectors touching a class after `c` are zero,
//! - entries of vectors whose largest support index is class `c` copy the
//!   previous value one job of class `c` earlier,
//! - queue-0 entries of the remaining vectors follow from the previous
//!   step directly, and their queue >= 1 entries from the convolution
//!   expansion and population constraint rows.
//!
//! Columns follow the class's [`ReorderingTable`], so the directly known
//! queue-0 block trails. Rows are scaled to integers.

use comom_core::{Indexer, Matrix, QnModel, ReorderingTable, StandardIndexer, Value};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::crt::reduce;
use crate::error::{ModularError, Result};
use crate::residue::ResidueSystem;

/// Sparse rational row under construction.
#[derive(Debug, Default)]
struct RationalRow {
    entries: Vec<(usize, BigRational)>,
    rhs: BigRational,
}

impl RationalRow {
    fn push(&mut self, col: usize, coeff: BigRational) {
        if !coeff.is_zero() {
            self.entries.push((col, coeff));
        }
    }
}

/// Integer system `A x = b` of one population step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseSystem {
    a: Matrix<BigInt>,
    b: Vec<BigInt>,
    /// Column of each standard index
    columns: Vec<usize>,
}

/// Everything needed to write the rows of one step.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub model: &'a QnModel,
    pub indexer: &'a StandardIndexer,
    pub table: &'a ReorderingTable,
    pub population: u32,
    pub old: &'a [Value],
}

impl DenseSystem {
    /// Assemble the step of `input.table.class()` to `input.population`.
    pub fn assemble(input: &StepInput<'_>) -> Result<Self> {
        let StepInput {
            model,
            indexer,
            table,
            population,
            old,
        } = *input;
        let class = table.class();
        let c = class - 1;
        let last = class == model.classes();
        let basis = indexer.basis();
        let stations = basis.stations();
        let columns = table.permutation().to_vec();
        let col = |pos: usize, q: usize| columns[indexer.index_from_position(pos, q)];
        let previous = |pos: usize, q: usize| -> Result<BigRational> {
            old[indexer.index_from_position(pos, q)]
                .as_rational()
                .cloned()
                .ok_or(ModularError::InconsistentSystem { class, population })
        };

        let mut rows: Vec<RationalRow> = Vec::with_capacity(indexer.size());
        for (pos, n) in basis.vectors().iter().enumerate() {
            if !n.vanishes_from(class) {
                for q in 0..=stations {
                    let mut row = RationalRow::default();
                    row.push(col(pos, q), BigRational::one());
                    rows.push(row);
                }
                continue;
            }
            if !n.vanishes_from(c) {
                let source = match n.minus_one(c) {
                    Some(v) => basis.position_of(&v)?,
                    None => continue,
                };
                for q in 0..=stations {
                    let mut row = RationalRow::default();
                    row.push(col(pos, q), BigRational::one());
                    row.rhs = previous(source, q)?;
                    rows.push(row);
                }
                continue;
            }

            let mut row = RationalRow::default();
            row.push(col(pos, 0), BigRational::from_integer(population.into()));
            row.rhs = model.think_time(c) * previous(pos, 0)?;
            for k in 1..=stations {
                row.rhs += model.replicated_demand(k - 1, c) * previous(pos, k)?;
            }
            rows.push(row);

            if n.sum() < stations as u32 {
                for k in 1..=stations {
                    let mut row = RationalRow::default();
                    row.push(col(pos, k), BigRational::one());
                    for s in 0..basis.components() {
                        let next = basis.position_of(&n.plus_one(s))?;
                        row.push(col(next, k), -model.demand(k - 1, s));
                    }
                    row.push(col(pos, 0), -BigRational::one());
                    if last {
                        row.rhs = model.demand(k - 1, c) * previous(pos, k)?;
                    }
                    rows.push(row);
                }
            }

            for s in n.support() {
                let Some(lower) = n.minus_one(s) else {
                    continue;
                };
                let lower_pos = basis.position_of(&lower)?;
                let mut row = RationalRow::default();
                for k in 1..=stations {
                    row.push(col(pos, k), model.replicated_demand(k - 1, s));
                }
                row.push(col(pos, 0), model.think_time(s).clone());
                let remaining = i64::from(model.population(s)) - i64::from(lower.get(s));
                row.push(col(lower_pos, 0), -BigRational::from_integer(remaining.into()));
                rows.push(row);
            }
        }

        let size = indexer.size();
        if rows.len() != size {
            return Err(ModularError::Core(comom_core::ComomError::DimensionMismatch {
                expected: size,
                actual: rows.len(),
            }));
        }

        let mut a = Matrix::zeros(size, size);
        let mut b = Vec::with_capacity(size);
        for (i, row) in rows.into_iter().enumerate() {
            let scale = row
                .entries
                .iter()
                .map(|(_, v)| v.denom().clone())
                .fold(row.rhs.denom().clone(), |acc, d| acc.lcm(&d));
            for (j, v) in &row.entries {
                a[[i, *j]] += v.numer() * (&scale / v.denom());
            }
            b.push(row.rhs.numer() * (&scale / row.rhs.denom()));
        }
        Ok(Self { a, b, columns })
    }

    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// `H^2` for the Hadamard bound `H = prod_i |[A | b]_i|`, which bounds
    /// `det(A)` and every Cramer numerator.
    pub fn hadamard_bound_squared(&self) -> BigInt {
        (0..self.order()).fold(BigInt::one(), |acc, i| {
            let norm = self
                .a
                .row(i)
                .iter()
                .chain(std::iter::once(&self.b[i]))
                .fold(BigInt::zero(), |s, v| s + v * v);
            acc * norm
        })
    }

    /// Number of primes of `bits` bits whose product exceeds `2H`.
    pub fn prime_count(&self, bits: u32) -> usize {
        let h_bits = self.hadamard_bound_squared().bits().div_ceil(2) + 2;
        (h_bits.div_ceil(u64::from(bits - 1)) as usize).max(1)
    }

    /// The system modulo `prime`.
    pub fn residue(&self, prime: u64) -> ResidueSystem {
        let n = self.order();
        let mut a = Vec::with_capacity(n * n);
        for i in 0..n {
            a.extend(self.a.row(i).iter().map(|v| reduce(v, prime)));
        }
        ResidueSystem {
            prime,
            a,
            b: self.b.iter().map(|v| reduce(v, prime)).collect(),
        }
    }

    /// Map a solution in column order back to the standard layout.
    pub fn to_standard(&self, solution: Vec<BigRational>) -> Vec<Value> {
        self.columns
            .iter()
            .map(|&col| Value::from(solution[col].clone()))
            .collect()
    }

    /// Largest coefficient magnitude, for diagnostics.
    pub fn max_coefficient_bits(&self) -> u64 {
        (0..self.order())
            .flat_map(|i| self.a.row(i).iter().map(|v| v.abs().bits()))
            .max()
            .unwrap_or(0)
    }
}
