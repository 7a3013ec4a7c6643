//! Leaf blocks and the arena that owns them.
//!
//! Every coefficient of the assembled system lives in exactly one leaf.
//! Macro, secondary and top-level blocks, and every class view derived
//! from them, refer to leaves by [`LeafId`] only.

use std::ops::Range;

use comom_core::{Matrix, QnModel, Value};
use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::error::{structure, Result};
use crate::lup::{lup, LupDecomposition, LupOptions};

/// Index of a leaf in a [`BlockArena`].
pub type LeafId = usize;

/// Anchor and extent of a block in its quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Span {
    pub fn new(row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self {
            row,
            col,
            rows,
            cols,
        }
    }

    pub fn row_range(&self) -> Range<usize> {
        self.row..self.row + self.rows
    }

    pub fn col_range(&self) -> Range<usize> {
        self.col..self.col + self.cols
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.row_range().contains(&row) && self.col_range().contains(&col)
    }
}

/// Coefficient of a [`ScaledTerm`], resolved against the class being added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// `D_kc`
    Demand { station: usize },
    /// `m_k * D_kc`
    ReplicatedDemand { station: usize },
    /// `Z_c`
    ThinkTime,
}

impl Weight {
    /// Numeric value for class `class` (0-based).
    pub fn resolve(&self, model: &QnModel, class: usize) -> BigRational {
        match *self {
            Weight::Demand { station } => model.demand(station, class).clone(),
            Weight::ReplicatedDemand { station } => model.replicated_demand(station, class),
            Weight::ThinkTime => model.think_time(class).clone(),
        }
    }
}

/// One previous-step value times a class-dependent weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledTerm {
    pub source: usize,
    pub weight: Weight,
}

/// A destination and the terms summed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledRow {
    pub dest: usize,
    pub terms: Vec<ScaledTerm>,
}

impl ScaledRow {
    /// `sum_t weight_t * previous[source_t]`
    pub fn evaluate(&self, model: &QnModel, class: usize, previous: &[Value]) -> Value {
        let mut acc = Value::zero();
        for term in &self.terms {
            acc.add_scaled(&term.weight.resolve(model, class), &previous[term.source]);
        }
        acc
    }
}

/// Demand-weighted copies of previous values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledCopyBlock {
    pub rows: Vec<ScaledRow>,
    /// Divide every row by the current population of the class being added
    pub per_population: bool,
}

/// `(source, dest)` pairs of plain copies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CarryForwardBlock {
    pub pairs: Vec<(usize, usize)>,
}

/// A square coefficient matrix that is solved, with its factorisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagonalBlock {
    pub matrix: Matrix<BigRational>,
    /// Rows assigned so far during assembly
    pub filled: usize,
    pub factors: Option<LupDecomposition>,
}

impl DiagonalBlock {
    pub fn new(order: usize) -> Self {
        Self {
            matrix: Matrix::zeros(order, order),
            filled: 0,
            factors: None,
        }
    }
}

/// Closed set of leaf kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// Unknown-to-unknown coefficients, solved by LUP
    Diagonal(DiagonalBlock),
    /// Coefficients multiplying values solved elsewhere
    Coupling(Matrix<BigRational>),
    /// Index-to-index copies
    CarryForward(CarryForwardBlock),
    /// Weighted sums of previous values
    ScaledCopy(ScaledCopyBlock),
}

/// A leaf: a kind plus where it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub span: Span,
    pub h: usize,
    /// Index of the pattern within its group (or of the macro pair for
    /// secondary couplings)
    pub pattern: usize,
    pub kind: BlockKind,
}

impl Leaf {
    /// Accumulate `coeff` at absolute `(row, col)`.
    pub fn add(&mut self, row: usize, col: usize, coeff: &BigRational) -> Result<()> {
        if !self.span.contains(row, col) {
            return Err(structure(format!(
                "({}, {}) lies outside leaf {:?}",
                row, col, self.span
            )));
        }
        let (i, j) = (row - self.span.row, col - self.span.col);
        match &mut self.kind {
            BlockKind::Diagonal(d) => d.matrix[[i, j]] += coeff,
            BlockKind::Coupling(m) => m[[i, j]] += coeff,
            _ => return Err(structure("coefficients only go into matrix leaves")),
        }
        Ok(())
    }

    /// The dense matrix of a Diagonal or Coupling leaf.
    pub fn matrix(&self) -> Option<&Matrix<BigRational>> {
        match &self.kind {
            BlockKind::Diagonal(d) => Some(&d.matrix),
            BlockKind::Coupling(m) => Some(m),
            _ => None,
        }
    }

    /// `out[row] += sum_j A[row][j] * x[col + j]` over the first `rows` rows
    /// and `cols` columns of the leaf, at absolute positions.
    pub fn accumulate_product(
        &self,
        rows: usize,
        cols: usize,
        x: &[Value],
        out: &mut [Value],
        sign: &BigRational,
    ) -> Result<()> {
        let matrix = self
            .matrix()
            .ok_or_else(|| structure("product of a leaf without coefficients"))?;
        let product = matrix.mul_values_corner(rows, &x[self.span.col..self.span.col + cols]);
        for (target, v) in out[self.span.row..].iter_mut().zip(&product) {
            target.add_scaled(sign, v);
        }
        Ok(())
    }
}

/// Owner of every leaf of a master structure.
#[derive(Debug, Clone, Default)]
pub struct BlockArena {
    leaves: Vec<Leaf>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, leaf: Leaf) -> LeafId {
        self.leaves.push(leaf);
        self.leaves.len() - 1
    }

    pub fn get(&self, id: LeafId) -> &Leaf {
        &self.leaves[id]
    }

    pub fn get_mut(&mut self, id: LeafId) -> &mut Leaf {
        &mut self.leaves[id]
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Next free row of a diagonal leaf, as an absolute row.
    pub fn claim_row(&mut self, id: LeafId) -> Result<usize> {
        let leaf = &mut self.leaves[id];
        match &mut leaf.kind {
            BlockKind::Diagonal(d) if d.filled < leaf.span.rows => {
                d.filled += 1;
                Ok(leaf.span.row + d.filled - 1)
            }
            BlockKind::Diagonal(_) => Err(structure(format!(
                "diagonal leaf {} (h = {}, pattern {}) has no free rows",
                id, leaf.h, leaf.pattern
            ))),
            _ => Err(structure(format!("leaf {} is not diagonal", id))),
        }
    }

    /// Factor every diagonal leaf once; fails if any is not completely filled.
    pub fn factor_diagonals(&mut self, options: &LupOptions) -> Result<usize> {
        let mut count = 0;
        for (id, leaf) in self.leaves.iter_mut().enumerate() {
            if let BlockKind::Diagonal(d) = &mut leaf.kind {
                if d.filled != leaf.span.rows {
                    return Err(structure(format!(
                        "diagonal leaf {} has {} of {} rows",
                        id, d.filled, leaf.span.rows
                    )));
                }
                d.factors = Some(lup(&d.matrix, Some(options.clone()))?);
                count += 1;
            }
        }
        Ok(count)
    }

    /// All leaves, by id.
    pub fn iter(&self) -> impl Iterator<Item = &Leaf> {
        self.leaves.iter()
    }
}

/// `-1` as an exact rational, the sign used when moving couplings to the
/// right-hand side.
pub fn minus_one() -> BigRational {
    -BigRational::one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use comom_core::value::integer;

    #[test]
    fn test_span() {
        let s = Span::new(2, 5, 3, 2);
        assert!(s.contains(2, 5));
        assert!(s.contains(4, 6));
        assert!(!s.contains(5, 5));
        assert!(!s.contains(2, 7));
    }

    #[test]
    fn test_claim_rows_and_factor() {
        let mut arena = BlockArena::new();
        let id = arena.push(Leaf {
            span: Span::new(4, 4, 2, 2),
            h: 0,
            pattern: 0,
            kind: BlockKind::Diagonal(DiagonalBlock::new(2)),
        });
        assert!(arena.factor_diagonals(&LupOptions::default()).is_err());
        let r0 = arena.claim_row(id).unwrap();
        let r1 = arena.claim_row(id).unwrap();
        assert_eq!((r0, r1), (4, 5));
        assert!(arena.claim_row(id).is_err());
        arena.get_mut(id).add(4, 4, &integer(2)).unwrap();
        arena.get_mut(id).add(5, 5, &integer(3)).unwrap();
        assert!(arena.get_mut(id).add(6, 4, &integer(1)).is_err());
        assert_eq!(arena.factor_diagonals(&LupOptions::default()).unwrap(), 1);
    }

    #[test]
    fn test_accumulate_product_with_sign() {
        let mut m = Matrix::zeros(2, 2);
        m[[0, 0]] = integer(1);
        m[[1, 1]] = integer(2);
        let leaf = Leaf {
            span: Span::new(0, 1, 2, 2),
            h: 1,
            pattern: 0,
            kind: BlockKind::Coupling(m),
        };
        let x = vec![Value::Undefined, Value::from_integer(5), Value::from_integer(7)];
        let mut out = vec![Value::from_integer(1), Value::from_integer(1)];
        leaf.accumulate_product(2, 2, &x, &mut out, &minus_one()).unwrap();
        assert_eq!(out, vec![Value::from_integer(-4), Value::from_integer(-13)]);
        // corner restricted to the first row and column
        let mut out = vec![Value::zero(), Value::zero()];
        leaf.accumulate_product(1, 1, &x, &mut out, &BigRational::one()).unwrap();
        assert_eq!(out, vec![Value::from_integer(5), Value::zero()]);
    }

    #[test]
    fn test_weights_resolve_per_class() {
        let model = QnModel::from_integers(vec![1, 1], vec![3, 4], vec![vec![2, 5]])
            .unwrap()
            .with_multiplicities(vec![2])
            .unwrap();
        assert_eq!(Weight::Demand { station: 0 }.resolve(&model, 1), integer(5));
        assert_eq!(Weight::ReplicatedDemand { station: 0 }.resolve(&model, 1), integer(10));
        assert_eq!(Weight::ThinkTime.resolve(&model, 0), integer(3));
        let row = ScaledRow {
            dest: 0,
            terms: vec![
                ScaledTerm {
                    source: 0,
                    weight: Weight::ThinkTime,
                },
                ScaledTerm {
                    source: 1,
                    weight: Weight::ReplicatedDemand { station: 0 },
                },
            ],
        };
        let previous = vec![Value::from_integer(1), Value::from_integer(2)];
        assert_eq!(row.evaluate(&model, 0, &previous), Value::from_integer(11));
    }
}
