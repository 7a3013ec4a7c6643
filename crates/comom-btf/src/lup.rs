//! LU decomposition with row pivoting over exact rationals
//!
//! Represents a square matrix A as `P * A = L * U`, L unit lower
//! triangular, U upper triangular, P the recorded row permutation.

use comom_core::{Matrix, Value};
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{BtfError, Result};

/// Pivot selection rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pivoting {
    /// Row of maximal absolute value among the remaining rows
    #[default]
    MaxAbs,
    /// First remaining row with a nonzero entry
    FirstNonzero,
}

/// Options for LUP decomposition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LupOptions {
    /// Pivot selection rule
    #[serde(default)]
    pub pivoting: Pivoting,
}

/// Packed LUP factorisation of a square matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LupDecomposition {
    /// Strictly lower part holds L (unit diagonal implied), upper part holds U
    lu: Matrix<BigRational>,
    /// `permutation[i]` is the original row now at row `i`
    permutation: Vec<usize>,
}

/// Factor a copy of `a`
pub fn lup(a: &Matrix<BigRational>, options: Option<LupOptions>) -> Result<LupDecomposition> {
    lup_inplace(a.clone(), options)
}

/// Factor `a`, consuming it as the storage of the packed factors
pub fn lup_inplace(mut a: Matrix<BigRational>, options: Option<LupOptions>) -> Result<LupDecomposition> {
    let opts = options.unwrap_or_default();
    let n = a.nrows();
    if a.ncols() != n {
        return Err(BtfError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    let mut permutation: Vec<usize> = (0..n).collect();

    for k in 0..n {
        let pivot_row =
            select_pivot(&a, k, opts.pivoting).ok_or(BtfError::SingularSystem { column: k })?;
        if pivot_row != k {
            a.swap_rows(pivot_row, k);
            permutation.swap(pivot_row, k);
        }

        let pivot = a[[k, k]].clone();
        for i in (k + 1)..n {
            if a[[i, k]].is_zero() {
                continue;
            }
            let factor = &a[[i, k]] / &pivot;
            for j in (k + 1)..n {
                if a[[k, j]].is_zero() {
                    continue;
                }
                let update = &factor * &a[[k, j]];
                a[[i, j]] -= update;
            }
            a[[i, k]] = factor;
        }
    }

    Ok(LupDecomposition { lu: a, permutation })
}

fn select_pivot(a: &Matrix<BigRational>, k: usize, pivoting: Pivoting) -> Option<usize> {
    let mut candidates = (k..a.nrows()).filter(|&i| !a[[i, k]].is_zero());
    match pivoting {
        Pivoting::FirstNonzero => candidates.next(),
        Pivoting::MaxAbs => {
            let mut best: Option<(usize, BigRational)> = None;
            for i in candidates {
                let magnitude = a[[i, k]].abs();
                let replace = match &best {
                    Some((_, current)) => magnitude > *current,
                    None => true,
                };
                if replace {
                    best = Some((i, magnitude));
                }
            }
            best.map(|(i, _)| i)
        }
    }
}

impl LupDecomposition {
    /// Order of the factored matrix
    pub fn size(&self) -> usize {
        self.lu.nrows()
    }

    /// Row permutation
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Unit lower triangular factor
    pub fn lower(&self) -> Matrix<BigRational> {
        let n = self.size();
        let mut l = Matrix::eye(n);
        for i in 0..n {
            for j in 0..i {
                l[[i, j]] = self.lu[[i, j]].clone();
            }
        }
        l
    }

    /// Upper triangular factor
    pub fn upper(&self) -> Matrix<BigRational> {
        let n = self.size();
        let mut u = Matrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                u[[i, j]] = self.lu[[i, j]].clone();
            }
        }
        u
    }

    /// Solve `A x = b`, returning `x`
    pub fn solve(&self, b: &[Value]) -> Result<Vec<Value>> {
        let mut x = vec![Value::zero(); self.size()];
        self.solve_into(b, &mut x)?;
        Ok(x)
    }

    /// Solve `A x = b`, writing `x` into `out`.
    ///
    /// Forward substitution runs on the permuted right-hand side, back
    /// substitution through U. Undefined entries of `b` propagate to every
    /// unknown that depends on them.
    pub fn solve_into(&self, b: &[Value], out: &mut [Value]) -> Result<()> {
        let n = self.size();
        if b.len() != n {
            return Err(BtfError::DimensionMismatch {
                expected: n,
                actual: b.len(),
            });
        }
        if out.len() != n {
            return Err(BtfError::DimensionMismatch {
                expected: n,
                actual: out.len(),
            });
        }

        // L y = P b
        for i in 0..n {
            let mut acc = b[self.permutation[i]].clone();
            for j in 0..i {
                let l = &self.lu[[i, j]];
                if !l.is_zero() {
                    acc.add_scaled(&-l, &out[j]);
                }
            }
            out[i] = acc;
        }

        // U x = y
        for i in (0..n).rev() {
            let mut acc = out[i].clone();
            for j in (i + 1)..n {
                let u = &self.lu[[i, j]];
                if !u.is_zero() {
                    acc.add_scaled(&-u, &out[j]);
                }
            }
            out[i] = acc.scale(&(BigRational::one() / &self.lu[[i, i]]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comom_core::value::integer as r;

    fn matrix(rows: Vec<Vec<i64>>) -> Matrix<BigRational> {
        Matrix::from_vec2d(
            rows.into_iter()
                .map(|row| row.into_iter().map(r).collect())
                .collect(),
        )
    }

    fn values(v: &[i64]) -> Vec<Value> {
        v.iter().map(|&x| Value::from_integer(x)).collect()
    }

    #[test]
    fn test_lup_reconstructs_permuted_matrix() {
        let a = matrix(vec![vec![0, 2, 1], vec![1, 1, 0], vec![3, 0, 1]]);
        let f = lup(&a, None).unwrap();
        let l = f.lower();
        let u = f.upper();
        for i in 0..3 {
            for j in 0..3 {
                let lu_ij = (0..3).fold(BigRational::zero(), |acc, k| acc + &l[[i, k]] * &u[[k, j]]);
                assert_eq!(lu_ij, a[[f.permutation()[i], j]]);
            }
        }
    }

    #[test]
    fn test_lup_max_abs_pivot() {
        let a = matrix(vec![vec![1, 0], vec![-5, 1]]);
        let f = lup(&a, None).unwrap();
        assert_eq!(f.permutation(), &[1, 0]);
        let g = lup(
            &a,
            Some(LupOptions {
                pivoting: Pivoting::FirstNonzero,
            }),
        )
        .unwrap();
        assert_eq!(g.permutation(), &[0, 1]);
    }

    #[test]
    fn test_lup_solve() {
        let a = matrix(vec![vec![2, 1, 0], vec![1, 3, 1], vec![0, 1, 4]]);
        let f = lup(&a, None).unwrap();
        let b = values(&[3, 5, 5]);
        let x = f.solve(&b).unwrap();
        assert_eq!(x, values(&[1, 1, 1]));
    }

    #[test]
    fn test_lup_singular() {
        let a = matrix(vec![vec![1, 2], vec![2, 4]]);
        assert!(matches!(lup(&a, None), Err(BtfError::SingularSystem { column: 1 })));
        let z = matrix(vec![vec![0, 1], vec![0, 3]]);
        assert!(matches!(lup(&z, None), Err(BtfError::SingularSystem { column: 0 })));
    }

    #[test]
    fn test_lup_rejects_non_square() {
        let a = Matrix::<BigRational>::zeros(2, 3);
        assert!(matches!(lup(&a, None), Err(BtfError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_solve_propagates_undefined() {
        // upper triangular: x1 depends only on b1
        let a = matrix(vec![vec![1, 1], vec![0, 1]]);
        let f = lup(&a, Some(LupOptions { pivoting: Pivoting::FirstNonzero })).unwrap();
        let x = f.solve(&[Value::Undefined, Value::from_integer(2)]).unwrap();
        assert!(x[0].is_undefined());
        assert_eq!(x[1], Value::from_integer(2));
    }

    #[test]
    fn test_empty_matrix() {
        let f = lup(&Matrix::zeros(0, 0), None).unwrap();
        assert!(f.solve(&[]).unwrap().is_empty());
    }
}
