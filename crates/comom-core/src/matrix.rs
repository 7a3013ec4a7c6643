//! Dense row-major matrices

use std::ops::{Index, IndexMut};

use num_rational::BigRational;
use num_traits::{One, Zero};

use crate::value::Value;

/// Simple 2D matrix backed by Vec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Clone> Matrix<T> {
    /// Create a new matrix from dimensions and initial value
    pub fn from_elem(nrows: usize, ncols: usize, elem: T) -> Self {
        Self {
            data: vec![elem; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Swap rows `a` and `b` in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            self.data.swap(a * self.ncols + j, b * self.ncols + j);
        }
    }
}

impl<T: Clone + Zero> Matrix<T> {
    /// Create a zeros matrix
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_elem(nrows, ncols, T::zero())
    }

    /// Create a matrix from a 2D vector (row-major)
    pub fn from_vec2d(rows: Vec<Vec<T>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(nrows, ncols);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, v) in row.into_iter().enumerate().take(ncols) {
                m[[i, j]] = v;
            }
        }
        m
    }

    /// Number of nonzero entries
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| !v.is_zero()).count()
    }
}

impl<T: Clone + Zero + One> Matrix<T> {
    /// Create an identity matrix
    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[[i, i]] = T::one();
        }
        m
    }
}

impl<T> Index<[usize; 2]> for Matrix<T> {
    type Output = T;

    fn index(&self, idx: [usize; 2]) -> &Self::Output {
        &self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl<T> IndexMut<[usize; 2]> for Matrix<T> {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut Self::Output {
        &mut self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl Matrix<BigRational> {
    /// `self * x` for exact vectors
    pub fn mul_vec(&self, x: &[BigRational]) -> Vec<BigRational> {
        assert_eq!(x.len(), self.ncols, "vector length must match column count");
        (0..self.nrows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(x)
                    .filter(|(a, _)| !a.is_zero())
                    .fold(BigRational::zero(), |acc, (a, b)| acc + a * b)
            })
            .collect()
    }

    /// Product of the top-left `rows x x.len()` corner with a value vector.
    /// Zero coefficients never touch the corresponding value.
    pub fn mul_values_corner(&self, rows: usize, x: &[Value]) -> Vec<Value> {
        (0..rows)
            .map(|i| {
                let mut acc = Value::zero();
                for (a, v) in self.row(i).iter().zip(x) {
                    acc.add_scaled(a, v);
                }
                acc
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn r(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    #[test]
    fn test_matrix_basics() {
        let mut m = Matrix::from_vec2d(vec![vec![r(1), r(2)], vec![r(3), r(4)]]);
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 2);
        assert_eq!(m[[1, 0]], r(3));
        m.swap_rows(0, 1);
        assert_eq!(m.row(0), &[r(3), r(4)]);
        assert_eq!(Matrix::<BigRational>::eye(3).count_nonzero(), 3);
    }

    #[test]
    fn test_mul_vec() {
        let m = Matrix::from_vec2d(vec![vec![r(1), r(2)], vec![r(0), r(4)]]);
        assert_eq!(m.mul_vec(&[r(1), r(1)]), vec![r(3), r(4)]);
    }

    #[test]
    fn test_mul_values_corner_skips_zero_coefficients() {
        let m = Matrix::from_vec2d(vec![vec![r(2), r(0)], vec![r(1), r(1)]]);
        let x = vec![Value::from_integer(3), Value::Undefined];
        let y = m.mul_values_corner(2, &x);
        assert_eq!(y[0], Value::from_integer(6));
        assert!(y[1].is_undefined());
        assert_eq!(m.mul_values_corner(1, &x[..1]), vec![Value::from_integer(6)]);
    }
}
