//! Gaussian elimination modulo one prime.

use crate::error::{ModularError, Result};
use crate::primes::{inv_mod, mul_mod, sub_mod};

/// Image of an integer system modulo one prime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueSystem {
    pub prime: u64,
    /// Row-major `n x n` coefficients
    pub a: Vec<u64>,
    pub b: Vec<u64>,
}

/// `det(A) mod p` and `det(A_j) mod p` for every column `j`, where `A_j`
/// is `A` with column `j` replaced by `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueSolution {
    pub prime: u64,
    pub det: u64,
    pub cramer: Vec<u64>,
}

impl ResidueSystem {
    pub fn order(&self) -> usize {
        self.b.len()
    }

    /// Eliminate with row swaps, tracking the determinant; the Cramer
    /// numerators follow from `det(A_j) = x_j * det(A)`.
    pub fn solve(mut self) -> Result<ResidueSolution> {
        let n = self.order();
        let p = self.prime;
        let mut det = 1 % p;

        for k in 0..n {
            let pivot_row = (k..n)
                .find(|&i| self.a[i * n + k] != 0)
                .ok_or(ModularError::SingularSystem { prime: p })?;
            if pivot_row != k {
                for j in 0..n {
                    self.a.swap(k * n + j, pivot_row * n + j);
                }
                self.b.swap(k, pivot_row);
                det = sub_mod(0, det, p);
            }
            let pivot = self.a[k * n + k];
            det = mul_mod(det, pivot, p);
            let inv = inv_mod(pivot, p);
            for j in k..n {
                self.a[k * n + j] = mul_mod(self.a[k * n + j], inv, p);
            }
            self.b[k] = mul_mod(self.b[k], inv, p);

            for i in 0..n {
                if i == k {
                    continue;
                }
                let factor = self.a[i * n + k];
                if factor == 0 {
                    continue;
                }
                for j in k..n {
                    let update = mul_mod(factor, self.a[k * n + j], p);
                    self.a[i * n + j] = sub_mod(self.a[i * n + j], update, p);
                }
                let update = mul_mod(factor, self.b[k], p);
                self.b[i] = sub_mod(self.b[i], update, p);
            }
        }

        let cramer = self.b.iter().map(|&x| mul_mod(x, det, p)).collect();
        Ok(ResidueSolution {
            prime: p,
            det,
            cramer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_by_two() {
        // [2 1; 1 3] x = [3; 5] -> det 5, x = (4/5, 7/5)
        let p = 101;
        let system = ResidueSystem {
            prime: p,
            a: vec![2, 1, 1, 3],
            b: vec![3, 5],
        };
        let sol = system.solve().unwrap();
        assert_eq!(sol.det, 5);
        assert_eq!(sol.cramer, vec![4, 7]);
    }

    #[test]
    fn test_swap_flips_determinant_sign() {
        let p = 13;
        let system = ResidueSystem {
            prime: p,
            a: vec![0, 1, 1, 0],
            b: vec![2, 3],
        };
        let sol = system.solve().unwrap();
        assert_eq!(sol.det, p - 1);
        // x = (3, 2); det(A_j) = -x_j
        assert_eq!(sol.cramer, vec![p - 3, p - 2]);
    }

    #[test]
    fn test_singular_residue() {
        let system = ResidueSystem {
            prime: 7,
            a: vec![1, 2, 2, 4],
            b: vec![0, 0],
        };
        assert!(matches!(
            system.solve(),
            Err(ModularError::SingularSystem { prime: 7 })
        ));
    }
}
