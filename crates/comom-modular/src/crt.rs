//! Chinese remainder reconstruction to symmetric residues.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::primes::inv_mod;

/// Product of a set of primes with precomputed `M_i * (M_i^{-1} mod p_i)`
/// coefficients, `M_i = M / p_i`.
#[derive(Debug, Clone)]
pub struct CrtBasis {
    primes: Vec<u64>,
    modulus: BigInt,
    half: BigInt,
    coefficients: Vec<BigInt>,
}

impl CrtBasis {
    pub fn new(primes: &[u64]) -> Self {
        let modulus = primes
            .iter()
            .fold(BigInt::one(), |acc, &p| acc * BigInt::from(p));
        let coefficients = primes
            .iter()
            .map(|&p| {
                let partial = &modulus / BigInt::from(p);
                let reduced = partial
                    .mod_floor(&BigInt::from(p))
                    .to_u64()
                    .unwrap_or_default();
                partial * BigInt::from(inv_mod(reduced, p))
            })
            .collect();
        let half = &modulus >> 1;
        Self {
            primes: primes.to_vec(),
            modulus,
            half,
            coefficients,
        }
    }

    pub fn primes(&self) -> &[u64] {
        &self.primes
    }

    /// Product of all primes.
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// The integer in `(-M/2, M/2]` with the given residues.
    pub fn reconstruct(&self, residues: &[u64]) -> BigInt {
        let sum = residues
            .iter()
            .zip(&self.coefficients)
            .fold(BigInt::zero(), |acc, (&r, c)| acc + c * BigInt::from(r));
        let value = sum.mod_floor(&self.modulus);
        if value > self.half {
            value - &self.modulus
        } else {
            value
        }
    }
}

/// Reduce an integer into `[0, p)`.
pub fn reduce(value: &BigInt, p: u64) -> u64 {
    value
        .mod_floor(&BigInt::from(p))
        .to_u64()
        .unwrap_or_default()
}
