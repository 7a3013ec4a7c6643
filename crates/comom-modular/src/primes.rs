//! Word-sized prime moduli and arithmetic modulo them.
//!
//! Primes are drawn at random from `[2^(bits-1), 2^bits)` by a seeded
//! generator, so a run is reproducible for a given seed. Primality is
//! decided by Miller-Rabin with the first twelve prime bases, which is
//! deterministic for every 64-bit integer.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{ModularError, Result};

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// `a * b mod p`
#[inline]
pub fn mul_mod(a: u64, b: u64, p: u64) -> u64 {
    ((a as u128 * b as u128) % p as u128) as u64
}

/// `a + b mod p` for reduced operands
#[inline]
pub fn add_mod(a: u64, b: u64, p: u64) -> u64 {
    let s = a as u128 + b as u128;
    (s % p as u128) as u64
}

/// `a - b mod p` for reduced operands
#[inline]
pub fn sub_mod(a: u64, b: u64, p: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        p - (b - a)
    }
}

/// `base^exp mod p`
pub fn pow_mod(mut base: u64, mut exp: u64, p: u64) -> u64 {
    let mut acc = 1 % p;
    base %= p;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, p);
        }
        base = mul_mod(base, base, p);
        exp >>= 1;
    }
    acc
}

/// Inverse of a nonzero `a` modulo the prime `p`.
pub fn inv_mod(a: u64, p: u64) -> u64 {
    pow_mod(a, p - 2, p)
}

/// Deterministic primality test for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &w in &WITNESSES {
        if n % w == 0 {
            return n == w;
        }
    }
    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }
    'witness: for &a in &WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Reproducible supply of distinct random primes of a fixed bit length.
#[derive(Debug, Clone)]
pub struct PrimeSource {
    rng: ChaCha8Rng,
    bits: u32,
    primes: Vec<u64>,
}

impl PrimeSource {
    /// `bits` must lie in `8..=63` so that sums of two residues fit a `u64`.
    pub fn new(bits: u32, seed: u64) -> Result<Self> {
        if !(8..=63).contains(&bits) {
            return Err(ModularError::InvalidOptions {
                message: format!("prime bit length {} outside 8..=63", bits),
            });
        }
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            bits,
            primes: Vec::new(),
        })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The first `count` primes of the sequence, drawing more as needed.
    pub fn take(&mut self, count: usize) -> &[u64] {
        let low = 1u64 << (self.bits - 1);
        let high = 1u64 << self.bits;
        while self.primes.len() < count {
            let candidate = self.rng.random_range(low..high) | 1;
            if is_prime(candidate) && !self.primes.contains(&candidate) {
                self.primes.push(candidate);
            }
        }
        &self.primes[..count]
    }
}
