//! Binomial coefficients and factorials

use num_bigint::BigInt;
use num_traits::One;

/// `C(n, k)`, defined as zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc as usize
}

/// `C(n, k)` for a possibly negative `k`; zero outside `0..=n`.
pub fn binomial_signed(n: usize, k: isize) -> usize {
    if k < 0 {
        0
    } else {
        binomial(n, k as usize)
    }
}

/// Number of population-change vectors with `components` entries and sum at most `max_sum`.
pub fn vector_count(components: usize, max_sum: usize) -> usize {
    binomial(max_sum + components, max_sum)
}

/// `n!` as an exact integer.
pub fn factorial(n: u32) -> BigInt {
    (1..=n).fold(BigInt::one(), |acc, i| acc * BigInt::from(i))
}

/// All `k`-subsets of `0..n` in colexicographic order.
pub fn colex_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::with_capacity(binomial(n, k));
    if k > n {
        return out;
    }
    let mut subset: Vec<usize> = (0..k).collect();
    loop {
        out.push(subset.clone());
        // advance the lowest element that can move up
        let mut i = 0;
        while i < k {
            let limit = if i + 1 < k { subset[i + 1] } else { n };
            if subset[i] + 1 < limit {
                break;
            }
            i += 1;
        }
        if i == k {
            return out;
        }
        subset[i] += 1;
        for (j, slot) in subset.iter_mut().enumerate().take(i) {
            *slot = j;
        }
    }
}
