//! Population-change vectors

use std::fmt;

/// How many jobs of each of the first `R - 1` classes are removed from the
/// target population. The class-`R` component is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopulationChangeVector {
    components: Vec<u32>,
}

impl PopulationChangeVector {
    /// Wrap explicit components.
    pub fn new(components: Vec<u32>) -> Self {
        Self { components }
    }

    /// The zero vector with `len` components.
    pub fn zeros(len: usize) -> Self {
        Self {
            components: vec![0; len],
        }
    }

    /// Unit vector `1_j` with `len` components.
    pub fn unit(len: usize, j: usize) -> Self {
        let mut v = Self::zeros(len);
        v.components[j] = 1;
        v
    }

    /// Number of components (`R - 1`).
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when there are no components (single-class models).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component `j`.
    pub fn get(&self, j: usize) -> u32 {
        self.components[j]
    }

    /// All components.
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// Total number of removed jobs.
    pub fn sum(&self) -> u32 {
        self.components.iter().sum()
    }

    /// True if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|&c| c == 0)
    }

    /// Number of nonzero components, `h(n)`.
    pub fn nonzero_count(&self) -> usize {
        self.components.iter().filter(|&&c| c > 0).count()
    }

    /// Positions of the nonzero components, ascending.
    pub fn support(&self) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(j, _)| j)
            .collect()
    }

    /// Position of the rightmost nonzero component.
    pub fn rightmost_nonzero(&self) -> Option<usize> {
        self.components.iter().rposition(|&c| c > 0)
    }

    /// True if no component at position `from` or beyond is nonzero.
    pub fn vanishes_from(&self, from: usize) -> bool {
        self.components.iter().skip(from).all(|&c| c == 0)
    }

    /// `self + 1_j`
    pub fn plus_one(&self, j: usize) -> Self {
        let mut v = self.clone();
        v.components[j] += 1;
        v
    }

    /// `self - 1_j`, or `None` if component `j` is already zero.
    pub fn minus_one(&self, j: usize) -> Option<Self> {
        if self.components[j] == 0 {
            return None;
        }
        let mut v = self.clone();
        v.components[j] -= 1;
        Some(v)
    }
}

impl fmt::Display for PopulationChangeVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (j, c) in self.components.iter().enumerate() {
            if j > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

/// Every vector of `len` components whose sum is at most `max_sum`,
/// in lexicographic order.
pub fn enumerate_vectors(len: usize, max_sum: u32) -> Vec<PopulationChangeVector> {
    fn fill(prefix: &mut Vec<u32>, len: usize, budget: u32, out: &mut Vec<PopulationChangeVector>) {
        if prefix.len() == len {
            out.push(PopulationChangeVector::new(prefix.clone()));
            return;
        }
        for c in 0..=budget {
            prefix.push(c);
            fill(prefix, len, budget - c, out);
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    fill(&mut Vec::with_capacity(len), len, max_sum, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinatorics::binomial;

    #[test]
    fn test_vector_queries() {
        let v = PopulationChangeVector::new(vec![0, 2, 0, 1]);
        assert_eq!(v.sum(), 3);
        assert_eq!(v.nonzero_count(), 2);
        assert_eq!(v.support(), vec![1, 3]);
        assert_eq!(v.rightmost_nonzero(), Some(3));
        assert!(!v.vanishes_from(3));
        assert!(v.vanishes_from(4));
        assert_eq!(v.plus_one(0).components(), &[1, 2, 0, 1]);
        assert_eq!(v.minus_one(1).unwrap().components(), &[0, 1, 0, 1]);
        assert!(v.minus_one(0).is_none());
        assert_eq!(v.to_string(), "(0, 2, 0, 1)");
    }

    #[test]
    fn test_enumerate_counts() {
        for len in 0..4 {
            for m in 0..5u32 {
                let vs = enumerate_vectors(len, m);
                assert_eq!(vs.len(), binomial(m as usize + len, m as usize));
                assert!(vs.iter().all(|v| v.sum() <= m && v.len() == len));
            }
        }
    }
}
