//! Canonical total orders over population-change vectors.
//!
//! All orders first group vectors by their number of nonzero components
//! `h`, and break the final tie by comparing component values left to
//! right. They differ in how they order supports of equal size.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::vector::PopulationChangeVector;

/// Total order used to enumerate a basis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorOrdering {
    /// `h`, then the vector whose support reaches further right is
    /// greater. Supports of equal size appear in colexicographic order,
    /// which keeps the vectors of every support contiguous.
    #[default]
    SupportColex,
    /// `h`, then the vector whose support starts further left is smaller.
    LeftmostNonzero,
    /// `h`, then the support read as a binary number, component 0 being
    /// the most significant bit.
    BinarySupport,
}

impl VectorOrdering {
    /// Compare two vectors of equal length.
    pub fn compare(&self, a: &PopulationChangeVector, b: &PopulationChangeVector) -> Ordering {
        a.len()
            .cmp(&b.len())
            .then_with(|| a.nonzero_count().cmp(&b.nonzero_count()))
            .then_with(|| match self {
                VectorOrdering::SupportColex => compare_rightmost_support(a, b),
                VectorOrdering::LeftmostNonzero => compare_leftmost_support(a, b),
                VectorOrdering::BinarySupport => support_bits(a).cmp(&support_bits(b)),
            })
            .then_with(|| a.components().cmp(b.components()))
    }

    /// True if this order keeps supports in colexicographic order.
    pub fn is_support_colex(&self) -> bool {
        matches!(self, VectorOrdering::SupportColex)
    }
}

fn compare_rightmost_support(a: &PopulationChangeVector, b: &PopulationChangeVector) -> Ordering {
    for j in (0..a.len()).rev() {
        match (a.get(j) > 0, b.get(j) > 0) {
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

fn compare_leftmost_support(a: &PopulationChangeVector, b: &PopulationChangeVector) -> Ordering {
    for j in 0..a.len() {
        match (a.get(j) > 0, b.get(j) > 0) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
    }
    Ordering::Equal
}

fn support_bits(v: &PopulationChangeVector) -> Vec<bool> {
    v.components().iter().map(|&c| c > 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(c: &[u32]) -> PopulationChangeVector {
        PopulationChangeVector::new(c.to_vec())
    }

    #[test]
    fn test_h_dominates() {
        for ord in [
            VectorOrdering::SupportColex,
            VectorOrdering::LeftmostNonzero,
            VectorOrdering::BinarySupport,
        ] {
            assert_eq!(ord.compare(&v(&[0, 0, 3]), &v(&[1, 1, 0])), Ordering::Less);
            assert_eq!(ord.compare(&v(&[2, 1]), &v(&[2, 1])), Ordering::Equal);
        }
    }

    #[test]
    fn test_support_colex() {
        let ord = VectorOrdering::SupportColex;
        // supports ending further left come first
        assert_eq!(ord.compare(&v(&[1, 1, 0]), &v(&[1, 0, 1])), Ordering::Less);
        assert_eq!(ord.compare(&v(&[0, 1, 1]), &v(&[1, 0, 1])), Ordering::Greater);
        // same support, values left to right
        assert_eq!(ord.compare(&v(&[1, 2, 0]), &v(&[2, 1, 0])), Ordering::Less);
    }

    #[test]
    fn test_leftmost_nonzero() {
        let ord = VectorOrdering::LeftmostNonzero;
        assert_eq!(ord.compare(&v(&[1, 0, 1]), &v(&[0, 1, 1])), Ordering::Less);
        assert_eq!(ord.compare(&v(&[0, 1, 1]), &v(&[1, 1, 0])), Ordering::Greater);
    }

    #[test]
    fn test_binary_support() {
        let ord = VectorOrdering::BinarySupport;
        // 011 < 101 < 110
        assert_eq!(ord.compare(&v(&[0, 1, 1]), &v(&[1, 0, 1])), Ordering::Less);
        assert_eq!(ord.compare(&v(&[1, 0, 1]), &v(&[1, 1, 0])), Ordering::Less);
    }
}
