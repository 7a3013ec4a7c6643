//! Support patterns of a block-triangular basis.
//!
//! A pattern is the set of vectors sharing one support `S`; with `|S| = h`
//! it holds `C(M, h)` vectors. Under [`VectorOrdering::SupportColex`] each
//! pattern occupies a contiguous run of canonical positions and the
//! patterns of each `h` appear in colexicographic order of their supports.

use std::collections::HashMap;
use std::ops::Range;

use comom_core::combinatorics::colex_subsets;
use comom_core::{binomial, Basis, PopulationChangeVector, VectorOrdering};

use crate::error::{structure, BtfError, Result};

/// One support pattern and where its vectors sit in the basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Nonzero positions, ascending
    pub support: Vec<usize>,
    /// Canonical position of the first vector
    pub first: usize,
    /// Number of vectors, `C(M, h)`
    pub len: usize,
}

impl Pattern {
    /// Number of nonzero components.
    pub fn h(&self) -> usize {
        self.support.len()
    }

    /// Canonical positions of the pattern's vectors.
    pub fn positions(&self) -> Range<usize> {
        self.first..self.first + self.len
    }

    /// Largest class in the support.
    pub fn max_class(&self) -> Option<usize> {
        self.support.last().copied()
    }
}

/// All patterns of a basis, grouped by `h`.
#[derive(Debug, Clone)]
pub struct PatternLayout {
    groups: Vec<Vec<Pattern>>,
    lookup: HashMap<Vec<usize>, (usize, usize)>,
}

impl PatternLayout {
    /// Group the basis vectors into patterns, checking the layout the block
    /// structure relies on.
    pub fn new(basis: &Basis) -> Result<Self> {
        if basis.ordering() != VectorOrdering::SupportColex {
            return Err(BtfError::UnsupportedOrdering {
                ordering: format!("{:?}", basis.ordering()),
            });
        }
        let components = basis.components();
        let stations = basis.stations();
        let max_h = components.min(stations);

        let mut groups: Vec<Vec<Pattern>> = vec![Vec::new(); max_h + 1];
        let mut lookup = HashMap::new();
        let mut position = 0;
        while position < basis.len() {
            let support = basis.vector(position).support();
            let start = position;
            while position < basis.len() && basis.vector(position).support() == support {
                position += 1;
            }
            let h = support.len();
            let index = groups[h].len();
            if lookup.insert(support.clone(), (h, index)).is_some() {
                return Err(structure(format!("support {:?} is not contiguous", support)));
            }
            groups[h].push(Pattern {
                support,
                first: start,
                len: position - start,
            });
        }

        for (h, group) in groups.iter().enumerate() {
            let expected = colex_subsets(components, h);
            if group.len() != expected.len()
                || group.iter().zip(&expected).any(|(p, s)| &p.support != s)
            {
                return Err(structure(format!("patterns of h = {} are not in colex order", h)));
            }
            if group.iter().any(|p| p.len != binomial(stations, h)) {
                return Err(structure(format!("a pattern of h = {} has the wrong size", h)));
            }
        }
        Ok(Self { groups, lookup })
    }

    /// Largest `h`, `min(R - 1, M)`.
    pub fn max_h(&self) -> usize {
        self.groups.len() - 1
    }

    /// Patterns of one `h`, in order.
    pub fn group(&self, h: usize) -> &[Pattern] {
        &self.groups[h]
    }

    /// All groups, by ascending `h`.
    pub fn groups(&self) -> &[Vec<Pattern>] {
        &self.groups
    }

    /// Pattern `index` of group `h`.
    pub fn pattern(&self, h: usize, index: usize) -> &Pattern {
        &self.groups[h][index]
    }

    /// `(h, index)` of the pattern containing `n`.
    pub fn locate(&self, n: &PopulationChangeVector) -> Result<(usize, usize)> {
        self.lookup
            .get(&n.support())
            .copied()
            .ok_or_else(|| structure(format!("no pattern for vector {}", n)))
    }

    /// Total number of patterns.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Always false: the empty support is a pattern of every basis.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        let basis = Basis::generate(4, 2, VectorOrdering::SupportColex).unwrap();
        let layout = PatternLayout::new(&basis).unwrap();
        assert_eq!(layout.max_h(), 2);
        assert_eq!(layout.group(0).len(), 1);
        assert_eq!(layout.group(1).len(), 3);
        assert_eq!(layout.group(2).len(), 3);
        assert_eq!(layout.group(1)[0].len, 2);
        assert_eq!(layout.group(2)[0].len, 1);
        let total: usize = layout.groups().iter().flatten().map(|p| p.len).sum();
        assert_eq!(total, basis.len());
    }

    #[test]
    fn test_layout_positions_are_contiguous() {
        let basis = Basis::generate(4, 3, VectorOrdering::SupportColex).unwrap();
        let layout = PatternLayout::new(&basis).unwrap();
        let mut next = 0;
        for p in layout.groups().iter().flatten() {
            assert_eq!(p.first, next);
            for pos in p.positions() {
                assert_eq!(basis.vector(pos).support(), p.support);
            }
            next += p.len;
        }
        let v = PopulationChangeVector::new(vec![1, 0, 2]);
        let (h, i) = layout.locate(&v).unwrap();
        assert_eq!(layout.pattern(h, i).support, vec![0, 2]);
        assert_eq!(layout.pattern(h, i).max_class(), Some(2));
    }

    #[test]
    fn test_other_orderings_rejected() {
        let basis = Basis::generate(3, 2, VectorOrdering::LeftmostNonzero).unwrap();
        assert!(matches!(
            PatternLayout::new(&basis),
            Err(BtfError::UnsupportedOrdering { .. })
        ));
    }
}
