//! Macro, secondary and top-level blocks over the leaf arena.
//!
//! A top-level block is one quadrant of the system. It groups its leaves
//! into one macro block per `h` (a contiguous range of leaf ids) and keeps
//! the couplings between adjacent macro groups in secondary blocks. Rows
//! are routed to leaves by binary search over the leaf row offsets.

use std::ops::Range;

use num_rational::BigRational;

use crate::block::{BlockArena, LeafId, Span};
use crate::error::{structure, Result};
use crate::partition::BlockPartition;

/// The five quadrants of the assembled system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Unknown `queue >= 1` entries
    X,
    /// Couplings of X rows to `queue == 0` entries
    Y,
    /// Right-hand side of CE rows from the previous step
    B1,
    /// `queue == 0` entries from the previous step
    B2,
    /// Entries of carried patterns
    C,
}

/// All leaves of one `h` inside a quadrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBlock {
    pub h: usize,
    pub span: Span,
    pub leaves: Range<LeafId>,
    /// Row extents of the leaves, relative to `span.row`
    pub rows: BlockPartition,
}

impl MacroBlock {
    /// Leaf owning absolute `row`.
    pub fn leaf_of_row(&self, row: usize) -> Option<LeafId> {
        let local = row.checked_sub(self.span.row)?;
        self.rows.block_of(local).map(|i| self.leaves.start + i)
    }
}

/// Coupling between macro groups `row_h` and `col_h`, stored as one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryBlock {
    pub row_h: usize,
    pub col_h: usize,
    pub leaf: LeafId,
    /// Row extents of the leaves of the row macro block
    pub rows: BlockPartition,
    /// Column extents of the leaves of the column macro block
    pub cols: BlockPartition,
}

/// One quadrant: macro blocks by ascending `h` plus secondaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelBlock {
    pub quadrant: Quadrant,
    pub macros: Vec<MacroBlock>,
    pub secondaries: Vec<SecondaryBlock>,
}

impl TopLevelBlock {
    pub fn new(quadrant: Quadrant) -> Self {
        Self {
            quadrant,
            macros: Vec::new(),
            secondaries: Vec::new(),
        }
    }

    /// Register the leaves `leaves` (already in the arena, contiguous ids,
    /// ascending rows) as macro group `h`.
    pub fn push_macro(&mut self, arena: &BlockArena, h: usize, leaves: Range<LeafId>) -> Result<()> {
        let spans: Vec<Span> = leaves.clone().map(|id| arena.get(id).span).collect();
        let (first, last) = match (spans.first(), spans.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Err(structure(format!("{:?} macro h = {} has no leaves", self.quadrant, h))),
        };
        for pair in spans.windows(2) {
            if pair[0].row + pair[0].rows != pair[1].row {
                return Err(structure(format!(
                    "{:?} macro h = {}: leaf rows are not consecutive",
                    self.quadrant, h
                )));
            }
        }
        let rows = last.row + last.rows - first.row;
        let cols = (last.col + last.cols).saturating_sub(first.col);
        self.macros.push(MacroBlock {
            h,
            span: Span::new(first.row, first.col, rows, cols),
            leaves,
            rows: BlockPartition::new(spans.iter().map(|s| s.rows).collect()),
        });
        Ok(())
    }

    /// Register a secondary coupling leaf between two existing macro groups.
    pub fn push_secondary(&mut self, arena: &BlockArena, row_h: usize, col_h: usize, leaf: LeafId) -> Result<()> {
        let row_macro = self.macro_for(row_h)?;
        let col_macro = self.macro_for(col_h)?;
        let rows = row_macro.rows.clone();
        let cols = BlockPartition::new(
            col_macro
                .leaves
                .clone()
                .map(|id| arena.get(id).span.cols)
                .collect(),
        );
        let span = arena.get(leaf).span;
        if span.rows != rows.total_dim() || span.cols != cols.total_dim() {
            return Err(structure(format!(
                "{:?} secondary {} -> {} does not match its macro groups",
                self.quadrant, row_h, col_h
            )));
        }
        self.secondaries.push(SecondaryBlock {
            row_h,
            col_h,
            leaf,
            rows,
            cols,
        });
        Ok(())
    }

    /// Macro block of group `h`.
    pub fn macro_for(&self, h: usize) -> Result<&MacroBlock> {
        self.macros
            .iter()
            .find(|m| m.h == h)
            .ok_or_else(|| structure(format!("{:?} has no macro block h = {}", self.quadrant, h)))
    }

    /// Macro block whose rows contain absolute `row`.
    pub fn macro_of_row(&self, row: usize) -> Option<&MacroBlock> {
        self.macros.iter().find(|m| m.span.row_range().contains(&row))
    }

    /// Add `coeff` at absolute `(row, col)`: into the owning leaf when its
    /// columns contain `col`, otherwise into the secondary of the row's
    /// macro group that covers `col`.
    pub fn add(&self, arena: &mut BlockArena, row: usize, col: usize, coeff: &BigRational) -> Result<()> {
        let owner = self
            .macro_of_row(row)
            .ok_or_else(|| structure(format!("{:?}: no macro block owns row {}", self.quadrant, row)))?;
        let leaf = owner
            .leaf_of_row(row)
            .ok_or_else(|| structure(format!("{:?}: no leaf owns row {}", self.quadrant, row)))?;
        if arena.get(leaf).span.col_range().contains(&col) {
            return arena.get_mut(leaf).add(row, col, coeff);
        }
        let secondary = self
            .secondaries
            .iter()
            .filter(|s| s.row_h == owner.h)
            .find(|s| arena.get(s.leaf).span.contains(row, col))
            .ok_or_else(|| {
                structure(format!(
                    "{:?}: ({}, {}) is outside every block of row group h = {}",
                    self.quadrant, row, col, owner.h
                ))
            })?;
        arena.get_mut(secondary.leaf).add(row, col, coeff)
    }

    /// Check that the macro blocks tile the leaves in ascending `h` order
    /// and that every secondary couples adjacent groups.
    pub fn check_partitions(&self, arena: &BlockArena) -> Result<()> {
        for pair in self.macros.windows(2) {
            if pair[0].h >= pair[1].h || pair[0].leaves.end != pair[1].leaves.start {
                return Err(structure(format!("{:?}: macro blocks out of order", self.quadrant)));
            }
        }
        for m in &self.macros {
            if m.rows.num_blocks() != m.leaves.len() || m.rows.total_dim() != m.span.rows {
                return Err(structure(format!(
                    "{:?} macro h = {}: partition does not cover its leaves",
                    self.quadrant, m.h
                )));
            }
            if m.leaves.clone().any(|id| arena.get(id).h != m.h) {
                return Err(structure(format!(
                    "{:?} macro h = {} holds a leaf of another group",
                    self.quadrant, m.h
                )));
            }
        }
        for s in &self.secondaries {
            if s.row_h.abs_diff(s.col_h) != 1 {
                return Err(structure(format!(
                    "{:?}: secondary {} -> {} does not couple adjacent groups",
                    self.quadrant, s.row_h, s.col_h
                )));
            }
        }
        Ok(())
    }

    /// Number of leaves owned by macro blocks.
    pub fn leaf_count(&self) -> usize {
        self.macros.iter().map(|m| m.leaves.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, DiagonalBlock, Leaf};
    use comom_core::value::integer;
    use comom_core::Matrix;

    fn diagonal(arena: &mut BlockArena, span: Span, h: usize, pattern: usize) -> LeafId {
        arena.push(Leaf {
            span,
            h,
            pattern,
            kind: BlockKind::Diagonal(DiagonalBlock::new(span.rows)),
        })
    }

    fn two_groups() -> (BlockArena, TopLevelBlock) {
        let mut arena = BlockArena::new();
        let a = diagonal(&mut arena, Span::new(0, 0, 2, 2), 0, 0);
        let b = diagonal(&mut arena, Span::new(2, 2, 1, 1), 1, 0);
        let c = diagonal(&mut arena, Span::new(3, 3, 1, 1), 1, 1);
        let mut top = TopLevelBlock::new(Quadrant::X);
        top.push_macro(&arena, 0, a..a + 1).unwrap();
        top.push_macro(&arena, 1, b..c + 1).unwrap();
        let sec = arena.push(Leaf {
            span: Span::new(0, 2, 2, 2),
            h: 0,
            pattern: 0,
            kind: BlockKind::Coupling(Matrix::zeros(2, 2)),
        });
        top.push_secondary(&arena, 0, 1, sec).unwrap();
        (arena, top)
    }

    #[test]
    fn test_routing_to_leaf_and_secondary() {
        let (mut arena, top) = two_groups();
        top.check_partitions(&arena).unwrap();
        assert_eq!(top.leaf_count(), 3);
        top.add(&mut arena, 3, 3, &integer(5)).unwrap();
        top.add(&mut arena, 1, 3, &integer(-2)).unwrap();
        assert_eq!(arena.get(2).matrix().unwrap()[[0, 0]], integer(5));
        assert_eq!(arena.get(3).matrix().unwrap()[[1, 1]], integer(-2));
    }

    #[test]
    fn test_routing_errors() {
        let (mut arena, top) = two_groups();
        // no secondary from h = 1 back to h = 0
        assert!(top.add(&mut arena, 2, 0, &integer(1)).is_err());
        assert!(top.add(&mut arena, 9, 0, &integer(1)).is_err());
    }

    #[test]
    fn test_macro_rows_must_be_consecutive() {
        let mut arena = BlockArena::new();
        let a = diagonal(&mut arena, Span::new(0, 0, 1, 1), 1, 0);
        diagonal(&mut arena, Span::new(2, 2, 1, 1), 1, 1);
        let mut top = TopLevelBlock::new(Quadrant::X);
        assert!(top.push_macro(&arena, 1, a..a + 2).is_err());
    }
}
