//! Assembly of the master block structure.
//!
//! The master is built once for the full class count, with the last class
//! in the role of the class being added. Class views later select from it.
//! Every structural mismatch (a row routed outside every block, a diagonal
//! leaf over- or under-filled) is reported as [`BtfError::Structure`].
//!
//! [`BtfError::Structure`]: crate::error::BtfError::Structure

use std::ops::Range;

use comom_core::{BtfIndexer, Indexer, Matrix, QnModel};
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::debug;

use crate::block::{
    BlockArena, BlockKind, CarryForwardBlock, DiagonalBlock, Leaf, LeafId, ScaledCopyBlock,
    ScaledRow, ScaledTerm, Span, Weight,
};
use crate::error::{structure, Result};
use crate::hierarchy::{Quadrant, TopLevelBlock};
use crate::lup::LupOptions;
use crate::pattern::{Pattern, PatternLayout};

/// The leaf arena and the five quadrants over it.
#[derive(Debug, Clone)]
pub struct MasterStructure {
    pub arena: BlockArena,
    pub x: TopLevelBlock,
    pub y: TopLevelBlock,
    pub b1: TopLevelBlock,
    pub b2: TopLevelBlock,
    pub c: TopLevelBlock,
    classes: usize,
    stations: usize,
}

impl MasterStructure {
    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn stations(&self) -> usize {
        self.stations
    }

    /// Leaf of pattern `index` of group `h` in `block`.
    pub fn leaf_id(block: &TopLevelBlock, h: usize, index: usize) -> Result<LeafId> {
        let m = block.macro_for(h)?;
        let id = m.leaves.start + index;
        if !m.leaves.contains(&id) {
            return Err(structure(format!(
                "{:?} macro h = {} has no pattern {}",
                block.quadrant, h, index
            )));
        }
        Ok(id)
    }
}

/// Row range of a pattern in the X region.
fn x_rows(indexer: &BtfIndexer, pattern: &Pattern) -> Range<usize> {
    let m = indexer.basis().stations();
    let start = indexer.x_index(pattern.first, 1);
    start..start + pattern.len * m
}

fn y_cols(indexer: &BtfIndexer, pattern: &Pattern) -> Range<usize> {
    let start = indexer.y_index(pattern.first);
    start..start + pattern.len
}

/// Union of consecutive ranges.
fn group_range(ranges: impl Iterator<Item = Range<usize>>) -> Range<usize> {
    let mut start = usize::MAX;
    let mut end = 0;
    for r in ranges {
        start = start.min(r.start);
        end = end.max(r.end);
    }
    if start > end {
        0..0
    } else {
        start..end
    }
}

fn span_of(rows: Range<usize>, cols: Range<usize>) -> Span {
    Span::new(rows.start, cols.start, rows.len(), cols.len())
}

/// Push one leaf per pattern of every group and register the macro blocks.
fn push_pattern_leaves(
    arena: &mut BlockArena,
    top: &mut TopLevelBlock,
    layout: &PatternLayout,
    min_h: usize,
    mut make: impl FnMut(&Pattern) -> (Span, BlockKind),
) -> Result<()> {
    for (h, group) in layout.groups().iter().enumerate().skip(min_h) {
        let start = arena.len();
        for (index, pattern) in group.iter().enumerate() {
            let (span, kind) = make(pattern);
            arena.push(Leaf {
                span,
                h,
                pattern: index,
                kind,
            });
        }
        top.push_macro(arena, h, start..arena.len())?;
    }
    Ok(())
}

/// Allocate every leaf and fill the coefficients of the system for
/// `model`, then factor the X diagonal leaves.
pub fn assemble(
    model: &QnModel,
    indexer: &BtfIndexer,
    layout: &PatternLayout,
    options: &LupOptions,
) -> Result<MasterStructure> {
    let basis = indexer.basis();
    let stations = basis.stations();
    let components = basis.components();
    let max_population = stations as u32;

    let mut arena = BlockArena::new();
    let mut x = TopLevelBlock::new(Quadrant::X);
    let mut y = TopLevelBlock::new(Quadrant::Y);
    let mut b1 = TopLevelBlock::new(Quadrant::B1);
    let mut b2 = TopLevelBlock::new(Quadrant::B2);
    let mut c = TopLevelBlock::new(Quadrant::C);

    push_pattern_leaves(&mut arena, &mut x, layout, 0, |p| {
        let rows = x_rows(indexer, p);
        let order = rows.len();
        (span_of(rows.clone(), rows), BlockKind::Diagonal(DiagonalBlock::new(order)))
    })?;
    for h in 0..layout.max_h() {
        let rows = group_range(layout.group(h).iter().map(|p| x_rows(indexer, p)));
        let cols = group_range(layout.group(h + 1).iter().map(|p| x_rows(indexer, p)));
        let leaf = arena.push(Leaf {
            span: span_of(rows.clone(), cols.clone()),
            h,
            pattern: 0,
            kind: BlockKind::Coupling(Matrix::zeros(rows.len(), cols.len())),
        });
        x.push_secondary(&arena, h, h + 1, leaf)?;
    }

    push_pattern_leaves(&mut arena, &mut y, layout, 0, |p| {
        let (rows, cols) = (x_rows(indexer, p), y_cols(indexer, p));
        let matrix = Matrix::zeros(rows.len(), cols.len());
        (span_of(rows, cols), BlockKind::Coupling(matrix))
    })?;
    for h in 1..=layout.max_h() {
        let rows = group_range(layout.group(h).iter().map(|p| x_rows(indexer, p)));
        let cols = group_range(layout.group(h - 1).iter().map(|p| y_cols(indexer, p)));
        let leaf = arena.push(Leaf {
            span: span_of(rows.clone(), cols.clone()),
            h,
            pattern: 0,
            kind: BlockKind::Coupling(Matrix::zeros(rows.len(), cols.len())),
        });
        y.push_secondary(&arena, h, h - 1, leaf)?;
    }

    push_pattern_leaves(&mut arena, &mut b1, layout, 0, |p| {
        let rows = x_rows(indexer, p);
        let kind = BlockKind::ScaledCopy(ScaledCopyBlock {
            rows: Vec::new(),
            per_population: false,
        });
        (span_of(rows.clone(), rows), kind)
    })?;

    push_pattern_leaves(&mut arena, &mut b2, layout, 0, |p| {
        let ys = y_cols(indexer, p);
        let rows = p
            .positions()
            .map(|pos| {
                let mut terms = vec![ScaledTerm {
                    source: indexer.y_index(pos),
                    weight: Weight::ThinkTime,
                }];
                terms.extend((1..=stations).map(|k| ScaledTerm {
                    source: indexer.x_index(pos, k),
                    weight: Weight::ReplicatedDemand { station: k - 1 },
                }));
                ScaledRow {
                    dest: indexer.y_index(pos),
                    terms,
                }
            })
            .collect();
        let kind = BlockKind::ScaledCopy(ScaledCopyBlock {
            rows,
            per_population: true,
        });
        (span_of(ys.clone(), ys), kind)
    })?;

    let mut carry_error = None;
    push_pattern_leaves(&mut arena, &mut c, layout, 1, |p| {
        let rows = x_rows(indexer, p);
        let mut pairs = Vec::with_capacity(p.len * (stations + 1));
        if let Some(top) = p.max_class() {
            for pos in p.positions() {
                let source = basis.vector(pos).minus_one(top).map(|v| basis.position_of(&v));
                match source {
                    Some(Ok(src)) => pairs.extend(
                        (0..=stations).map(|q| {
                            (indexer.index_from_position(src, q), indexer.index_from_position(pos, q))
                        }),
                    ),
                    _ => carry_error = Some(pos),
                }
            }
        }
        let kind = BlockKind::CarryForward(CarryForwardBlock { pairs });
        (span_of(rows.clone(), rows), kind)
    })?;
    if let Some(pos) = carry_error {
        return Err(structure(format!("no carry source for vector {}", basis.vector(pos))));
    }

    let one = BigRational::one();
    let minus_one = -BigRational::one();
    for pos in 0..basis.len() {
        let n = basis.vector(pos);
        let (h, index) = layout.locate(n)?;
        let x_leaf = MasterStructure::leaf_id(&x, h, index)?;

        if n.sum() < max_population {
            let b1_leaf = MasterStructure::leaf_id(&b1, h, index)?;
            for k in 1..=stations {
                let row = arena.claim_row(x_leaf)?;
                x.add(&mut arena, row, indexer.x_index(pos, k), &one)?;
                for s in 0..components {
                    let demand = model.demand(k - 1, s);
                    if demand.is_zero() {
                        continue;
                    }
                    let next = basis.position_of(&n.plus_one(s))?;
                    x.add(&mut arena, row, indexer.x_index(next, k), &-demand)?;
                }
                y.add(&mut arena, row, indexer.y_index(pos), &minus_one)?;
                push_scaled_row(
                    &mut arena,
                    b1_leaf,
                    ScaledRow {
                        dest: row,
                        terms: vec![ScaledTerm {
                            source: indexer.x_index(pos, k),
                            weight: Weight::Demand { station: k - 1 },
                        }],
                    },
                )?;
            }
        }

        for s in 0..components {
            let next = n.plus_one(s);
            if next.sum() > max_population {
                continue;
            }
            let next_pos = basis.position_of(&next)?;
            let (next_h, next_index) = layout.locate(&next)?;
            let leaf = MasterStructure::leaf_id(&x, next_h, next_index)?;
            let row = arena.claim_row(leaf)?;
            for k in 1..=stations {
                let coeff = model.replicated_demand(k - 1, s);
                if !coeff.is_zero() {
                    x.add(&mut arena, row, indexer.x_index(next_pos, k), &coeff)?;
                }
            }
            let think = model.think_time(s);
            if !think.is_zero() {
                y.add(&mut arena, row, indexer.y_index(next_pos), think)?;
            }
            let remaining = i64::from(model.population(s)) - i64::from(n.get(s));
            if remaining != 0 {
                let coeff = -BigRational::from_integer(remaining.into());
                y.add(&mut arena, row, indexer.y_index(pos), &coeff)?;
            }
        }
    }

    for top in [&x, &y, &b1, &b2, &c] {
        top.check_partitions(&arena)?;
    }
    let factored = arena.factor_diagonals(options)?;
    debug!(
        leaves = arena.len(),
        factored,
        patterns = layout.len(),
        "assembled master structure"
    );

    Ok(MasterStructure {
        arena,
        x,
        y,
        b1,
        b2,
        c,
        classes: basis.classes(),
        stations,
    })
}

fn push_scaled_row(arena: &mut BlockArena, leaf: LeafId, row: ScaledRow) -> Result<()> {
    let target = arena.get_mut(leaf);
    if !target.span.row_range().contains(&row.dest) {
        return Err(structure(format!("row {} lies outside its B1 leaf", row.dest)));
    }
    match &mut target.kind {
        BlockKind::ScaledCopy(block) => {
            block.rows.push(row);
            Ok(())
        }
        _ => Err(structure("B1 leaves hold scaled copies")),
    }
}
