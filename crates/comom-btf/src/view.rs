//! Per-class views of the master structure.
//!
//! A view never copies coefficients: it is a set of leaf-id ranges and
//! corner extents into the master, derived in time linear in the number of
//! macro blocks. Deriving twice for the same class gives equal views.

use std::ops::Range;

use tracing::trace;

use crate::block::LeafId;
use crate::hierarchy::{Quadrant, TopLevelBlock};
use crate::selection::{carried_range, carry_groups, live_groups, live_leaves};

/// Leaves of one macro group that take part in a class solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroView {
    pub h: usize,
    pub leaves: Range<LeafId>,
    /// Row extent covered by the selected leaves
    pub rows: usize,
}

/// Retained top-left corner of a secondary block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryView {
    pub row_h: usize,
    pub col_h: usize,
    pub leaf: LeafId,
    pub rows: usize,
    pub cols: usize,
}

/// The selected part of one quadrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLevelView {
    pub quadrant: Quadrant,
    pub macros: Vec<MacroView>,
    pub secondaries: Vec<SecondaryView>,
}

impl TopLevelView {
    /// Live leaves of every live group; secondaries cut to the live corner.
    fn live(block: &TopLevelBlock, class: usize, stations: usize) -> Self {
        let groups = live_groups(class, stations);
        let mut macros = Vec::new();
        for m in &block.macros {
            if !groups.contains(&m.h) {
                continue;
            }
            let count = live_leaves(m.h, class).min(m.leaves.len());
            if count == 0 {
                continue;
            }
            macros.push(MacroView {
                h: m.h,
                leaves: m.leaves.start..m.leaves.start + count,
                rows: m.rows.prefix_dim(count),
            });
        }
        let mut secondaries = Vec::new();
        for s in &block.secondaries {
            let rows = s.rows.prefix_dim(live_leaves(s.row_h, class));
            let cols = s.cols.prefix_dim(live_leaves(s.col_h, class));
            if rows == 0 || cols == 0 {
                continue;
            }
            secondaries.push(SecondaryView {
                row_h: s.row_h,
                col_h: s.col_h,
                leaf: s.leaf,
                rows,
                cols,
            });
        }
        Self {
            quadrant: block.quadrant,
            macros,
            secondaries,
        }
    }

    /// Carried leaves of every carry group.
    fn carried(block: &TopLevelBlock, class: usize, classes: usize, stations: usize) -> Self {
        let mut macros = Vec::new();
        if let Some(groups) = carry_groups(class, classes, stations) {
            for m in block.macros.iter().filter(|m| groups.contains(&m.h)) {
                let range = carried_range(m.h, class, classes);
                let end = range.end.min(m.leaves.len());
                if range.start >= end {
                    continue;
                }
                macros.push(MacroView {
                    h: m.h,
                    leaves: m.leaves.start + range.start..m.leaves.start + end,
                    rows: m.rows.prefix_dim(end) - m.rows.prefix_dim(range.start),
                });
            }
        }
        Self {
            quadrant: block.quadrant,
            macros,
            secondaries: Vec::new(),
        }
    }

    /// Every selected leaf, by ascending `h`.
    pub fn leaves(&self) -> impl Iterator<Item = LeafId> + '_ {
        self.macros.iter().flat_map(|m| m.leaves.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

/// Everything a solve of one class step reads from the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassView {
    /// Class being added, `1..=R`
    pub class: usize,
    pub x: TopLevelView,
    pub y: TopLevelView,
    pub b1: TopLevelView,
    pub b2: TopLevelView,
    pub c: TopLevelView,
}

impl ClassView {
    /// Select the live and carried parts of the master quadrants for
    /// `class`.
    pub fn derive(master: &crate::assembly::MasterStructure, class: usize) -> Self {
        let stations = master.stations();
        let classes = master.classes();
        let view = Self {
            class,
            x: TopLevelView::live(&master.x, class, stations),
            y: TopLevelView::live(&master.y, class, stations),
            b1: TopLevelView::live(&master.b1, class, stations),
            b2: TopLevelView::live(&master.b2, class, stations),
            c: TopLevelView::carried(&master.c, class, classes, stations),
        };
        trace!(
            class,
            x_leaves = view.x.leaves().count(),
            carried = view.c.leaves().count(),
            "derived class view"
        );
        view
    }
}
