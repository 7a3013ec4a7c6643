//! The assembled system and its per-step solve.

use comom_core::{Basis, BtfIndexer, Indexer, QnModel, StateStore, Value, VectorOrdering};
use num_rational::BigRational;
use num_traits::{One, Zero};
use tracing::trace;

use crate::assembly::{assemble, MasterStructure};
use crate::block::{minus_one, BlockKind, Leaf, ScaledCopyBlock};
use crate::error::{structure, BtfError, Result};
use crate::lup::LupOptions;
use crate::pattern::PatternLayout;
use crate::view::ClassView;

/// Master structure plus everything needed to interpret it.
#[derive(Debug, Clone)]
pub struct BtfLinearSystem {
    model: QnModel,
    indexer: BtfIndexer,
    layout: PatternLayout,
    master: MasterStructure,
    /// Index of `(0, 0)`, where the normalising constant lands
    constant_index: usize,
}

impl BtfLinearSystem {
    /// Enumerate the basis, assemble the master and factor every diagonal
    /// leaf.
    pub fn build(model: &QnModel, options: &LupOptions) -> Result<Self> {
        let basis = Basis::for_model(model, VectorOrdering::SupportColex)?;
        let indexer = BtfIndexer::new(basis);
        let layout = PatternLayout::new(indexer.basis())?;
        let master = assemble(model, &indexer, &layout, options)?;
        let constant_index = indexer.index_of(&indexer.basis().zero_vector(), 0)?;
        Ok(Self {
            model: model.clone(),
            indexer,
            layout,
            master,
            constant_index,
        })
    }

    pub fn model(&self) -> &QnModel {
        &self.model
    }

    pub fn indexer(&self) -> &BtfIndexer {
        &self.indexer
    }

    pub fn layout(&self) -> &PatternLayout {
        &self.layout
    }

    pub fn master(&self) -> &MasterStructure {
        &self.master
    }

    /// Flat index of `G` in the state arrays.
    pub fn constant_index(&self) -> usize {
        self.constant_index
    }

    /// A store sized for this system.
    pub fn new_store(&self) -> StateStore {
        StateStore::new(self.indexer.size(), self.indexer.x_size())
    }

    /// View of the master for `class` (`1..=R`).
    pub fn view(&self, class: usize) -> ClassView {
        ClassView::derive(&self.master, class)
    }

    fn leaf(&self, id: usize) -> &Leaf {
        self.master.arena.get(id)
    }

    fn scaled_copy(&self, id: usize) -> Result<&ScaledCopyBlock> {
        match &self.leaf(id).kind {
            BlockKind::ScaledCopy(block) => Ok(block),
            _ => Err(structure(format!("leaf {} is not a scaled copy", id))),
        }
    }

    fn population_factor(population: u32) -> BigRational {
        BigRational::one() / BigRational::from_integer(population.into())
    }

    /// One population step: `store.previous` holds the state at population
    /// `population - 1` of the view's class, `store.current` receives the
    /// state at `population`.
    pub fn solve(&self, view: &ClassView, population: u32, store: &mut StateStore) -> Result<()> {
        if store.len() != self.indexer.size() || store.rhs().len() != self.indexer.x_size() {
            return Err(BtfError::DimensionMismatch {
                expected: self.indexer.size(),
                actual: store.len(),
            });
        }
        if population == 0 {
            return Err(structure("population steps start at one"));
        }
        let class = view.class - 1;

        // B1
        {
            let (rhs, previous) = store.rhs_and_previous();
            for id in view.b1.leaves() {
                for row in self.leaf(id).span.row_range() {
                    rhs[row] = Value::zero();
                }
                for row in &self.scaled_copy(id)?.rows {
                    rhs[row.dest] = row.evaluate(&self.model, class, previous);
                }
            }
        }

        // B2
        {
            let factor = Self::population_factor(population);
            let (previous, current) = store.step_buffers();
            for id in view.b2.leaves() {
                let block = self.scaled_copy(id)?;
                for row in &block.rows {
                    let value = row.evaluate(&self.model, class, previous);
                    current[row.dest] = if block.per_population {
                        value.scale(&factor)
                    } else {
                        value
                    };
                }
            }
        }

        // C
        {
            let (previous, current) = store.step_buffers();
            for id in view.c.leaves() {
                match &self.leaf(id).kind {
                    BlockKind::CarryForward(block) => {
                        for &(src, dest) in &block.pairs {
                            current[dest] = previous[src].clone();
                        }
                    }
                    _ => return Err(structure(format!("leaf {} is not a carry-forward", id))),
                }
            }
        }

        // Y couplings move to the right-hand side
        {
            let sign = minus_one();
            let (rhs, current) = store.rhs_and_current();
            for id in view.y.leaves() {
                let span = self.leaf(id).span;
                self.leaf(id)
                    .accumulate_product(span.rows, span.cols, current, rhs, &sign)?;
            }
            for s in &view.y.secondaries {
                self.leaf(s.leaf)
                    .accumulate_product(s.rows, s.cols, current, rhs, &sign)?;
            }
        }

        // X, highest h first
        let sign = minus_one();
        for group in view.x.macros.iter().rev() {
            {
                let (rhs, current) = store.rhs_and_current();
                for s in view.x.secondaries.iter().filter(|s| s.row_h == group.h) {
                    self.leaf(s.leaf)
                        .accumulate_product(s.rows, s.cols, current, rhs, &sign)?;
                }
            }
            let (rhs, current) = store.solve_buffers();
            for id in group.leaves.clone() {
                let leaf = self.leaf(id);
                let factors = match &leaf.kind {
                    BlockKind::Diagonal(d) => d.factors.as_ref(),
                    _ => None,
                }
                .ok_or_else(|| structure(format!("leaf {} has no factorisation", id)))?;
                factors.solve_into(&rhs[leaf.span.row_range()], &mut current[leaf.span.col_range()])?;
            }
            trace!(class = view.class, population, h = group.h, "solved macro group");
        }

        if store.current(self.constant_index).is_undefined() {
            return Err(BtfError::InconsistentSystem {
                class: view.class,
                population,
            });
        }
        Ok(())
    }

    /// `(A * lhs, B * rhs)` over the rows selected by `view`, where
    /// `A * new = B * old` is the system of one population step. Rows of X
    /// are indexed by X row, rows of B2 and C by destination entry; every
    /// other row is zero.
    pub fn multiply(
        &self,
        view: &ClassView,
        population: u32,
        lhs: &[Value],
        rhs: &[Value],
    ) -> Result<(Vec<Value>, Vec<Value>)> {
        let size = self.indexer.size();
        for v in [lhs, rhs] {
            if v.len() != size {
                return Err(BtfError::DimensionMismatch {
                    expected: size,
                    actual: v.len(),
                });
            }
        }
        let class = view.class - 1;
        let one = BigRational::one();
        let mut a = vec![Value::zero(); size];
        let mut b = vec![Value::zero(); size];

        for id in view.x.leaves().chain(view.y.leaves()) {
            let span = self.leaf(id).span;
            self.leaf(id)
                .accumulate_product(span.rows, span.cols, lhs, &mut a, &one)?;
        }
        for s in view.x.secondaries.iter().chain(&view.y.secondaries) {
            self.leaf(s.leaf)
                .accumulate_product(s.rows, s.cols, lhs, &mut a, &one)?;
        }
        for id in view.b1.leaves() {
            for row in &self.scaled_copy(id)?.rows {
                b[row.dest] = row.evaluate(&self.model, class, rhs);
            }
        }

        let scale = BigRational::from_integer(population.into());
        for id in view.b2.leaves() {
            let block = self.scaled_copy(id)?;
            for row in &block.rows {
                a[row.dest] = if block.per_population {
                    lhs[row.dest].scale(&scale)
                } else {
                    lhs[row.dest].clone()
                };
                b[row.dest] = row.evaluate(&self.model, class, rhs);
            }
        }

        for id in view.c.leaves() {
            if let BlockKind::CarryForward(block) = &self.leaf(id).kind {
                for &(src, dest) in &block.pairs {
                    a[dest] = lhs[dest].clone();
                    b[dest] = rhs[src].clone();
                }
            }
        }
        Ok((a, b))
    }
}
