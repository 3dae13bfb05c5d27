//! Local search over one grid
//!
//! A [`LocalSearch`] runs its passes strictly in order; each pass mutates the
//! grid through [`transaction::Transaction`]s and keeps only accepted moves.
//! Every pass has an attempt budget so pathological inputs stay bounded.

pub mod balancing;
pub mod cell_swap;
pub mod relocation;
pub mod tier_reduction;
pub mod transaction;

use crate::core::clash::admits;
use crate::core::models::{Cell, CourseIdx, GridAssignment};
use crate::core::scoring::{RunRecord, Score, Scorer};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use transaction::Transaction;

pub use balancing::LoadBalancing;
pub use cell_swap::CellSwap;
pub use relocation::Relocation;
pub use tier_reduction::TierReduction;

/// Attempt budgets for the four passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Full swap rounds before giving up on improvement
    pub swap_rounds: usize,
    /// Worst-tier relocation iterations
    pub relocation_rounds: usize,
    /// Secondary-tier reduction attempts
    pub reduction_attempts: usize,
    /// Load-balancing attempts
    pub balance_attempts: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            swap_rounds: 50,
            relocation_rounds: 50,
            reduction_attempts: 100,
            balance_attempts: 50,
        }
    }
}

/// Per-run state shared by the passes
#[derive(Debug)]
pub struct SearchContext<'a> {
    /// Scorer bound to the run's index and tier table
    pub scorer: Scorer<'a>,
    /// The run's private random stream
    pub rng: ChaCha8Rng,
    /// Run number, for log lines
    pub run: usize,
}

/// Counters reported by one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Moves tried
    pub attempts: usize,
    /// Moves kept
    pub accepted: usize,
}

/// One optimization pass
pub trait SearchPass: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Improve the grid in place
    fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> PassStats;
}

/// Ordered list of passes
pub struct LocalSearch {
    passes: Vec<Box<dyn SearchPass>>,
}

impl LocalSearch {
    /// The standard pipeline: swap, relocation, tier reduction, balancing
    #[must_use]
    pub fn new(budget: SearchBudget) -> Self {
        Self {
            passes: vec![
                Box::new(CellSwap::new(budget.swap_rounds)),
                Box::new(Relocation::new(budget.relocation_rounds)),
                Box::new(TierReduction::new(budget.reduction_attempts)),
                Box::new(LoadBalancing::new(budget.balance_attempts)),
            ],
        }
    }

    /// Custom pipeline
    #[must_use]
    pub fn with_passes(passes: Vec<Box<dyn SearchPass>>) -> Self {
        Self { passes }
    }

    /// Run every pass in order and return the final score
    pub fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> Score {
        for pass in &self.passes {
            let stats = pass.run(ctx, grid);
            crate::debug!(
                "run {}: {} kept {}/{} moves",
                ctx.run,
                pass.name(),
                stats.accepted,
                stats.attempts
            );
        }
        ctx.scorer.evaluate(grid)
    }
}

impl std::fmt::Debug for LocalSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.passes.iter().map(|p| p.name()).collect();
        f.debug_struct("LocalSearch").field("passes", &names).finish()
    }
}

/// Cells other than the course's own that admit it
pub(crate) fn admitting_cells(scorer: &Scorer<'_>, grid: &GridAssignment, course: CourseIdx) -> Vec<Cell> {
    let current = grid.cell_of(course);
    grid.shape()
        .cells()
        .filter(|&cell| Some(cell) != current)
        .filter(|&cell| admits(scorer.index(), grid.group(cell), course))
        .collect()
}

/// Score the grid as if `course` sat in `to`; the grid is unchanged afterwards
pub(crate) fn score_if_moved(scorer: &Scorer<'_>, grid: &mut GridAssignment, course: CourseIdx, to: Cell) -> Score {
    let mut tx = Transaction::begin(grid);
    tx.relocate(course, to);
    scorer.evaluate(tx.grid())
}

/// How often each course appears in the given runs, most frequent first
/// (ties by course index)
pub(crate) fn course_frequencies<'r, I>(runs: I) -> Vec<(CourseIdx, usize)>
where
    I: IntoIterator<Item = &'r RunRecord>,
{
    let mut counts: BTreeMap<CourseIdx, usize> = BTreeMap::new();
    for run in runs {
        for &course in &run.courses {
            *counts.entry(course).or_default() += 1;
        }
    }
    let mut sorted: Vec<(CourseIdx, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    sorted
}
