//! Pass 3: cut the number of students with runs one short of the worst tier
//!
//! Picks the course that appears most often in such runs and moves it to the
//! admitting cell that most reduces that number (then the number of days at
//! the tier) without creating the worst tier. Courses for which no such cell
//! exists are remembered and skipped.

use super::transaction::Transaction;
use super::{admitting_cells, course_frequencies, PassStats, SearchContext, SearchPass};
use crate::core::models::{Cell, CourseIdx, GridAssignment};
use crate::core::scoring::TierLoad;
use std::collections::HashSet;

/// Secondary-tier reduction
#[derive(Debug, Clone, Copy)]
pub struct TierReduction {
    attempts: usize,
}

impl TierReduction {
    /// Pass limited to `attempts` course picks
    #[must_use]
    pub const fn new(attempts: usize) -> Self {
        Self { attempts }
    }
}

impl SearchPass for TierReduction {
    fn name(&self) -> &'static str {
        "tier-reduction"
    }

    fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> PassStats {
        let mut stats = PassStats::default();
        let Some(secondary) = ctx.scorer.tiers().secondary_run() else {
            return stats;
        };
        if ctx.scorer.evaluate(grid).has_worst_tier {
            return stats;
        }

        let mut load = ctx.scorer.tier_load(grid, secondary);
        let mut failed: HashSet<CourseIdx> = HashSet::new();

        while stats.attempts < self.attempts && load.students > 0 {
            stats.attempts += 1;
            let runs = ctx.scorer.runs(grid, secondary);
            let Some((course, _)) = course_frequencies(runs.iter().filter(|r| r.length == secondary))
                .into_iter()
                .find(|(c, _)| !failed.contains(c))
            else {
                break;
            };

            let mut best: Option<(Cell, TierLoad)> = None;
            for cell in admitting_cells(&ctx.scorer, grid, course) {
                let mut tx = Transaction::begin(grid);
                tx.relocate(course, cell);
                if ctx.scorer.evaluate(tx.grid()).has_worst_tier {
                    continue;
                }
                let trial = ctx.scorer.tier_load(tx.grid(), secondary);
                if trial < best.map_or(load, |(_, l)| l) {
                    best = Some((cell, trial));
                }
            }

            match best {
                Some((cell, trial)) => {
                    grid.relocate(course, cell);
                    load = trial;
                    stats.accepted += 1;
                }
                None => {
                    failed.insert(course);
                }
            }
        }
        stats
    }
}
