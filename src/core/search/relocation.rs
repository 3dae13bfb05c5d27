//! Pass 2: move single courses out of long runs
//!
//! Stage one targets the worst tier: while it is present, pick a few of the
//! courses that appear in worst-tier runs and move each to the admitting cell
//! with the best score. Stage two relocates courses that keep showing up in
//! shorter back-to-back runs, accepting only moves that lower the total
//! without introducing the worst tier.

use super::{admitting_cells, course_frequencies, score_if_moved, PassStats, SearchContext, SearchPass};
use crate::core::models::{Cell, CourseIdx, GridAssignment};
use crate::core::scoring::Score;
use rand::seq::SliceRandom;
use rand::Rng;

/// Targeted course relocation
#[derive(Debug, Clone, Copy)]
pub struct Relocation {
    rounds: usize,
}

impl Relocation {
    /// Pass limited to `rounds` worst-tier iterations
    #[must_use]
    pub const fn new(rounds: usize) -> Self {
        Self { rounds }
    }

    fn worst_tier_stage(ctx: &mut SearchContext<'_>, grid: &mut GridAssignment, rounds: usize, stats: &mut PassStats) {
        let worst = ctx.scorer.tiers().worst_run();
        let mut current = ctx.scorer.evaluate(grid);

        for _ in 0..rounds {
            if !current.has_worst_tier {
                break;
            }
            let runs = ctx.scorer.runs(grid, worst);
            let mut problem: Vec<CourseIdx> = course_frequencies(&runs).into_iter().map(|(c, _)| c).collect();
            problem.shuffle(&mut ctx.rng);
            let take = ctx.rng.random_range(2..=4).min(problem.len());

            let mut improved = false;
            for &course in &problem[..take] {
                let mut cells = admitting_cells(&ctx.scorer, grid, course);
                cells.shuffle(&mut ctx.rng);

                let mut best: Option<(Cell, Score)> = None;
                for cell in cells {
                    stats.attempts += 1;
                    let score = score_if_moved(&ctx.scorer, grid, course, cell);
                    let bar = best.map_or(current, |(_, s)| s);
                    if score.is_better_than(&bar) {
                        best = Some((cell, score));
                    }
                }

                if let Some((cell, score)) = best {
                    grid.relocate(course, cell);
                    current = score;
                    improved = true;
                    stats.accepted += 1;
                }
            }
            if !improved {
                break;
            }
        }
    }

    fn common_run_stage(ctx: &SearchContext<'_>, grid: &mut GridAssignment, stats: &mut PassStats) {
        let worst = ctx.scorer.tiers().worst_run();
        let runs = ctx.scorer.runs(grid, 2);
        let frequent = course_frequencies(runs.iter().filter(|r| r.length < worst));
        let mut current = ctx.scorer.evaluate(grid);

        for (course, count) in frequent {
            if count < 2 {
                continue;
            }
            let mut best: Option<(Cell, Score)> = None;
            for cell in admitting_cells(&ctx.scorer, grid, course) {
                stats.attempts += 1;
                let score = score_if_moved(&ctx.scorer, grid, course, cell);
                let bar = best.map_or(current.total, |(_, s)| s.total);
                if !score.has_worst_tier && score.total < bar {
                    best = Some((cell, score));
                }
            }
            if let Some((cell, score)) = best {
                grid.relocate(course, cell);
                current = score;
                stats.accepted += 1;
            }
        }
    }
}

impl SearchPass for Relocation {
    fn name(&self) -> &'static str {
        "relocation"
    }

    fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> PassStats {
        let mut stats = PassStats::default();
        Self::worst_tier_stage(ctx, grid, self.rounds, &mut stats);
        Self::common_run_stage(ctx, grid, &mut stats);
        stats
    }
}
