//! Pass 4: spread a student's exams across days
//!
//! A move is kept only when neither the number of students nor the number
//! of student days at the worst or secondary tier grows.

use super::transaction::Transaction;
use super::{PassStats, SearchContext, SearchPass};
use crate::core::models::{Cell, CourseIdx, GridAssignment, StudentIdx};
use crate::core::scoring::Scorer;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// A student with a crowded day and an empty one
#[derive(Debug, Clone, PartialEq, Eq)]
struct Unbalanced {
    student: StudentIdx,
    heaviest: usize,
    lightest: Vec<usize>,
}

/// Load balancing across days
#[derive(Debug, Clone, Copy)]
pub struct LoadBalancing {
    attempts: usize,
}

impl LoadBalancing {
    /// Pass limited to `attempts` tries
    #[must_use]
    pub const fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    fn unbalanced(scorer: &Scorer<'_>, grid: &GridAssignment) -> Vec<Unbalanced> {
        let shape = grid.shape();
        let heavy = shape.slots_per_day.min(3);
        let index = scorer.index();
        let mut found = Vec::new();
        let mut per_day = vec![0usize; shape.days];

        for student in 0..index.student_count() {
            per_day.fill(0);
            for &course in &index.student(student).courses {
                if let Some(cell) = grid.cell_of(course) {
                    per_day[cell.day] += 1;
                }
            }
            let max = per_day.iter().copied().max().unwrap_or(0);
            let min = per_day.iter().copied().min().unwrap_or(0);
            if max >= heavy && min == 0 {
                found.push(Unbalanced {
                    student,
                    heaviest: per_day.iter().position(|&n| n == max).unwrap_or(0),
                    lightest: (0..shape.days).filter(|&d| per_day[d] == 0).collect(),
                });
            }
        }
        found
    }

    /// First admitting move of one of the student's heaviest-day courses to
    /// a lightest day that has not failed before
    fn propose(
        scorer: &Scorer<'_>,
        grid: &GridAssignment,
        target: &Unbalanced,
        failed: &HashSet<(CourseIdx, Cell, Cell)>,
        rng: &mut ChaCha8Rng,
    ) -> Option<(CourseIdx, Cell, Cell)> {
        let index = scorer.index();
        let mut candidates: Vec<(CourseIdx, Cell)> = index
            .student(target.student)
            .courses
            .iter()
            .filter_map(|&c| grid.cell_of(c).map(|cell| (c, cell)))
            .filter(|(_, cell)| cell.day == target.heaviest)
            .collect();
        candidates.shuffle(rng);

        for (course, from) in candidates {
            for &day in &target.lightest {
                for slot in 0..grid.shape().slots_per_day {
                    let to = Cell::new(day, slot);
                    if failed.contains(&(course, from, to)) {
                        continue;
                    }
                    if crate::core::clash::admits(index, grid.group(to), course) {
                        return Some((course, from, to));
                    }
                }
            }
        }
        None
    }
}

impl SearchPass for LoadBalancing {
    fn name(&self) -> &'static str {
        "balancing"
    }

    fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> PassStats {
        let mut stats = PassStats::default();
        let worst = ctx.scorer.tiers().worst_run();
        let secondary = ctx.scorer.tiers().secondary_run();
        let mut failed: HashSet<(CourseIdx, Cell, Cell)> = HashSet::new();

        while stats.attempts < self.attempts {
            stats.attempts += 1;
            let unbalanced = Self::unbalanced(&ctx.scorer, grid);
            let Some(target) = unbalanced.choose(&mut ctx.rng) else {
                break;
            };
            let Some((course, from, to)) = Self::propose(&ctx.scorer, grid, target, &failed, &mut ctx.rng) else {
                continue;
            };

            let worst_before = ctx.scorer.tier_load(grid, worst);
            let secondary_before = secondary.map(|s| ctx.scorer.tier_load(grid, s)).unwrap_or_default();

            let mut tx = Transaction::begin(grid);
            tx.relocate(course, to);
            let worst_after = ctx.scorer.tier_load(tx.grid(), worst);
            let secondary_after = secondary
                .map(|s| ctx.scorer.tier_load(tx.grid(), s))
                .unwrap_or_default();

            if worst_after.no_worse_than(&worst_before) && secondary_after.no_worse_than(&secondary_before) {
                tx.commit();
                stats.accepted += 1;
            } else {
                tx.rollback();
                failed.insert((course, from, to));
            }
        }
        stats
    }
}
