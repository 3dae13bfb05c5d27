//! Pass 1: exchange whole slot groups between cells
//!
//! Swapping complete groups keeps every group intact, so it cannot create a
//! clash; only the consecutive-run structure changes. No clash check is made
//! before a swap.

use super::transaction::Transaction;
use super::{PassStats, SearchContext, SearchPass};
use crate::core::models::{Cell, GridAssignment};
use rand::seq::SliceRandom;

/// Hill-climbing over cell pairs, repeated until a full round finds nothing
#[derive(Debug, Clone, Copy)]
pub struct CellSwap {
    rounds: usize,
}

impl CellSwap {
    /// Pass limited to `rounds` full rounds
    #[must_use]
    pub const fn new(rounds: usize) -> Self {
        Self { rounds }
    }
}

impl SearchPass for CellSwap {
    fn name(&self) -> &'static str {
        "cell-swap"
    }

    fn run(&self, ctx: &mut SearchContext<'_>, grid: &mut GridAssignment) -> PassStats {
        let mut stats = PassStats::default();
        let mut best = ctx.scorer.evaluate(grid);
        let mut cells: Vec<Cell> = grid.shape().cells().collect();

        for _ in 0..self.rounds {
            let mut improved = false;
            cells.shuffle(&mut ctx.rng);

            for i in 0..cells.len() {
                let mut partners: Vec<Cell> = cells[i + 1..].to_vec();
                partners.shuffle(&mut ctx.rng);
                for b in partners {
                    let a = cells[i];
                    if grid.group(a).is_empty() && grid.group(b).is_empty() {
                        continue;
                    }
                    stats.attempts += 1;

                    let mut tx = Transaction::begin(grid);
                    tx.swap(a, b);
                    debug_assert!(
                        crate::core::clash::is_clash_free(ctx.scorer.index(), tx.grid()),
                        "whole-group swap produced a clash"
                    );
                    let score = ctx.scorer.evaluate(tx.grid());
                    if score.is_better_than(&best) {
                        tx.commit();
                        best = score;
                        improved = true;
                        stats.accepted += 1;
                    }
                }
            }

            if !improved {
                break;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::{Scorer, TierTable};
    use crate::core::search::test_support::index;
    use crate::core::models::GridShape;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_swap_breaks_four_in_a_row() {
        let idx = index(&[("s", "A"), ("s", "B"), ("s", "C"), ("s", "D"), ("t", "E")]);
        let tiers = TierTable::midsem();
        let shape = GridShape::new(2, 4).unwrap();
        let mut grid = GridAssignment::new(shape, 5);
        for slot in 0..4 {
            grid.place(slot, Cell::new(0, slot));
        }
        grid.place(4, Cell::new(1, 0));

        let mut ctx = SearchContext {
            scorer: Scorer::new(&idx, &tiers, shape),
            rng: ChaCha8Rng::seed_from_u64(5),
            run: 0,
        };
        let before = ctx.scorer.evaluate(&grid);
        let stats = CellSwap::new(50).run(&mut ctx, &mut grid);
        let after = ctx.scorer.evaluate(&grid);

        assert!(before.has_worst_tier);
        assert!(!after.has_worst_tier);
        assert!(stats.accepted >= 1);
        // groups move intact
        assert!(grid.iter().all(|(_, g)| g.len() <= 1));
    }

    #[test]
    fn test_zero_rounds_is_noop() {
        let idx = index(&[("s", "A"), ("s", "B")]);
        let tiers = TierTable::midsem();
        let shape = GridShape::new(1, 4).unwrap();
        let mut grid = GridAssignment::new(shape, 2);
        grid.place(0, Cell::new(0, 0));
        grid.place(1, Cell::new(0, 1));
        let before = grid.clone();

        let mut ctx = SearchContext {
            scorer: Scorer::new(&idx, &tiers, shape),
            rng: ChaCha8Rng::seed_from_u64(0),
            run: 0,
        };
        let stats = CellSwap::new(0).run(&mut ctx, &mut grid);
        assert_eq!(stats, PassStats::default());
        assert_eq!(grid, before);
    }
}
