//! Initial placement: builds the first clash-free grid of a run
//!
//! Two strategies:
//! - [`InitialPlacer::greedy`] shuffles the courses and puts each one in the
//!   first cell (row-major) that admits it.
//! - [`InitialPlacer::from_preassignment`] keeps every pre-assigned course that
//!   lands inside the grid and repacks the rest (slots beyond the grid and
//!   courses missing from the pre-assignment) by first fit, falling back to
//!   displacing the courses that block a cell. Displacement only looks one
//!   move deep; when it gives up, every course is repacked by a bounded
//!   backtracking search that keeps pre-assigned courses in place where it
//!   can.

use crate::core::clash::admits;
use crate::core::enrollment::EnrollmentIndex;
use crate::core::models::{Cell, CourseIdx, GridAssignment, GridShape, PreAssignment};
use crate::core::search::transaction::{Move, Transaction};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Reverse;
use std::error::Error;
use std::fmt;

/// Backtracking nodes allowed per course when repacking the whole grid
const REPACK_NODES_PER_COURSE: usize = 20;
/// Node allowance for small inputs
const REPACK_MIN_NODES: usize = 10_000;

/// Why a run could not build its first grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// No cell admits the course, even after displacing its blockers
    Unplaceable {
        /// Course code
        course: String,
    },
    /// The pre-assignment names a course the enrollment index does not know
    UnknownCourse {
        /// Course code
        code: String,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unplaceable { course } => {
                write!(f, "Course {course} fits no slot, even after displacing other courses")
            }
            Self::UnknownCourse { code } => {
                write!(f, "Pre-assigned course {code} has no enrollment entry")
            }
        }
    }
}

impl Error for PlacementError {}

/// Builds initial grids for one enrollment index and grid shape
#[derive(Debug, Clone, Copy)]
pub struct InitialPlacer<'a> {
    index: &'a EnrollmentIndex,
    shape: GridShape,
}

impl<'a> InitialPlacer<'a> {
    /// Create a placer
    #[must_use]
    pub const fn new(index: &'a EnrollmentIndex, shape: GridShape) -> Self {
        Self { index, shape }
    }

    fn unplaceable(&self, course: CourseIdx) -> PlacementError {
        PlacementError::Unplaceable {
            course: self.index.course(course).code.clone(),
        }
    }

    /// First cell (row-major) other than `exclude` that admits the course
    fn first_fit(&self, grid: &GridAssignment, course: CourseIdx, exclude: Option<Cell>) -> Option<Cell> {
        self.shape
            .cells()
            .filter(|&cell| Some(cell) != exclude)
            .find(|&cell| admits(self.index, grid.group(cell), course))
    }

    /// Shuffled first-fit placement of every course
    ///
    /// # Errors
    /// Returns [`PlacementError::Unplaceable`] when a course fits no cell.
    pub fn greedy<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GridAssignment, PlacementError> {
        let mut order: Vec<CourseIdx> = (0..self.index.course_count()).collect();
        order.shuffle(rng);

        let mut grid = GridAssignment::new(self.shape, self.index.course_count());
        for course in order {
            let cell = self
                .first_fit(&grid, course, None)
                .ok_or_else(|| self.unplaceable(course))?;
            grid.place(course, cell);
        }
        Ok(grid)
    }

    /// Start from a pre-assignment and repack its overflow.
    ///
    /// The in-grid part of the pre-assignment must already be clash-free
    /// (see [`crate::core::clash::find_preassignment_clashes`]); it is placed
    /// as given.
    ///
    /// # Errors
    /// Returns [`PlacementError::UnknownCourse`] for a code missing from the
    /// index, or [`PlacementError::Unplaceable`] when an overflow course can
    /// be neither placed nor made room for and the full repack fails too.
    pub fn from_preassignment<R: Rng + ?Sized>(
        &self,
        pre: &PreAssignment,
        rng: &mut R,
    ) -> Result<GridAssignment, PlacementError> {
        let spd = self.shape.slots_per_day;
        let mut grid = GridAssignment::new(self.shape, self.index.course_count());
        let mut preferred: Vec<Option<Cell>> = vec![None; self.index.course_count()];

        for (slot_number, codes) in pre.iter() {
            let cell = Cell::from_slot_number(slot_number, spd).filter(|&c| self.shape.contains(c));
            for code in codes {
                let course = self
                    .index
                    .course_index(code)
                    .ok_or_else(|| PlacementError::UnknownCourse { code: code.clone() })?;
                if let Some(cell) = cell {
                    grid.place(course, cell);
                    preferred[course] = Some(cell);
                }
            }
        }

        let mut overflow: Vec<CourseIdx> = grid.unplaced().collect();
        overflow.shuffle(rng);
        for course in overflow {
            if let Err(err) = self.redistribute(&mut grid, course) {
                crate::debug!(
                    "Displacement gave up on {}, repacking every course",
                    self.index.course(course).code
                );
                return self.repack(&preferred, rng).ok_or(err);
            }
        }
        Ok(grid)
    }

    /// Place every course from scratch by backtracking, most constrained
    /// course first. Each course tries its preferred cell before the others,
    /// which are visited in one shuffled order. Gives up after a node budget
    /// proportional to the course count.
    fn repack<R: Rng + ?Sized>(&self, preferred: &[Option<Cell>], rng: &mut R) -> Option<GridAssignment> {
        let mut order: Vec<Cell> = self.shape.cells().collect();
        order.shuffle(rng);
        let mut grid = GridAssignment::new(self.shape, self.index.course_count());
        let mut budget = self
            .index
            .course_count()
            .saturating_mul(REPACK_NODES_PER_COURSE)
            .max(REPACK_MIN_NODES);

        if self.extend(&mut grid, preferred, &order, &mut budget) {
            crate::debug!("Repack succeeded with {budget} node(s) to spare");
            Some(grid)
        } else {
            crate::debug!("Repack failed");
            None
        }
    }

    fn extend(
        &self,
        grid: &mut GridAssignment,
        preferred: &[Option<Cell>],
        order: &[Cell],
        budget: &mut usize,
    ) -> bool {
        let Some(course) = self.most_constrained(grid) else {
            return true;
        };
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        let first = preferred.get(course).copied().flatten();
        let cells = first
            .into_iter()
            .chain(order.iter().copied().filter(|&cell| Some(cell) != first));
        for cell in cells {
            if !admits(self.index, grid.group(cell), course) {
                continue;
            }
            grid.place(course, cell);
            if self.extend(grid, preferred, order, budget) {
                return true;
            }
            grid.remove(course);
        }
        false
    }

    /// Unplaced course with the fewest admitting cells, ties to the course
    /// with the most clash neighbours, then the lowest index
    fn most_constrained(&self, grid: &GridAssignment) -> Option<CourseIdx> {
        grid.unplaced()
            .map(|course| {
                let options = self
                    .shape
                    .cells()
                    .filter(|&cell| admits(self.index, grid.group(cell), course))
                    .count();
                (options, Reverse(self.index.neighbors(course).len()), course)
            })
            .min()
            .map(|(_, _, course)| course)
    }

    /// Place one course, displacing its blockers from the cheapest cell if no
    /// cell admits it directly.
    ///
    /// # Errors
    /// Returns [`PlacementError::Unplaceable`] when no cell can be cleared.
    pub fn redistribute(&self, grid: &mut GridAssignment, course: CourseIdx) -> Result<(), PlacementError> {
        if let Some(cell) = self.first_fit(grid, course, None) {
            grid.place(course, cell);
            return Ok(());
        }

        let mut best: Option<(Cell, Vec<Move>)> = None;
        for target in self.shape.cells() {
            let blockers: Vec<CourseIdx> = grid
                .group(target)
                .iter()
                .copied()
                .filter(|&c| self.index.clashes_with(c, course))
                .collect();
            if best.as_ref().is_some_and(|(_, moves)| blockers.len() >= moves.len()) {
                continue;
            }
            if let Some(moves) = self.clear_cell(grid, target, &blockers) {
                best = Some((target, moves));
            }
        }

        let Some((target, moves)) = best else {
            crate::debug!(
                "No slot can be cleared for {}",
                self.index.course(course).code
            );
            return Err(self.unplaceable(course));
        };

        crate::debug!(
            "Placing {} in {target} after displacing {} course(s)",
            self.index.course(course).code,
            moves.len()
        );
        let mut tx = Transaction::begin(grid);
        for m in moves {
            if let Move::Relocate { course, to, .. } = m {
                tx.relocate(course, to);
            }
        }
        tx.place(course, target);
        tx.commit();
        Ok(())
    }

    /// Trial-move every blocker out of `target` by first fit (never into
    /// `target`). Returns the moves when all succeed; the grid is left
    /// untouched either way.
    fn clear_cell(&self, grid: &mut GridAssignment, target: Cell, blockers: &[CourseIdx]) -> Option<Vec<Move>> {
        let mut tx = Transaction::begin(grid);
        for &blocker in blockers {
            let dest = self.first_fit(tx.grid(), blocker, Some(target))?;
            tx.relocate(blocker, dest);
        }
        let moves = tx.moves().to_vec();
        tx.rollback();
        Some(moves)
    }
}
