//! Propose → validate → commit or roll back, over a grid held in place
//!
//! A [`Transaction`] borrows the grid mutably and journals every move it
//! applies. Dropping it without [`Transaction::commit`] reverts the journal in
//! reverse order, so a trial that returns early never leaves a half-applied
//! edit behind.

use crate::core::models::{Cell, CourseIdx, GridAssignment};

/// One reversible grid edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Unplaced course put into a cell
    Place {
        /// Course
        course: CourseIdx,
        /// Destination
        cell: Cell,
    },
    /// Placed course moved between cells
    Relocate {
        /// Course
        course: CourseIdx,
        /// Origin
        from: Cell,
        /// Destination
        to: Cell,
    },
    /// Two whole groups exchanged
    Swap {
        /// First cell
        a: Cell,
        /// Second cell
        b: Cell,
    },
}

impl Move {
    fn revert(self, grid: &mut GridAssignment) {
        match self {
            Self::Place { course, .. } => {
                grid.remove(course);
            }
            Self::Relocate { course, from, .. } => {
                grid.relocate(course, from);
            }
            Self::Swap { a, b } => grid.swap_cells(a, b),
        }
    }
}

/// Journaled edit session over one grid
#[derive(Debug)]
pub struct Transaction<'g> {
    grid: &'g mut GridAssignment,
    journal: Vec<Move>,
    committed: bool,
}

impl<'g> Transaction<'g> {
    /// Start a session
    pub fn begin(grid: &'g mut GridAssignment) -> Self {
        Self {
            grid,
            journal: Vec::new(),
            committed: false,
        }
    }

    /// Grid with the pending moves applied
    #[must_use]
    pub fn grid(&self) -> &GridAssignment {
        self.grid
    }

    /// Moves applied so far
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.journal
    }

    /// Put an unplaced course into a cell
    pub fn place(&mut self, course: CourseIdx, cell: Cell) {
        self.grid.place(course, cell);
        self.journal.push(Move::Place { course, cell });
    }

    /// Move a placed course; returns its previous cell, or `None` (and
    /// records nothing) when the course was not placed
    pub fn relocate(&mut self, course: CourseIdx, to: Cell) -> Option<Cell> {
        let from = self.grid.relocate(course, to)?;
        self.journal.push(Move::Relocate { course, from, to });
        Some(from)
    }

    /// Exchange the groups of two cells
    pub fn swap(&mut self, a: Cell, b: Cell) {
        self.grid.swap_cells(a, b);
        self.journal.push(Move::Swap { a, b });
    }

    /// Keep every applied move
    pub fn commit(mut self) -> Vec<Move> {
        self.committed = true;
        std::mem::take(&mut self.journal)
    }

    /// Undo every applied move
    pub fn rollback(self) {
        // Drop does the work
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(m) = self.journal.pop() {
            m.revert(self.grid);
        }
    }
}
