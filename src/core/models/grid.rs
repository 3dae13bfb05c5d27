//! Exam grid: cells, grid shape and course-to-cell assignments

use super::course::CourseIdx;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest supported number of slots in one day (one bit per slot in day masks)
pub const MAX_SLOTS_PER_DAY: usize = 64;

/// One (day, slot-in-day) coordinate of the grid, both 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Day index
    pub day: usize,
    /// Slot index within the day
    pub slot: usize,
}

impl Cell {
    /// Create a cell
    #[must_use]
    pub const fn new(day: usize, slot: usize) -> Self {
        Self { day, slot }
    }

    /// Map a flat 1-based slot number onto a cell.
    ///
    /// `day = (n - 1) / slots_per_day`, `slot = (n - 1) % slots_per_day`.
    /// Returns `None` for slot number 0 or a zero-width day. The resulting
    /// cell may lie outside a grid with fewer days (overflow slots).
    #[must_use]
    pub const fn from_slot_number(slot_number: usize, slots_per_day: usize) -> Option<Self> {
        if slot_number == 0 || slots_per_day == 0 {
            return None;
        }
        let zero_based = slot_number - 1;
        Some(Self {
            day: zero_based / slots_per_day,
            slot: zero_based % slots_per_day,
        })
    }

    /// Flat 1-based slot number of this cell
    #[must_use]
    pub const fn slot_number(&self, slots_per_day: usize) -> usize {
        self.day * slots_per_day + self.slot + 1
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} Slot {}", self.day + 1, self.slot + 1)
    }
}

/// Fixed `days × slots_per_day` grid shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of exam days
    pub days: usize,
    /// Number of slots in each day
    pub slots_per_day: usize,
}

impl GridShape {
    /// Create a validated grid shape
    ///
    /// # Errors
    /// Returns an error when there are no days, fewer than two slots per day,
    /// or more than [`MAX_SLOTS_PER_DAY`] slots per day.
    pub fn new(days: usize, slots_per_day: usize) -> Result<Self, String> {
        if days == 0 {
            return Err("Grid needs at least one day".to_string());
        }
        if slots_per_day < 2 {
            return Err(format!(
                "Grid needs at least two slots per day (got {slots_per_day})"
            ));
        }
        if slots_per_day > MAX_SLOTS_PER_DAY {
            return Err(format!(
                "At most {MAX_SLOTS_PER_DAY} slots per day are supported (got {slots_per_day})"
            ));
        }
        Ok(Self {
            days,
            slots_per_day,
        })
    }

    /// Total number of cells
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.days * self.slots_per_day
    }

    /// Whether the cell lies inside the grid
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.day < self.days && cell.slot < self.slots_per_day
    }

    /// Row-major position of a cell
    #[must_use]
    pub const fn index_of(&self, cell: Cell) -> usize {
        cell.day * self.slots_per_day + cell.slot
    }

    /// Cell at a row-major position
    #[must_use]
    pub const fn cell_at(&self, index: usize) -> Cell {
        Cell {
            day: index / self.slots_per_day,
            slot: index % self.slots_per_day,
        }
    }

    /// All cells in row-major (day, then slot) order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.cell_count()).map(|i| self.cell_at(i))
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.days, self.slots_per_day)
    }
}

/// Mapping of every cell to its slot group.
///
/// Groups are kept sorted by course index, so two assignments compare equal
/// exactly when every cell holds the same course set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridAssignment {
    shape: GridShape,
    groups: Vec<Vec<CourseIdx>>,
    positions: Vec<Option<usize>>,
}

impl GridAssignment {
    /// Create an empty assignment for `course_count` courses
    #[must_use]
    pub fn new(shape: GridShape, course_count: usize) -> Self {
        Self {
            shape,
            groups: vec![Vec::new(); shape.cell_count()],
            positions: vec![None; course_count],
        }
    }

    /// Grid shape
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Number of courses this assignment covers
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.positions.len()
    }

    /// Slot group of a cell
    ///
    /// # Panics
    /// Panics if the cell lies outside the grid.
    #[must_use]
    pub fn group(&self, cell: Cell) -> &[CourseIdx] {
        &self.groups[self.shape.index_of(cell)]
    }

    /// Cell holding the course, if placed
    #[must_use]
    pub fn cell_of(&self, course: CourseIdx) -> Option<Cell> {
        self.positions
            .get(course)
            .copied()
            .flatten()
            .map(|i| self.shape.cell_at(i))
    }

    /// Whether the course has been placed
    #[must_use]
    pub fn is_placed(&self, course: CourseIdx) -> bool {
        self.cell_of(course).is_some()
    }

    /// Whether every course has been placed
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.positions.iter().all(Option::is_some)
    }

    /// Courses not yet placed
    pub fn unplaced(&self) -> impl Iterator<Item = CourseIdx> + '_ {
        self.positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c)
    }

    /// Iterate cells with their groups in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Cell, &[CourseIdx])> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (self.shape.cell_at(i), g.as_slice()))
    }

    /// Place an unplaced course into a cell. Does not check clashes.
    ///
    /// # Panics
    /// Panics if the cell lies outside the grid.
    pub fn place(&mut self, course: CourseIdx, cell: Cell) {
        debug_assert!(!self.is_placed(course), "course {course} placed twice");
        let index = self.shape.index_of(cell);
        let group = &mut self.groups[index];
        if let Err(at) = group.binary_search(&course) {
            group.insert(at, course);
        }
        self.positions[course] = Some(index);
    }

    /// Take a course out of the grid, returning the cell it occupied
    pub fn remove(&mut self, course: CourseIdx) -> Option<Cell> {
        let index = self.positions.get_mut(course)?.take()?;
        let group = &mut self.groups[index];
        if let Ok(at) = group.binary_search(&course) {
            group.remove(at);
        }
        Some(self.shape.cell_at(index))
    }

    /// Move a placed course to another cell, returning its previous cell
    pub fn relocate(&mut self, course: CourseIdx, to: Cell) -> Option<Cell> {
        let from = self.remove(course)?;
        self.place(course, to);
        Some(from)
    }

    /// Exchange the entire groups of two cells
    pub fn swap_cells(&mut self, a: Cell, b: Cell) {
        let (ia, ib) = (self.shape.index_of(a), self.shape.index_of(b));
        if ia == ib {
            return;
        }
        self.groups.swap(ia, ib);
        for &course in &self.groups[ia] {
            self.positions[course] = Some(ia);
        }
        for &course in &self.groups[ib] {
            self.positions[course] = Some(ib);
        }
    }

    /// Number of placed courses on a day
    #[must_use]
    pub fn courses_on_day(&self, day: usize) -> usize {
        (0..self.shape.slots_per_day)
            .map(|slot| self.group(Cell::new(day, slot)).len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> GridShape {
        GridShape::new(4, 4).unwrap()
    }

    #[test]
    fn test_slot_number_mapping() {
        assert_eq!(Cell::from_slot_number(1, 4), Some(Cell::new(0, 0)));
        assert_eq!(Cell::from_slot_number(4, 4), Some(Cell::new(0, 3)));
        assert_eq!(Cell::from_slot_number(5, 4), Some(Cell::new(1, 0)));
        assert_eq!(Cell::from_slot_number(16, 2), Some(Cell::new(7, 1)));
        assert_eq!(Cell::from_slot_number(0, 4), None);
        assert_eq!(Cell::new(1, 0).slot_number(4), 5);
        assert_eq!(Cell::new(6, 1).slot_number(2), 14);
    }

    #[test]
    fn test_shape_validation() {
        assert!(GridShape::new(0, 4).is_err());
        assert!(GridShape::new(4, 1).is_err());
        assert!(GridShape::new(4, 65).is_err());
        let s = GridShape::new(7, 2).unwrap();
        assert_eq!(s.cell_count(), 14);
        assert!(s.contains(Cell::new(6, 1)));
        assert!(!s.contains(Cell::new(7, 0)));
        assert_eq!(s.cells().count(), 14);
        assert_eq!(s.cell_at(s.index_of(Cell::new(3, 1))), Cell::new(3, 1));
    }

    #[test]
    fn test_place_remove_relocate() {
        let mut grid = GridAssignment::new(shape(), 3);
        assert!(!grid.is_complete());

        grid.place(2, Cell::new(0, 0));
        grid.place(0, Cell::new(0, 0));
        assert_eq!(grid.group(Cell::new(0, 0)), &[0, 2]);
        assert_eq!(grid.cell_of(2), Some(Cell::new(0, 0)));
        assert_eq!(grid.unplaced().collect::<Vec<_>>(), vec![1]);

        grid.place(1, Cell::new(3, 3));
        assert!(grid.is_complete());

        assert_eq!(grid.relocate(2, Cell::new(1, 2)), Some(Cell::new(0, 0)));
        assert_eq!(grid.group(Cell::new(0, 0)), &[0]);
        assert_eq!(grid.group(Cell::new(1, 2)), &[2]);

        assert_eq!(grid.remove(1), Some(Cell::new(3, 3)));
        assert_eq!(grid.remove(1), None);
        assert!(grid.group(Cell::new(3, 3)).is_empty());
    }

    #[test]
    fn test_swap_cells_updates_positions() {
        let mut grid = GridAssignment::new(shape(), 3);
        grid.place(0, Cell::new(0, 0));
        grid.place(1, Cell::new(0, 0));
        grid.place(2, Cell::new(2, 1));

        grid.swap_cells(Cell::new(0, 0), Cell::new(2, 1));
        assert_eq!(grid.group(Cell::new(0, 0)), &[2]);
        assert_eq!(grid.group(Cell::new(2, 1)), &[0, 1]);
        assert_eq!(grid.cell_of(0), Some(Cell::new(2, 1)));
        assert_eq!(grid.cell_of(2), Some(Cell::new(0, 0)));
        assert_eq!(grid.courses_on_day(2), 2);
    }

    #[test]
    fn test_structural_equality_ignores_insertion_order() {
        let mut a = GridAssignment::new(shape(), 2);
        a.place(0, Cell::new(1, 1));
        a.place(1, Cell::new(1, 1));

        let mut b = GridAssignment::new(shape(), 2);
        b.place(1, Cell::new(1, 1));
        b.place(0, Cell::new(1, 1));

        assert_eq!(a, b);
        b.relocate(1, Cell::new(1, 2));
        assert_ne!(a, b);
    }
}
