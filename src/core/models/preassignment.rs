//! Existing slot assignment supplied by the caller

use super::grid::{Cell, GridAssignment};
use crate::core::enrollment::EnrollmentIndex;
use std::collections::{BTreeMap, HashMap};

/// Flat 1-based slot number → course codes, as produced by an earlier
/// scheduling round or typed in by hand.
///
/// Slot numbers are independent of any grid shape; they are mapped to cells
/// with [`Cell::from_slot_number`] once the shape is known. A course appears
/// in at most one slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreAssignment {
    slots: BTreeMap<usize, Vec<String>>,
    slot_of: HashMap<String, usize>,
    names: HashMap<String, String>,
}

impl PreAssignment {
    /// Create an empty pre-assignment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a course to a slot
    ///
    /// # Errors
    /// Returns an error for slot number 0 or when the course is already
    /// listed in a slot.
    pub fn insert(&mut self, slot_number: usize, code: &str) -> Result<(), String> {
        if slot_number == 0 {
            return Err(format!("Slot numbers start at 1 (course {code})"));
        }
        if let Some(existing) = self.slot_of.get(code) {
            return Err(format!(
                "Course {code} is listed in both slot {existing} and slot {slot_number}"
            ));
        }
        self.slots
            .entry(slot_number)
            .or_default()
            .push(code.to_string());
        self.slot_of.insert(code.to_string(), slot_number);
        Ok(())
    }

    /// Add a course together with its display name
    ///
    /// # Errors
    /// Same as [`PreAssignment::insert`].
    pub fn insert_named(&mut self, slot_number: usize, code: &str, name: &str) -> Result<(), String> {
        self.insert(slot_number, code)?;
        if !name.trim().is_empty() {
            self.names.insert(code.to_string(), name.trim().to_string());
        }
        Ok(())
    }

    /// Whether no course is pre-assigned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot_of.is_empty()
    }

    /// Number of pre-assigned courses
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.slot_of.len()
    }

    /// Highest slot number in use
    #[must_use]
    pub fn max_slot_number(&self) -> usize {
        self.slots.keys().next_back().copied().unwrap_or(0)
    }

    /// Slot number of a course
    #[must_use]
    pub fn slot_of(&self, code: &str) -> Option<usize> {
        self.slot_of.get(code).copied()
    }

    /// Display name recorded alongside the course, if any
    #[must_use]
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Iterate `(slot number, codes)` in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> + '_ {
        self.slots.iter().map(|(n, codes)| (*n, codes.as_slice()))
    }

    /// Group the pre-assigned codes by cell for a given day width.
    /// Cells beyond the grid (overflow slots) are included.
    #[must_use]
    pub fn by_cell(&self, slots_per_day: usize) -> BTreeMap<Cell, Vec<String>> {
        let mut cells: BTreeMap<Cell, Vec<String>> = BTreeMap::new();
        for (slot_number, codes) in self.iter() {
            if let Some(cell) = Cell::from_slot_number(slot_number, slots_per_day) {
                cells.entry(cell).or_default().extend(codes.iter().cloned());
            }
        }
        cells
    }

    /// Capture a finished grid in slot-number form, so it can be fed back in
    /// as a pre-assignment.
    #[must_use]
    pub fn from_grid(grid: &GridAssignment, index: &EnrollmentIndex) -> Self {
        let spd = grid.shape().slots_per_day;
        let mut pre = Self::new();
        for (cell, group) in grid.iter() {
            for &course in group {
                let c = index.course(course);
                // codes are unique in the index, insert cannot fail
                let _ = pre.insert_named(cell.slot_number(spd), &c.code, &c.name);
            }
        }
        pre
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut pre = PreAssignment::new();
        pre.insert(3, "CS101").unwrap();
        pre.insert_named(3, "CS102", "Programming II").unwrap();
        pre.insert(9, "MA201").unwrap();

        assert_eq!(pre.course_count(), 3);
        assert_eq!(pre.max_slot_number(), 9);
        assert_eq!(pre.slot_of("CS102"), Some(3));
        assert_eq!(pre.name_of("CS102"), Some("Programming II"));
        assert_eq!(pre.name_of("CS101"), None);
    }

    #[test]
    fn test_duplicate_course_rejected() {
        let mut pre = PreAssignment::new();
        pre.insert(1, "CS101").unwrap();
        let err = pre.insert(2, "CS101").unwrap_err();
        assert!(err.contains("slot 1"));
        assert!(pre.insert(0, "X").is_err());
    }

    #[test]
    fn test_by_cell_includes_overflow() {
        let mut pre = PreAssignment::new();
        pre.insert(1, "A").unwrap();
        pre.insert(2, "B").unwrap();
        pre.insert(17, "C").unwrap();

        let cells = pre.by_cell(4);
        assert_eq!(cells[&Cell::new(0, 0)], vec!["A".to_string()]);
        assert_eq!(cells[&Cell::new(0, 1)], vec!["B".to_string()]);
        // slot 17 of a 4-wide grid lands on a fifth day
        assert_eq!(cells[&Cell::new(4, 0)], vec!["C".to_string()]);
    }
}
