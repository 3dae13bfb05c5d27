//! Clash checker: a student with two or more exams in one cell

use crate::core::enrollment::EnrollmentIndex;
use crate::core::models::{Cell, CourseIdx, GridAssignment, PreAssignment, StudentIdx};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One student examined on several courses in the same cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clash {
    /// Student id
    pub student: String,
    /// Offending cell
    pub cell: Cell,
    /// Flat 1-based slot number of the cell
    pub slot_number: usize,
    /// Codes of the student's courses in that cell, sorted
    pub courses: Vec<String>,
}

impl fmt::Display for Clash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "student {} has {} in slot {} ({})",
            self.student,
            self.courses.join(", "),
            self.slot_number,
            self.cell
        )
    }
}

/// Whether `course` can join `group` without a clash
#[must_use]
pub fn admits(index: &EnrollmentIndex, group: &[CourseIdx], course: CourseIdx) -> bool {
    group.iter().all(|&other| !index.clashes_with(other, course))
}

/// Whether any student sits two courses of the group
#[must_use]
pub fn group_has_clash(index: &EnrollmentIndex, group: &[CourseIdx]) -> bool {
    group
        .iter()
        .enumerate()
        .any(|(i, &a)| group[i + 1..].iter().any(|&b| index.clashes_with(a, b)))
}

/// Whether the whole grid satisfies the hard constraint
#[must_use]
pub fn is_clash_free(index: &EnrollmentIndex, grid: &GridAssignment) -> bool {
    grid.iter().all(|(_, group)| !group_has_clash(index, group))
}

fn clashes_in_group(
    index: &EnrollmentIndex,
    cell: Cell,
    slot_number: usize,
    group: &[CourseIdx],
    out: &mut Vec<Clash>,
) {
    let mut per_student: BTreeMap<StudentIdx, Vec<CourseIdx>> = BTreeMap::new();
    for &course in group {
        for &student in &index.course(course).students {
            per_student.entry(student).or_default().push(course);
        }
    }

    let mut found: Vec<Clash> = per_student
        .into_iter()
        .filter(|(_, courses)| courses.len() >= 2)
        .map(|(student, courses)| {
            let mut codes: Vec<String> = courses
                .iter()
                .map(|&c| index.course(c).code.clone())
                .collect();
            codes.sort();
            Clash {
                student: index.student(student).id.clone(),
                cell,
                slot_number,
                courses: codes,
            }
        })
        .collect();
    found.sort_by(|a, b| a.student.cmp(&b.student));
    out.append(&mut found);
}

/// Every clash in a grid, ordered by cell then student
#[must_use]
pub fn find_clashes(index: &EnrollmentIndex, grid: &GridAssignment) -> Vec<Clash> {
    let spd = grid.shape().slots_per_day;
    let mut clashes = Vec::new();
    for (cell, group) in grid.iter() {
        clashes_in_group(index, cell, cell.slot_number(spd), group, &mut clashes);
    }
    clashes
}

/// Every clash in a raw pre-assignment, including slots that lie beyond the
/// grid. Codes unknown to the index are ignored.
#[must_use]
pub fn find_preassignment_clashes(
    index: &EnrollmentIndex,
    pre: &PreAssignment,
    slots_per_day: usize,
) -> Vec<Clash> {
    let mut clashes = Vec::new();
    for (slot_number, codes) in pre.iter() {
        let Some(cell) = Cell::from_slot_number(slot_number, slots_per_day) else {
            continue;
        };
        let group: Vec<CourseIdx> = codes
            .iter()
            .filter_map(|code| index.course_index(code))
            .collect();
        clashes_in_group(index, cell, slot_number, &group, &mut clashes);
    }
    clashes
}
