//! Projections of a schedule for export: per-student timetables and the
//! day-by-slot table

use crate::core::enrollment::EnrollmentIndex;
use crate::core::models::{Cell, GridAssignment};
use serde::Serialize;
use std::collections::BTreeMap;

/// A course as shown in exported tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseEntry {
    /// Course code
    pub code: String,
    /// Display name
    pub name: String,
}

/// One exam in a student's timetable (1-based day and slot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamPlacement {
    /// Day, starting at 1
    pub day: usize,
    /// Slot within the day, starting at 1
    pub slot: usize,
    /// Flat slot number, starting at 1
    pub slot_number: usize,
    /// Course sat in that slot
    pub course: CourseEntry,
}

/// Every exam of one student, in chronological order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentTimetable {
    /// Student id
    pub student: String,
    /// Exams ordered by day, then slot
    pub exams: Vec<ExamPlacement>,
}

impl StudentTimetable {
    /// Keyed form used by the per-student export:
    /// `{"day1": {"slot2": {"code", "name"}}}`
    #[must_use]
    pub fn by_day(&self) -> BTreeMap<String, BTreeMap<String, CourseEntry>> {
        let mut days: BTreeMap<String, BTreeMap<String, CourseEntry>> = BTreeMap::new();
        for exam in &self.exams {
            days.entry(format!("day{}", exam.day))
                .or_default()
                .insert(format!("slot{}", exam.slot), exam.course.clone());
        }
        days
    }
}

fn entry(index: &EnrollmentIndex, course: usize) -> CourseEntry {
    let course = index.course(course);
    CourseEntry {
        code: course.code.clone(),
        name: course.name.clone(),
    }
}

/// Per-student view of a grid, one timetable per student in index order
#[must_use]
pub fn student_timetables(index: &EnrollmentIndex, grid: &GridAssignment) -> Vec<StudentTimetable> {
    let spd = grid.shape().slots_per_day;
    index
        .students()
        .iter()
        .map(|student| {
            let mut placed: Vec<(Cell, usize)> = student
                .courses
                .iter()
                .filter_map(|&c| grid.cell_of(c).map(|cell| (cell, c)))
                .collect();
            placed.sort_unstable();
            StudentTimetable {
                student: student.id.clone(),
                exams: placed
                    .into_iter()
                    .map(|(cell, c)| ExamPlacement {
                        day: cell.day + 1,
                        slot: cell.slot + 1,
                        slot_number: cell.slot_number(spd),
                        course: entry(index, c),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// One day of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRow {
    /// Day, starting at 1
    pub day: usize,
    /// Courses per slot, sorted by code
    pub slots: Vec<Vec<CourseEntry>>,
}

/// Day-by-slot table of course codes and names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabularView {
    /// Slots per day
    pub slots_per_day: usize,
    /// One row per day
    pub days: Vec<DayRow>,
}

impl TabularView {
    /// Project a grid
    #[must_use]
    pub fn from_grid(index: &EnrollmentIndex, grid: &GridAssignment) -> Self {
        let shape = grid.shape();
        let days = (0..shape.days)
            .map(|day| DayRow {
                day: day + 1,
                slots: (0..shape.slots_per_day)
                    .map(|slot| {
                        let mut courses: Vec<CourseEntry> = grid
                            .group(Cell::new(day, slot))
                            .iter()
                            .map(|&c| entry(index, c))
                            .collect();
                        courses.sort_by(|a, b| a.code.cmp(&b.code));
                        courses
                    })
                    .collect(),
            })
            .collect();
        Self {
            slots_per_day: shape.slots_per_day,
            days,
        }
    }

    /// Courses keyed by flat 1-based slot number, the shape pre-assignment
    /// files use
    #[must_use]
    pub fn by_slot_number(&self) -> BTreeMap<usize, Vec<CourseEntry>> {
        let mut slots = BTreeMap::new();
        for row in &self.days {
            for (slot, courses) in row.slots.iter().enumerate() {
                let number = (row.day - 1) * self.slots_per_day + slot + 1;
                slots.insert(number, courses.clone());
            }
        }
        slots
    }
}
