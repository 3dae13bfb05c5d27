//! Course model

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dense index of a course inside an [`EnrollmentIndex`](crate::core::enrollment::EnrollmentIndex).
pub type CourseIdx = usize;

/// Display name used when a course code has no registered name.
pub const UNKNOWN_COURSE_NAME: &str = "Unknown Course";

/// Represents a course sitting one exam
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course code (e.g., "CS2510")
    pub code: String,

    /// Display name (e.g., "Data Structures")
    pub name: String,

    /// Indices of the enrolled students
    pub students: BTreeSet<usize>,
}

impl Course {
    /// Create a course with no enrolled students
    #[must_use]
    pub const fn new(code: String, name: String) -> Self {
        Self {
            code,
            name,
            students: BTreeSet::new(),
        }
    }

    /// Number of enrolled students
    #[must_use]
    pub fn size(&self) -> usize {
        self.students.len()
    }

    /// Whether the two courses share at least one student
    #[must_use]
    pub fn shares_students_with(&self, other: &Self) -> bool {
        // iterate the smaller set
        let (small, large) = if self.students.len() <= other.students.len() {
            (&self.students, &other.students)
        } else {
            (&other.students, &self.students)
        };
        small.iter().any(|s| large.contains(s))
    }

    /// `CODE: Name` label used by tabular exports
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}: {}", self.code, self.name)
    }
}
