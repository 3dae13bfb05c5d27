//! Student model

use super::course::CourseIdx;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dense index of a student inside an [`EnrollmentIndex`](crate::core::enrollment::EnrollmentIndex).
pub type StudentIdx = usize;

/// A student and the courses they sit exams for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Opaque identifier (roll number)
    pub id: String,
    /// Indices of enrolled courses
    pub courses: BTreeSet<CourseIdx>,
}

impl Student {
    /// Create a student with no enrollments
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self {
            id,
            courses: BTreeSet::new(),
        }
    }

    /// Whether the student sits the given course
    #[must_use]
    pub fn takes(&self, course: CourseIdx) -> bool {
        self.courses.contains(&course)
    }
}
