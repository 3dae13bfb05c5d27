//! Enrollment index: course ↔ student mappings built once per optimization
//!
//! Courses and students are interned to dense indices. A course-conflict
//! adjacency list (two courses conflict when they share a student) is
//! precomputed so the clash checks in the placement and search loops are a
//! binary search rather than a set intersection.

use crate::core::models::{Course, CourseIdx, Student, StudentIdx, UNKNOWN_COURSE_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One raw `(student, course)` enrollment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Student identifier (roll number)
    pub student: String,
    /// Course code
    pub course_code: String,
    /// Course display name, when the source provides one
    pub course_name: Option<String>,
}

impl EnrollmentRecord {
    /// Create a record without a course name
    #[must_use]
    pub fn new(student: &str, course_code: &str) -> Self {
        Self {
            student: student.to_string(),
            course_code: course_code.to_string(),
            course_name: None,
        }
    }

    /// Attach a course name
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.course_name = Some(name.to_string());
        self
    }
}

/// Incrementally collects courses and enrollments
#[derive(Debug, Default)]
pub struct IndexBuilder {
    courses: Vec<Course>,
    students: Vec<Student>,
    course_lookup: HashMap<String, CourseIdx>,
    student_lookup: HashMap<String, StudentIdx>,
}

impl IndexBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a course (possibly with no students). A known course keeps
    /// its index; its name is filled in if it was still unknown.
    pub fn add_course(&mut self, code: &str, name: Option<&str>) -> CourseIdx {
        let code = code.trim();
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(&idx) = self.course_lookup.get(code) {
            if let Some(name) = name {
                let course = &mut self.courses[idx];
                if course.name == UNKNOWN_COURSE_NAME {
                    course.name = name.to_string();
                }
            }
            return idx;
        }
        let idx = self.courses.len();
        self.courses.push(Course::new(
            code.to_string(),
            name.unwrap_or(UNKNOWN_COURSE_NAME).to_string(),
        ));
        self.course_lookup.insert(code.to_string(), idx);
        idx
    }

    fn add_student(&mut self, id: &str) -> StudentIdx {
        let id = id.trim();
        if let Some(&idx) = self.student_lookup.get(id) {
            return idx;
        }
        let idx = self.students.len();
        self.students.push(Student::new(id.to_string()));
        self.student_lookup.insert(id.to_string(), idx);
        idx
    }

    /// Record one enrollment; repeated pairs are ignored
    pub fn add_enrollment(&mut self, record: &EnrollmentRecord) {
        let course = self.add_course(&record.course_code, record.course_name.as_deref());
        let student = self.add_student(&record.student);
        self.courses[course].students.insert(student);
        self.students[student].courses.insert(course);
    }

    /// Record every enrollment from an iterator
    pub fn extend<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a EnrollmentRecord>,
    {
        for record in records {
            self.add_enrollment(record);
        }
    }

    /// Freeze into a read-only index
    #[must_use]
    pub fn build(self) -> EnrollmentIndex {
        let mut neighbors: Vec<BTreeSet<CourseIdx>> = vec![BTreeSet::new(); self.courses.len()];
        for student in &self.students {
            for &a in &student.courses {
                for &b in &student.courses {
                    if a != b {
                        neighbors[a].insert(b);
                    }
                }
            }
        }

        EnrollmentIndex {
            courses: self.courses,
            students: self.students,
            course_lookup: self.course_lookup,
            student_lookup: self.student_lookup,
            neighbors: neighbors
                .into_iter()
                .map(|set| set.into_iter().collect())
                .collect(),
        }
    }
}

/// Read-only course ↔ student index shared by every optimizer run
#[derive(Debug, Clone, Default)]
pub struct EnrollmentIndex {
    courses: Vec<Course>,
    students: Vec<Student>,
    course_lookup: HashMap<String, CourseIdx>,
    student_lookup: HashMap<String, StudentIdx>,
    neighbors: Vec<Vec<CourseIdx>>,
}

impl EnrollmentIndex {
    /// Build an index straight from enrollment records
    #[must_use]
    pub fn from_records(records: &[EnrollmentRecord]) -> Self {
        let mut builder = IndexBuilder::new();
        builder.extend(records);
        builder.build()
    }

    /// All courses, by index
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// All students, by index
    #[must_use]
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Course at an index
    ///
    /// # Panics
    /// Panics if the index is out of range.
    #[must_use]
    pub fn course(&self, idx: CourseIdx) -> &Course {
        &self.courses[idx]
    }

    /// Student at an index
    ///
    /// # Panics
    /// Panics if the index is out of range.
    #[must_use]
    pub fn student(&self, idx: StudentIdx) -> &Student {
        &self.students[idx]
    }

    /// Number of courses
    #[must_use]
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    /// Number of students
    #[must_use]
    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// Index of a course code
    #[must_use]
    pub fn course_index(&self, code: &str) -> Option<CourseIdx> {
        self.course_lookup.get(code.trim()).copied()
    }

    /// Index of a student id
    #[must_use]
    pub fn student_index(&self, id: &str) -> Option<StudentIdx> {
        self.student_lookup.get(id.trim()).copied()
    }

    /// Courses sharing at least one student with `course`, sorted
    #[must_use]
    pub fn neighbors(&self, course: CourseIdx) -> &[CourseIdx] {
        &self.neighbors[course]
    }

    /// Whether two distinct courses share a student
    #[must_use]
    pub fn clashes_with(&self, a: CourseIdx, b: CourseIdx) -> bool {
        a != b && self.neighbors[a].binary_search(&b).is_ok()
    }

    /// Course code → enrolled student ids
    #[must_use]
    pub fn course_to_students(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        self.courses
            .iter()
            .map(|c| {
                let students = c
                    .students
                    .iter()
                    .map(|&s| self.students[s].id.as_str())
                    .collect();
                (c.code.as_str(), students)
            })
            .collect()
    }

    /// Student id → enrolled course codes
    #[must_use]
    pub fn student_to_courses(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        self.students
            .iter()
            .map(|s| {
                let courses = s
                    .courses
                    .iter()
                    .map(|&c| self.courses[c].code.as_str())
                    .collect();
                (s.id.as_str(), courses)
            })
            .collect()
    }
}
