//! Data models for exam scheduling

pub mod course;
pub mod grid;
pub mod preassignment;
pub mod student;

pub use course::{Course, CourseIdx, UNKNOWN_COURSE_NAME};
pub use grid::{Cell, GridAssignment, GridShape, MAX_SLOTS_PER_DAY};
pub use preassignment::PreAssignment;
pub use student::{Student, StudentIdx};
