//! Library for `exam-scheduler`
//! Builds clash-free exam timetables from enrollment data and ranks them by
//! how many back-to-back exams students sit

pub mod core;
pub mod logger;

pub use crate::core::config;
pub use crate::core::get_version;
