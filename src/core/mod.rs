//! Core module for the exam timetabling engine

pub mod clash;
pub mod config;
pub mod enrollment;
pub mod loader;
pub mod models;
pub mod placement;
pub mod policy;
pub mod population;
pub mod report;
pub mod scoring;
pub mod search;

/// Returns the current version of the `exam-scheduler` crate
#[must_use]
pub const fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
