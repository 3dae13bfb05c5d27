//! CLI command handlers for `examsched`.
//!
//! Each command is implemented in its own submodule. Handlers return the
//! process exit status.

pub mod check;
pub mod config;
pub mod generate;

use crate::args::ShapeArgs;
use exam_scheduler::config::Config;
use exam_scheduler::core::enrollment::{EnrollmentIndex, EnrollmentRecord};
use exam_scheduler::core::loader;
use exam_scheduler::core::models::{GridShape, PreAssignment};
use exam_scheduler::core::policy::Policy;
use exam_scheduler::{error, info};
use std::path::Path;

/// Policy and grid shape from the command flags, falling back to config
pub fn resolve_shape(args: &ShapeArgs, config: &Config) -> Result<(Policy, GridShape), String> {
    let policy = config
        .optimizer
        .policy()
        .map_err(|e| format!("✗ {e}"))?;
    let default = policy.shape();
    let shape = GridShape::new(
        args.days.unwrap_or(default.days),
        args.slots_per_day.unwrap_or(default.slots_per_day),
    )
    .map_err(|e| format!("✗ Invalid grid shape: {e}"))?;
    Ok((policy, shape))
}

/// Load enrollments and an optional pre-assignment, then build the index
pub fn load_inputs(
    enrollments: &Path,
    slots: Option<&Path>,
) -> Result<(EnrollmentIndex, Option<PreAssignment>), String> {
    let records: Vec<EnrollmentRecord> = loader::load_enrollments(enrollments).map_err(|e| {
        error!("Failed to load enrollments {}: {e}", enrollments.display());
        format!("✗ Failed to load {}: {e}", enrollments.display())
    })?;

    let pre = match slots {
        Some(path) => Some(loader::load_preassignment(path).map_err(|e| {
            error!("Failed to load slots {}: {e}", path.display());
            format!("✗ Failed to load {}: {e}", path.display())
        })?),
        None => None,
    };

    let index = loader::build_index(&records, pre.as_ref());
    info!(
        "Loaded {} courses and {} students from {}",
        index.course_count(),
        index.student_count(),
        enrollments.display()
    );
    Ok((index, pre))
}
