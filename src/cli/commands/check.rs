//! Check command handler
//!
//! Validates an existing slot assignment against the enrollments and prints
//! every clash.

use super::{load_inputs, resolve_shape};
use crate::args::ShapeArgs;
use exam_scheduler::config::Config;
use exam_scheduler::core::clash::find_preassignment_clashes;
use exam_scheduler::{info, verbose};
use std::path::Path;

/// Run the check command and return the exit status
pub fn run(enrollments: &Path, slots: &Path, shape: &ShapeArgs, config: &Config) -> i32 {
    let (policy, shape) = match resolve_shape(shape, config) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };
    let (index, pre) = match load_inputs(enrollments, Some(slots)) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };
    let pre = pre.unwrap_or_default();

    verbose!(
        "Checking {} pre-assigned courses on a {shape} {policy} grid",
        pre.course_count()
    );
    if pre.max_slot_number() > shape.cell_count() {
        println!(
            "! Slots beyond {} do not fit the grid and will be redistributed by `generate`",
            shape.cell_count()
        );
    }

    let clashes = find_preassignment_clashes(&index, &pre, shape.slots_per_day);
    if clashes.is_empty() {
        info!("No clashes in {}", slots.display());
        println!("✓ No clashes found in {}", slots.display());
        return 0;
    }

    println!("✗ {} clash(es) found:", clashes.len());
    for clash in &clashes {
        println!("  - {clash}");
    }
    1
}
