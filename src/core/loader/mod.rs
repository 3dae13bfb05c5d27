//! Input loading for enrollments and pre-assignments
//!
//! Enrollments come from a CSV export or the registration JSON export;
//! pre-assignments come from a slot-number-keyed JSON object.

pub mod csv_parser;
pub mod json;

pub use csv_parser::{parse_enrollment_csv, parse_enrollment_csv_str};
pub use json::{parse_applications_json, parse_preassignment_json};

use crate::core::enrollment::{EnrollmentIndex, EnrollmentRecord, IndexBuilder};
use crate::core::models::PreAssignment;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Load enrollment records, choosing the parser by file extension
/// (`.json` for registration exports, anything else as CSV)
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub fn load_enrollments<P: AsRef<Path>>(path: P) -> Result<Vec<EnrollmentRecord>, Box<dyn Error>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let records = if is_json {
        parse_applications_json(&fs::read_to_string(path)?)?
    } else {
        parse_enrollment_csv(path)?
    };
    crate::debug!("Loaded {} enrollments from {}", records.len(), path.display());
    Ok(records)
}

/// Load a pre-assignment JSON file
///
/// # Errors
/// Returns an error if the file cannot be read or parsed
pub fn load_preassignment<P: AsRef<Path>>(path: P) -> Result<PreAssignment, Box<dyn Error>> {
    let path = path.as_ref();
    let pre = parse_preassignment_json(&fs::read_to_string(path)?)?;
    crate::debug!(
        "Loaded {} pre-assigned courses in {} slots from {}",
        pre.course_count(),
        pre.max_slot_number(),
        path.display()
    );
    Ok(pre)
}

/// Build the enrollment index, registering every pre-assigned course so it
/// gets placed even when nobody is enrolled in it
#[must_use]
pub fn build_index(records: &[EnrollmentRecord], pre: Option<&PreAssignment>) -> EnrollmentIndex {
    let mut builder = IndexBuilder::new();
    builder.extend(records);
    if let Some(pre) = pre {
        for (_, codes) in pre.iter() {
            for code in codes {
                builder.add_course(code, pre.name_of(code));
            }
        }
    }
    builder.build()
}
