//! JSON inputs: registration exports and slot pre-assignments

use crate::core::enrollment::EnrollmentRecord;
use crate::core::models::PreAssignment;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;

/// Registration export: `{"Applications": {"<id>": {...}}}`
#[derive(Debug, Deserialize)]
struct ApplicationsFile {
    #[serde(rename = "Applications")]
    applications: HashMap<String, Application>,
}

#[derive(Debug, Deserialize)]
struct Application {
    rollnumber: String,
    coursecode: String,
    #[serde(default)]
    coursename: Option<String>,
}

/// One course in a pre-assigned slot: a bare code or `{code, name}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SlotEntry {
    Code(String),
    Named {
        code: String,
        #[serde(default)]
        name: String,
    },
}

/// Parse a registration export into enrollment records
///
/// Entries are returned in the numeric order of their keys so the resulting
/// index is the same on every load.
///
/// # Errors
/// Returns an error if the JSON is malformed or an entry has an empty roll
/// number or course code
pub fn parse_applications_json(content: &str) -> Result<Vec<EnrollmentRecord>, Box<dyn Error>> {
    let file: ApplicationsFile = serde_json::from_str(content)?;

    let mut entries: Vec<(String, Application)> = file.applications.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| {
        match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => a.cmp(b),
        }
    });

    let mut records = Vec::with_capacity(entries.len());
    for (key, app) in entries {
        if app.rollnumber.trim().is_empty() || app.coursecode.trim().is_empty() {
            return Err(format!("Application {key}: missing roll number or course code").into());
        }
        let mut record = EnrollmentRecord::new(app.rollnumber.trim(), app.coursecode.trim());
        if let Some(name) = app.coursename.as_deref().filter(|n| !n.trim().is_empty()) {
            record = record.with_name(name.trim());
        }
        records.push(record);
    }
    Ok(records)
}

/// Parse a pre-assignment keyed by 1-based slot number
///
/// ```json
/// { "1": ["CS101", {"code": "MA101", "name": "Calculus"}], "2": [] }
/// ```
///
/// # Errors
/// Returns an error if the JSON is malformed, a key is not a positive
/// integer, or a course is listed twice
pub fn parse_preassignment_json(content: &str) -> Result<PreAssignment, Box<dyn Error>> {
    let raw: HashMap<String, Vec<SlotEntry>> = serde_json::from_str(content)?;

    let mut slots: Vec<(usize, Vec<SlotEntry>)> = Vec::with_capacity(raw.len());
    for (key, entries) in raw {
        let slot = key
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("Invalid slot number '{key}' (expected 1, 2, ...)"))?;
        slots.push((slot, entries));
    }
    slots.sort_by_key(|(slot, _)| *slot);

    let mut pre = PreAssignment::new();
    for (slot, entries) in slots {
        for entry in entries {
            match entry {
                SlotEntry::Code(code) => pre.insert(slot, code.trim())?,
                SlotEntry::Named { code, name } => pre.insert_named(slot, code.trim(), &name)?,
            }
        }
    }
    Ok(pre)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applications_in_key_order() {
        let json = r#"{"Applications": {
            "10": {"rollnumber": "s3", "coursecode": "PH101", "coursename": "Physics"},
            "2": {"rollnumber": "s1", "coursecode": "CS101", "coursename": "Intro"},
            "1": {"rollnumber": "s1", "coursecode": "MA101"}
        }}"#;
        let records = parse_applications_json(json).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], EnrollmentRecord::new("s1", "MA101"));
        assert_eq!(records[1].course_name.as_deref(), Some("Intro"));
        assert_eq!(records[2].student, "s3");
    }

    #[test]
    fn test_applications_missing_code() {
        let json = r#"{"Applications": {"1": {"rollnumber": "s1", "coursecode": " "}}}"#;
        assert!(parse_applications_json(json).is_err());
        assert!(parse_applications_json(r#"{"Students": {}}"#).is_err());
    }

    #[test]
    fn test_preassignment_mixed_entries() {
        let json = r#"{"2": [{"code": "MA101", "name": "Calculus"}], "1": ["CS101", "PH101"]}"#;
        let pre = parse_preassignment_json(json).unwrap();
        assert_eq!(pre.course_count(), 3);
        assert_eq!(pre.slot_of("PH101"), Some(1));
        assert_eq!(pre.slot_of("MA101"), Some(2));
        assert_eq!(pre.name_of("MA101"), Some("Calculus"));
        assert_eq!(pre.name_of("CS101"), None);
    }

    #[test]
    fn test_preassignment_rejects_bad_slots() {
        assert!(parse_preassignment_json(r#"{"0": ["A"]}"#).is_err());
        assert!(parse_preassignment_json(r#"{"x": ["A"]}"#).is_err());
        let err = parse_preassignment_json(r#"{"1": ["A"], "3": ["A"]}"#).unwrap_err();
        assert!(err.to_string().contains("listed in both"));
    }
}
