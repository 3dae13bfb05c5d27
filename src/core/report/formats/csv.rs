//! CSV timetable export
//!
//! One row per day, one column per slot. A cell lists its courses as
//! `CODE: Name`, one per line.

use crate::core::report::views::CourseEntry;
use crate::core::report::{ReportContext, ReportGenerator};
use std::error::Error;
use std::fmt::Write;

/// CSV timetable generator
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReporter;

impl CsvReporter {
    /// Create a new CSV reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn cell(courses: &[CourseEntry]) -> String {
        let text = courses
            .iter()
            .map(|c| format!("{}: {}", c.code, c.name))
            .collect::<Vec<_>>()
            .join("\n");
        escape(&text)
    }
}

/// Quote a field when it holds a separator, quote or line break
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl ReportGenerator for CsvReporter {
    fn render(&self, ctx: &ReportContext) -> Result<String, Box<dyn Error>> {
        let mut out = String::from("Day");
        for slot in 1..=ctx.table.slots_per_day {
            write!(out, ",Slot {slot}")?;
        }
        out.push('\n');

        for row in &ctx.table.days {
            write!(out, "Day {}", row.day)?;
            for courses in &row.slots {
                write!(out, ",{}", Self::cell(courses))?;
            }
            out.push('\n');
        }
        Ok(out)
    }
}
