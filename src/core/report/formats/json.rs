//! JSON export of a candidate and its statistics

use crate::core::report::stats::ScheduleStats;
use crate::core::report::views::{CourseEntry, DayRow};
use crate::core::report::{ReportContext, ReportGenerator};
use crate::core::scoring::StudentLoad;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;

/// Serialized candidate
#[derive(Debug, Serialize)]
struct CandidateDocument<'a> {
    version: String,
    run: usize,
    seed: u64,
    shape: String,
    score: u64,
    has_worst_tier: bool,
    penalties: &'a [u64],
    timetable: &'a [DayRow],
    slots: BTreeMap<usize, Vec<CourseEntry>>,
    students: &'a [StudentLoad],
    statistics: &'a ScheduleStats,
}

/// JSON report generator
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReporter;

impl JsonReporter {
    /// Create a new JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Per-student timetables keyed by student id, then `dayN`, then `slotM`
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn render_student_timetables(ctx: &ReportContext) -> Result<String, Box<dyn Error>> {
        let by_student: BTreeMap<&str, _> = ctx
            .timetables
            .iter()
            .map(|t| (t.student.as_str(), t.by_day()))
            .collect();
        Ok(serde_json::to_string_pretty(&by_student)?)
    }
}

impl ReportGenerator for JsonReporter {
    fn render(&self, ctx: &ReportContext) -> Result<String, Box<dyn Error>> {
        let doc = CandidateDocument {
            version: ctx.label(),
            run: ctx.candidate.run,
            seed: ctx.candidate.seed,
            shape: ctx.shape(),
            score: ctx.candidate.score.total,
            has_worst_tier: ctx.candidate.score.has_worst_tier,
            penalties: ctx.tiers.penalties(),
            timetable: &ctx.table.days,
            slots: ctx.table.by_slot_number(),
            students: &ctx.candidate.report.students,
            statistics: &ctx.stats,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::test_support::candidate;
    use crate::core::scoring::{Scorer, TierTable};

    #[test]
    fn test_render_json() {
        let tiers = TierTable::midsem();
        let (index, cand) = candidate(&tiers);
        let scorer = Scorer::new(&index, &tiers, cand.grid.shape());
        let ctx = ReportContext::new(&scorer, &cand, 2);

        let text = JsonReporter::new().render(&ctx).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], "v2");
        assert_eq!(value["score"], 2);
        assert_eq!(value["has_worst_tier"], false);
        assert_eq!(value["slots"]["2"][0]["code"], "B");
        assert_eq!(value["statistics"]["runs_by_length"][0]["runs"][0]["student"], "s1");
        assert_eq!(value["students"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_render_student_timetables() {
        let tiers = TierTable::midsem();
        let (index, cand) = candidate(&tiers);
        let scorer = Scorer::new(&index, &tiers, cand.grid.shape());
        let ctx = ReportContext::new(&scorer, &cand, 1);

        let text = JsonReporter::render_student_timetables(&ctx).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["s1"]["day1"]["slot2"]["name"], "Biology, Intro");
        assert_eq!(value["s2"]["day1"]["slot1"]["code"], "C");
    }
}
