//! HTML report generator
//!
//! Renders a self-contained page (embedded CSS, no scripts) from the
//! `schedule.html` askama template.

use crate::core::report::views::CourseEntry;
use crate::core::report::{ReportContext, ReportGenerator};
use askama::Template;
use std::error::Error;

struct HtmlRow<'a> {
    label: String,
    cells: &'a [Vec<CourseEntry>],
}

struct HtmlRunGroup {
    length: usize,
    penalty: u64,
    count: usize,
}

struct HtmlRun<'a> {
    student: &'a str,
    day: usize,
    courses: String,
}

#[derive(Template)]
#[template(path = "schedule.html")]
struct SchedulePage<'a> {
    version: String,
    shape: String,
    course_count: usize,
    student_count: usize,
    score: u64,
    worst_tier: bool,
    slot_headers: Vec<String>,
    rows: Vec<HtmlRow<'a>>,
    run_groups: Vec<HtmlRunGroup>,
    long_runs: Vec<HtmlRun<'a>>,
    two_in_a_day: usize,
    three_in_a_day: usize,
    average_max_load: String,
}

/// HTML report generator
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlReporter;

impl HtmlReporter {
    /// Create a new HTML reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn page<'a>(ctx: &'a ReportContext) -> SchedulePage<'a> {
        let stats = &ctx.stats;
        SchedulePage {
            version: ctx.label(),
            shape: ctx.shape(),
            course_count: stats.course_count,
            student_count: stats.student_count,
            score: stats.total_score,
            worst_tier: stats.has_worst_tier,
            slot_headers: (1..=ctx.table.slots_per_day).map(|s| format!("Slot {s}")).collect(),
            rows: ctx
                .table
                .days
                .iter()
                .map(|row| HtmlRow {
                    label: format!("Day {}", row.day),
                    cells: &row.slots,
                })
                .collect(),
            run_groups: stats
                .runs_by_length
                .iter()
                .map(|g| HtmlRunGroup {
                    length: g.length,
                    penalty: g.penalty,
                    count: g.runs.len(),
                })
                .collect(),
            long_runs: stats
                .runs_by_length
                .iter()
                .filter(|g| g.length >= 3)
                .flat_map(|g| &g.runs)
                .map(|r| HtmlRun {
                    student: &r.student,
                    day: r.day,
                    courses: r.courses.join(" → "),
                })
                .collect(),
            two_in_a_day: stats.students_with_two_in_a_day,
            three_in_a_day: stats.students_with_three_in_a_day,
            average_max_load: format!("{:.2}", stats.average_max_daily_load),
        }
    }
}

impl ReportGenerator for HtmlReporter {
    fn render(&self, ctx: &ReportContext) -> Result<String, Box<dyn Error>> {
        Ok(Self::page(ctx).render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::test_support::candidate;
    use crate::core::scoring::{Scorer, TierTable};

    #[test]
    fn test_render_html() {
        let tiers = TierTable::midsem();
        let (index, cand) = candidate(&tiers);
        let scorer = Scorer::new(&index, &tiers, cand.grid.shape());
        let ctx = ReportContext::new(&scorer, &cand, 3);

        let html = HtmlReporter::new().render(&ctx).unwrap();
        assert!(html.contains("<title>Exam Timetable v3</title>"));
        assert!(html.contains("<span class=\"code\">B</span> Biology, Intro"));
        assert!(html.contains("no worst tier"));
        assert!(!html.contains("Runs of Three or More"));
    }
}
