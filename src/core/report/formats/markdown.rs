//! Markdown report generator
//!
//! Renders a candidate as a timetable table plus run statistics. These
//! reports render well in GitHub, GitLab, and VS Code.

use crate::core::report::{ReportContext, ReportGenerator};
use std::error::Error;
use std::fmt::Write;

/// Embedded Markdown report template
const MARKDOWN_TEMPLATE: &str = include_str!("../templates/report.md");

/// Markdown report generator
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// Create a new Markdown reporter
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render the report using template substitution
    #[allow(clippy::unused_self)]
    fn render_template(&self, ctx: &ReportContext) -> String {
        let mut output = MARKDOWN_TEMPLATE.to_string();
        let stats = &ctx.stats;

        // Header
        output = output.replace("{{version}}", &ctx.label());
        output = output.replace("{{shape}}", &ctx.shape());
        output = output.replace("{{course_count}}", &stats.course_count.to_string());
        output = output.replace("{{student_count}}", &stats.student_count.to_string());
        output = output.replace("{{score}}", &stats.total_score.to_string());
        output = output.replace("{{worst_tier}}", if stats.has_worst_tier { "yes" } else { "no" });
        output = output.replace("{{penalties}}", &ctx.tiers.to_string());
        output = output.replace("{{run}}", &ctx.candidate.run.to_string());
        output = output.replace("{{seed}}", &ctx.candidate.seed.to_string());

        // Load figures
        output = output.replace("{{two_in_a_day}}", &stats.students_with_two_in_a_day.to_string());
        output = output.replace(
            "{{three_in_a_day}}",
            &stats.students_with_three_in_a_day.to_string(),
        );
        output = output.replace(
            "{{average_max_load}}",
            &format!("{:.2}", stats.average_max_daily_load),
        );

        output = output.replace("{{timetable}}", &Self::generate_timetable(ctx));
        output = output.replace("{{run_summary}}", &Self::generate_run_summary(ctx));
        output = output.replace("{{run_details}}", &Self::generate_run_details(ctx));

        output
    }

    /// Day-by-slot table; cells list `CODE Name` separated by `<br>`
    fn generate_timetable(ctx: &ReportContext) -> String {
        let mut table = String::from("| Day |");
        for slot in 1..=ctx.table.slots_per_day {
            let _ = write!(table, " Slot {slot} |");
        }
        table.push_str("\n|---|");
        table.push_str(&"---|".repeat(ctx.table.slots_per_day));
        table.push('\n');

        for row in &ctx.table.days {
            let _ = write!(table, "| {} |", row.day);
            for courses in &row.slots {
                let cell = courses
                    .iter()
                    .map(|c| format!("**{}** {}", c.code, c.name.replace('|', "\\|")))
                    .collect::<Vec<_>>()
                    .join("<br>");
                let _ = write!(table, " {cell} |");
            }
            table.push('\n');
        }
        table
    }

    fn generate_run_summary(ctx: &ReportContext) -> String {
        let mut table = String::from("| Run length | Penalty | Student-days |\n|---|---|---|\n");
        for group in &ctx.stats.runs_by_length {
            let _ = writeln!(
                table,
                "| {} | {} | {} |",
                group.length,
                group.penalty,
                group.runs.len()
            );
        }
        table
    }

    /// Lists every run of three or more exams
    fn generate_run_details(ctx: &ReportContext) -> String {
        let mut out = String::new();
        for group in ctx.stats.runs_by_length.iter().filter(|g| g.length >= 3) {
            if group.runs.is_empty() {
                continue;
            }
            let _ = writeln!(out, "### {} in a row\n", group.length);
            for run in &group.runs {
                let _ = writeln!(
                    out,
                    "- {} on day {}: {}",
                    run.student,
                    run.day,
                    run.courses.join(" → ")
                );
            }
            out.push('\n');
        }
        out
    }
}

impl ReportGenerator for MarkdownReporter {
    fn render(&self, ctx: &ReportContext) -> Result<String, Box<dyn Error>> {
        Ok(self.render_template(ctx))
    }
}
