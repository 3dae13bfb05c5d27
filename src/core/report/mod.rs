//! Report generation for candidate schedules
//!
//! A [`ReportContext`] gathers everything a format needs to render one ranked
//! candidate: its timetable, per-student views and statistics. Formats
//! implement [`ReportGenerator`].

pub mod formats;
pub mod stats;
pub mod views;

use crate::core::enrollment::EnrollmentIndex;
use crate::core::population::CandidateSchedule;
use crate::core::scoring::{Scorer, TierTable};
use std::error::Error;
use std::path::Path;

pub use formats::{CsvReporter, HtmlReporter, JsonReporter, MarkdownReporter, ReportFormat};
pub use stats::{RunEntry, RunGroup, ScheduleStats, StudentDistribution};
pub use views::{student_timetables, CourseEntry, DayRow, ExamPlacement, StudentTimetable, TabularView};

/// Data context for report generation
///
/// Built once per candidate; every format renders from the same context.
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    /// Enrollment index the schedule was built from
    pub index: &'a EnrollmentIndex,
    /// Tier table used for scoring
    pub tiers: &'a TierTable,
    /// Candidate being reported
    pub candidate: &'a CandidateSchedule,
    /// 1-based rank in the population
    pub rank: usize,
    /// Day-by-slot table
    pub table: TabularView,
    /// Per-student timetables
    pub timetables: Vec<StudentTimetable>,
    /// Statistics
    pub stats: ScheduleStats,
}

impl<'a> ReportContext<'a> {
    /// Create a report context for the candidate at `rank`
    #[must_use]
    pub fn new(scorer: &Scorer<'a>, candidate: &'a CandidateSchedule, rank: usize) -> Self {
        let index = scorer.index();
        Self {
            index,
            tiers: scorer.tiers(),
            candidate,
            rank,
            table: TabularView::from_grid(index, &candidate.grid),
            timetables: student_timetables(index, &candidate.grid),
            stats: ScheduleStats::compute(scorer, &candidate.grid),
        }
    }

    /// Version label, `v1` for the best candidate
    #[must_use]
    pub fn label(&self) -> String {
        format!("v{}", self.rank)
    }

    /// Grid shape as `days×slots`
    #[must_use]
    pub fn shape(&self) -> String {
        self.candidate.grid.shape().to_string()
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Generate a report to a file
    ///
    /// # Errors
    /// Returns an error if report generation or file writing fails
    fn generate(&self, ctx: &ReportContext, output_path: &Path) -> Result<(), Box<dyn Error>> {
        let content = self.render(ctx)?;
        std::fs::write(output_path, content)?;
        Ok(())
    }

    /// Generate report content as a string
    ///
    /// # Errors
    /// Returns an error if report generation fails
    fn render(&self, ctx: &ReportContext) -> Result<String, Box<dyn Error>>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::enrollment::{EnrollmentIndex, EnrollmentRecord};
    use crate::core::models::{Cell, GridAssignment, GridShape};
    use crate::core::population::CandidateSchedule;
    use crate::core::scoring::{Scorer, TierTable};

    /// Two students on a 2×4 grid; s1 sits A and B back to back
    pub fn candidate(tiers: &TierTable) -> (EnrollmentIndex, CandidateSchedule) {
        let index = EnrollmentIndex::from_records(&[
            EnrollmentRecord::new("s1", "A").with_name("Algebra"),
            EnrollmentRecord::new("s1", "B").with_name("Biology, Intro"),
            EnrollmentRecord::new("s2", "C").with_name("Chemistry"),
        ]);
        let shape = GridShape::new(2, 4).unwrap();
        let mut grid = GridAssignment::new(shape, 3);
        grid.place(0, Cell::new(0, 0));
        grid.place(1, Cell::new(0, 1));
        grid.place(2, Cell::new(0, 0));
        let scorer = Scorer::new(&index, tiers, shape);
        let candidate = CandidateSchedule {
            run: 0,
            seed: 7,
            score: scorer.evaluate(&grid),
            report: scorer.breakdown(&grid),
            grid,
        };
        (index, candidate)
    }
}
