//! Schedule statistics: consecutive-run counts and daily load

use crate::core::models::GridAssignment;
use crate::core::scoring::Scorer;
use serde::Serialize;

/// One consecutive run of a student on a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEntry {
    /// Student id
    pub student: String,
    /// Day, starting at 1
    pub day: usize,
    /// Course codes in slot order
    pub courses: Vec<String>,
}

/// All runs of one length
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunGroup {
    /// Run length
    pub length: usize,
    /// Penalty of that length
    pub penalty: u64,
    /// Runs of exactly this length
    pub runs: Vec<RunEntry>,
}

/// Exams per day for one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentDistribution {
    /// Student id
    pub student: String,
    /// Exams on each day
    pub per_day: Vec<usize>,
    /// Penalty total of the student
    pub score: u64,
}

/// Aggregate statistics of one schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStats {
    /// Total score
    pub total_score: u64,
    /// Whether the worst tier is present
    pub has_worst_tier: bool,
    /// Courses in the grid
    pub course_count: usize,
    /// Students in the index
    pub student_count: usize,
    /// Runs grouped by length, from 2 up to the worst tier
    pub runs_by_length: Vec<RunGroup>,
    /// Students with exactly two exams on some day
    pub students_with_two_in_a_day: usize,
    /// Students with exactly three exams on some day
    pub students_with_three_in_a_day: usize,
    /// Mean over students of their busiest day's exam count
    pub average_max_daily_load: f64,
    /// Per-student exam distribution
    pub distribution: Vec<StudentDistribution>,
}

impl ScheduleStats {
    /// Compute statistics of a grid
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(scorer: &Scorer<'_>, grid: &GridAssignment) -> Self {
        let index = scorer.index();
        let tiers = scorer.tiers();
        let report = scorer.breakdown(grid);
        let runs = scorer.runs(grid, 2);

        let runs_by_length = (2..=tiers.worst_run())
            .map(|length| RunGroup {
                length,
                penalty: tiers.penalty(length),
                runs: runs
                    .iter()
                    .filter(|r| r.length == length)
                    .map(|r| RunEntry {
                        student: index.student(r.student).id.clone(),
                        day: r.day + 1,
                        courses: r.courses.iter().map(|&c| index.course(c).code.clone()).collect(),
                    })
                    .collect(),
            })
            .collect();

        let distribution: Vec<StudentDistribution> = report
            .students
            .iter()
            .map(|load| StudentDistribution {
                student: load.student.clone(),
                per_day: load.days.iter().map(|d| d.exams).collect(),
                score: load.total,
            })
            .collect();

        let has_day_with = |n: usize| {
            distribution
                .iter()
                .filter(|d| d.per_day.contains(&n))
                .count()
        };
        let max_loads: usize = distribution
            .iter()
            .map(|d| d.per_day.iter().copied().max().unwrap_or(0))
            .sum();
        let average_max_daily_load = if distribution.is_empty() {
            0.0
        } else {
            max_loads as f64 / distribution.len() as f64
        };

        Self {
            total_score: report.score.total,
            has_worst_tier: report.score.has_worst_tier,
            course_count: grid.course_count(),
            student_count: index.student_count(),
            runs_by_length,
            students_with_two_in_a_day: has_day_with(2),
            students_with_three_in_a_day: has_day_with(3),
            average_max_daily_load,
            distribution,
        }
    }

    /// Number of runs of a length
    #[must_use]
    pub fn run_count(&self, length: usize) -> usize {
        self.runs_by_length
            .iter()
            .find(|g| g.length == length)
            .map_or(0, |g| g.runs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enrollment::{EnrollmentIndex, EnrollmentRecord};
    use crate::core::models::{Cell, GridShape};
    use crate::core::scoring::TierTable;

    #[test]
    fn test_stats_of_small_grid() {
        let index = EnrollmentIndex::from_records(&[
            EnrollmentRecord::new("s1", "A"),
            EnrollmentRecord::new("s1", "B"),
            EnrollmentRecord::new("s1", "C"),
            EnrollmentRecord::new("s2", "C"),
            EnrollmentRecord::new("s2", "D"),
        ]);
        let shape = GridShape::new(2, 4).unwrap();
        let tiers = TierTable::midsem();
        let scorer = Scorer::new(&index, &tiers, shape);

        // s1: A,B,C back to back on day 1; s2: C on day 1, D on day 2
        let mut grid = GridAssignment::new(shape, 4);
        for (course, slot) in [(0, 0), (1, 1), (2, 2)] {
            grid.place(course, Cell::new(0, slot));
        }
        grid.place(3, Cell::new(1, 0));

        let stats = ScheduleStats::compute(&scorer, &grid);
        assert_eq!(stats.total_score, 5);
        assert!(!stats.has_worst_tier);
        assert_eq!(stats.runs_by_length.len(), 3);
        assert_eq!(stats.run_count(2), 0);
        assert_eq!(stats.run_count(3), 1);
        assert_eq!(stats.runs_by_length[1].runs[0].courses, vec!["A", "B", "C"]);
        assert_eq!(stats.students_with_two_in_a_day, 0);
        assert_eq!(stats.students_with_three_in_a_day, 1);
        assert_eq!(stats.distribution[1].per_day, vec![1, 1]);
        assert!((stats.average_max_daily_load - 2.0).abs() < f64::EPSILON);
    }
}
