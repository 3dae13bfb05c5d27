//! Consecutive-exam scoring
//!
//! For every student and day the scorer finds the longest run of adjacent
//! slots holding one of the student's exams and maps its length to a penalty
//! through a [`TierTable`]. The run length equal to the number of slots in a
//! day is the *worst tier*: a schedule that contains it is ranked below every
//! schedule that does not, whatever the totals.

use crate::core::enrollment::EnrollmentIndex;
use crate::core::models::{CourseIdx, GridAssignment, GridShape, StudentIdx, MAX_SLOTS_PER_DAY};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Smallest penalty accepted for the worst tier of a derived table
const WORST_TIER_FLOOR: u64 = 1000;

/// Penalty per consecutive-run length
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierTable {
    /// `penalties[n - 1]` is the penalty for a run of `n` exams
    penalties: Vec<u64>,
}

impl TierTable {
    /// Build a table from penalties for run lengths `1..=slots_per_day`.
    ///
    /// # Errors
    /// Returns an error when fewer than two tiers are given, more than
    /// [`MAX_SLOTS_PER_DAY`], or the penalties are not strictly increasing.
    pub fn new(penalties: Vec<u64>) -> Result<Self, String> {
        if penalties.len() < 2 || penalties.len() > MAX_SLOTS_PER_DAY {
            return Err(format!(
                "A tier table needs between 2 and {MAX_SLOTS_PER_DAY} entries (got {})",
                penalties.len()
            ));
        }
        if let Some(w) = penalties.windows(2).position(|w| w[0] >= w[1]) {
            return Err(format!(
                "Tier penalties must strictly increase with run length (run {} = {}, run {} = {})",
                w + 1,
                penalties[w],
                w + 2,
                penalties[w + 1]
            ));
        }
        Ok(Self { penalties })
    }

    /// Default table for a day of `slots_per_day` slots: 1→0, 2→2, 3→5, then
    /// doubling plus one, with the worst tier at least 1000 and at least
    /// 100× the tier below it.
    #[must_use]
    pub fn for_slots(slots_per_day: usize) -> Self {
        let width = slots_per_day.clamp(2, MAX_SLOTS_PER_DAY);
        let mut penalties = Vec::with_capacity(width);
        for run in 1..width {
            let penalty = match run {
                1 => 0,
                2 => 2,
                3 => 5,
                _ => penalties
                    .last()
                    .copied()
                    .unwrap_or(0u64)
                    .saturating_mul(2)
                    .saturating_add(1),
            };
            penalties.push(penalty);
        }
        let below = penalties.last().copied().unwrap_or(0);
        penalties.push(WORST_TIER_FLOOR.max(below.saturating_mul(100)));
        Self { penalties }
    }

    /// Four-slot mid-semester table: 1→0, 2→2, 3→5, 4→1000
    #[must_use]
    pub fn midsem() -> Self {
        Self {
            penalties: vec![0, 2, 5, 1000],
        }
    }

    /// Two-slot end-semester table: 1→0, 2→1000
    #[must_use]
    pub fn endsem() -> Self {
        Self {
            penalties: vec![0, 1000],
        }
    }

    /// Penalty for a run of `run` exams; runs longer than the table use the
    /// worst tier
    #[must_use]
    pub fn penalty(&self, run: usize) -> u64 {
        match run {
            0 => 0,
            n => self.penalties[n.min(self.penalties.len()) - 1],
        }
    }

    /// Run length of the worst tier
    #[must_use]
    pub fn worst_run(&self) -> usize {
        self.penalties.len()
    }

    /// Run length of the tier just below the worst, when that tier is itself
    /// a back-to-back run (two or more exams)
    #[must_use]
    pub fn secondary_run(&self) -> Option<usize> {
        let run = self.penalties.len() - 1;
        (run >= 2).then_some(run)
    }

    /// All penalties, indexed by run length minus one
    #[must_use]
    pub fn penalties(&self) -> &[u64] {
        &self.penalties
    }
}

impl fmt::Display for TierTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .penalties
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}→{p}", i + 1))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Objective value of a grid. Orders worst-tier-free schedules first, then
/// by ascending total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Score {
    /// Whether any student reached the worst tier on any day
    pub has_worst_tier: bool,
    /// Sum of penalties over all students and days
    pub total: u64,
}

impl Score {
    /// `self` is preferred to `other`: it drops the worst tier, or keeps the
    /// same flag with a strictly lower total
    #[must_use]
    pub fn is_better_than(&self, other: &Self) -> bool {
        self < other
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.has_worst_tier
            .cmp(&other.has_worst_tier)
            .then(self.total.cmp(&other.total))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_worst_tier {
            write!(f, "{} (worst tier present)", self.total)
        } else {
            write!(f, "{}", self.total)
        }
    }
}

/// One student's load on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayLoad {
    /// Day index
    pub day: usize,
    /// Exams on that day
    pub exams: usize,
    /// Longest consecutive run
    pub longest_run: usize,
    /// Penalty of that run
    pub penalty: u64,
}

/// One student's per-day breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentLoad {
    /// Student id
    pub student: String,
    /// Sum of the daily penalties
    pub total: u64,
    /// One entry per day of the grid
    pub days: Vec<DayLoad>,
}

/// Full score with the per-student run-length table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// Aggregate score
    pub score: Score,
    /// Per-student breakdown, in index order
    pub students: Vec<StudentLoad>,
}

/// Longest run of one student on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    /// Student index
    pub student: StudentIdx,
    /// Day index
    pub day: usize,
    /// Run length
    pub length: usize,
    /// Courses forming the run, in slot order
    pub courses: Vec<CourseIdx>,
}

/// How many students, and how many (student, day) pairs, sit one tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TierLoad {
    /// Distinct students with at least one day at the tier
    pub students: usize,
    /// Days at the tier, summed over students
    pub pairs: usize,
}

impl TierLoad {
    /// Neither count is higher than in `before`
    #[must_use]
    pub const fn no_worse_than(&self, before: &Self) -> bool {
        self.students <= before.students && self.pairs <= before.pairs
    }
}

/// Longest block of set bits, plus the slot where it starts
const fn longest_run(mask: u64) -> (usize, usize) {
    let mut best = 0;
    let mut best_start = 0;
    let mut current = 0;
    let mut slot = 0;
    while slot < 64 {
        if mask & (1u64 << slot) == 0 {
            current = 0;
        } else {
            current += 1;
            if current > best {
                best = current;
                best_start = slot + 1 - current;
            }
        }
        slot += 1;
    }
    (best, best_start)
}

/// Scores grids against one enrollment index and tier table
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    index: &'a EnrollmentIndex,
    tiers: &'a TierTable,
    shape: GridShape,
}

impl<'a> Scorer<'a> {
    /// Create a scorer
    #[must_use]
    pub const fn new(index: &'a EnrollmentIndex, tiers: &'a TierTable, shape: GridShape) -> Self {
        Self {
            index,
            tiers,
            shape,
        }
    }

    /// Tier table in use
    #[must_use]
    pub const fn tiers(&self) -> &'a TierTable {
        self.tiers
    }

    /// Enrollment index in use
    #[must_use]
    pub const fn index(&self) -> &'a EnrollmentIndex {
        self.index
    }

    /// Fill `masks` with one slot bitmask per day for a student
    fn day_masks(&self, grid: &GridAssignment, student: StudentIdx, masks: &mut [u64]) {
        masks.fill(0);
        for &course in &self.index.student(student).courses {
            if let Some(cell) = grid.cell_of(course) {
                masks[cell.day] |= 1u64 << cell.slot;
            }
        }
    }

    /// Total and worst-tier flag. Does not touch the grid.
    #[must_use]
    pub fn evaluate(&self, grid: &GridAssignment) -> Score {
        let worst = self.tiers.worst_run();
        let mut masks = vec![0u64; self.shape.days];
        let mut total = 0u64;
        let mut has_worst_tier = false;
        for student in 0..self.index.student_count() {
            self.day_masks(grid, student, &mut masks);
            for &mask in &masks {
                let (run, _) = longest_run(mask);
                total = total.saturating_add(self.tiers.penalty(run));
                has_worst_tier |= run >= worst;
            }
        }
        Score {
            has_worst_tier,
            total,
        }
    }

    /// Score plus the per-student, per-day table
    #[must_use]
    pub fn breakdown(&self, grid: &GridAssignment) -> ScoreReport {
        let worst = self.tiers.worst_run();
        let mut masks = vec![0u64; self.shape.days];
        let mut students = Vec::with_capacity(self.index.student_count());
        let mut score = Score {
            has_worst_tier: false,
            total: 0,
        };
        for student in 0..self.index.student_count() {
            self.day_masks(grid, student, &mut masks);
            let days: Vec<DayLoad> = masks
                .iter()
                .enumerate()
                .map(|(day, &mask)| {
                    let (run, _) = longest_run(mask);
                    DayLoad {
                        day,
                        exams: mask.count_ones() as usize,
                        longest_run: run,
                        penalty: self.tiers.penalty(run),
                    }
                })
                .collect();
            let total = days.iter().map(|d| d.penalty).sum::<u64>();
            score.total = score.total.saturating_add(total);
            score.has_worst_tier |= days.iter().any(|d| d.longest_run >= worst);
            students.push(StudentLoad {
                student: self.index.student(student).id.clone(),
                total,
                days,
            });
        }
        ScoreReport { score, students }
    }

    /// Longest run of every (student, day) pair whose run is at least
    /// `min_length` exams long
    #[must_use]
    pub fn runs(&self, grid: &GridAssignment, min_length: usize) -> Vec<RunRecord> {
        let mut masks = vec![0u64; self.shape.days];
        let mut records = Vec::new();
        for student in 0..self.index.student_count() {
            self.day_masks(grid, student, &mut masks);
            for (day, &mask) in masks.iter().enumerate() {
                let (length, start) = longest_run(mask);
                if length == 0 || length < min_length {
                    continue;
                }
                let mut courses: Vec<(usize, CourseIdx)> = self
                    .index
                    .student(student)
                    .courses
                    .iter()
                    .filter_map(|&c| grid.cell_of(c).map(|cell| (cell, c)))
                    .filter(|(cell, _)| {
                        cell.day == day && cell.slot >= start && cell.slot < start + length
                    })
                    .map(|(cell, c)| (cell.slot, c))
                    .collect();
                courses.sort_unstable();
                records.push(RunRecord {
                    student,
                    day,
                    length,
                    courses: courses.into_iter().map(|(_, c)| c).collect(),
                });
            }
        }
        records
    }

    /// Students and (student, day) pairs whose longest run is exactly `length`
    #[must_use]
    pub fn tier_load(&self, grid: &GridAssignment, length: usize) -> TierLoad {
        let mut masks = vec![0u64; self.shape.days];
        let mut load = TierLoad::default();
        for student in 0..self.index.student_count() {
            self.day_masks(grid, student, &mut masks);
            let days = masks
                .iter()
                .filter(|&&mask| longest_run(mask).0 == length)
                .count();
            if days > 0 {
                load.students += 1;
                load.pairs += days;
            }
        }
        load
    }

    /// Number of students with some day whose longest run is exactly `length`
    #[must_use]
    pub fn tier_count(&self, grid: &GridAssignment, length: usize) -> usize {
        self.tier_load(grid, length).students
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enrollment::EnrollmentRecord;
    use crate::core::models::Cell;

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run(0), (0, 0));
        assert_eq!(longest_run(0b1), (1, 0));
        assert_eq!(longest_run(0b1011), (2, 0));
        assert_eq!(longest_run(0b1110), (3, 1));
        assert_eq!(longest_run(u64::MAX), (64, 0));
    }

    #[test]
    fn test_builtin_tables() {
        assert_eq!(TierTable::for_slots(4), TierTable::midsem());
        assert_eq!(TierTable::for_slots(2), TierTable::endsem());
        assert_eq!(TierTable::for_slots(5).penalties(), &[0, 2, 5, 11, 1100]);
        assert_eq!(TierTable::midsem().secondary_run(), Some(3));
        assert_eq!(TierTable::endsem().secondary_run(), None);
    }

    #[test]
    fn test_penalties_monotone() {
        for spd in 2..=12 {
            let tiers = TierTable::for_slots(spd);
            assert_eq!(tiers.worst_run(), spd);
            for run in 1..=spd {
                assert!(tiers.penalty(run) >= tiers.penalty(run - 1));
            }
            assert!(tiers.penalty(spd) >= 1000);
            assert_eq!(tiers.penalty(spd + 3), tiers.penalty(spd));
        }
    }

    #[test]
    fn test_table_validation() {
        assert!(TierTable::new(vec![0]).is_err());
        assert!(TierTable::new(vec![0, 3, 3]).is_err());
        assert!(TierTable::new(vec![0, 4, 2]).is_err());
        assert!(TierTable::new(vec![0, 1, 50]).is_ok());
    }

    #[test]
    fn test_score_ordering() {
        let clean_high = Score {
            has_worst_tier: false,
            total: 900,
        };
        let worst_low = Score {
            has_worst_tier: true,
            total: 10,
        };
        let clean_low = Score {
            has_worst_tier: false,
            total: 4,
        };
        assert!(clean_high.is_better_than(&worst_low));
        assert!(clean_low.is_better_than(&clean_high));
        assert!(!clean_low.is_better_than(&clean_low));
    }

    #[test]
    fn test_evaluate_and_breakdown() {
        let index = EnrollmentIndex::from_records(&[
            EnrollmentRecord::new("s1", "A"),
            EnrollmentRecord::new("s1", "B"),
            EnrollmentRecord::new("s1", "C"),
            EnrollmentRecord::new("s1", "D"),
            EnrollmentRecord::new("s2", "A"),
            EnrollmentRecord::new("s2", "E"),
        ]);
        let shape = GridShape::new(2, 4).unwrap();
        let tiers = TierTable::midsem();
        let scorer = Scorer::new(&index, &tiers, shape);

        let mut grid = GridAssignment::new(shape, index.course_count());
        for (c, slot) in (0..4).zip(0..4) {
            grid.place(c, Cell::new(0, slot));
        }
        grid.place(4, Cell::new(1, 0));

        let score = scorer.evaluate(&grid);
        assert!(score.has_worst_tier);
        // s1: four in a row on day 0; s2: A on day 0 and E on day 1
        assert_eq!(score.total, 1000);
        assert_eq!(scorer.tier_count(&grid, 4), 1);

        let report = scorer.breakdown(&grid);
        assert_eq!(report.score, score);
        assert_eq!(report.students[0].days[0].longest_run, 4);
        assert_eq!(report.students[0].days[0].exams, 4);
        assert_eq!(report.students[1].days[1].longest_run, 1);

        let runs = scorer.runs(&grid, 2);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].courses, vec![0, 1, 2, 3]);

        grid.relocate(2, Cell::new(1, 3));
        let score = scorer.evaluate(&grid);
        assert!(!score.has_worst_tier);
        // s1: run of two then one on day 0, one on day 1
        assert_eq!(score.total, 2);
    }

    #[test]
    fn test_tier_load_counts_students_and_days() {
        // s has three in a row on days 0 and 1; t takes D plus two courses on day 2
        let index = EnrollmentIndex::from_records(&[
            EnrollmentRecord::new("s", "A"),
            EnrollmentRecord::new("s", "B"),
            EnrollmentRecord::new("s", "C"),
            EnrollmentRecord::new("s", "D"),
            EnrollmentRecord::new("s", "E"),
            EnrollmentRecord::new("s", "F"),
            EnrollmentRecord::new("t", "D"),
            EnrollmentRecord::new("t", "P"),
            EnrollmentRecord::new("t", "Q"),
        ]);
        let course = |code: &str| index.course_index(code).unwrap();
        let shape = GridShape::new(3, 4).unwrap();
        let tiers = TierTable::midsem();
        let scorer = Scorer::new(&index, &tiers, shape);

        let mut grid = GridAssignment::new(shape, index.course_count());
        for (slot, code) in ["A", "B", "C"].into_iter().enumerate() {
            grid.place(course(code), Cell::new(0, slot));
        }
        for (slot, code) in ["D", "E", "F"].into_iter().enumerate() {
            grid.place(course(code), Cell::new(1, slot));
        }
        grid.place(course("P"), Cell::new(2, 1));
        grid.place(course("Q"), Cell::new(2, 2));

        let before = scorer.tier_load(&grid, 3);
        assert_eq!(before, TierLoad { students: 1, pairs: 2 });
        assert_eq!(scorer.tier_count(&grid, 3), 1);

        // moving D breaks s's day-1 run but gives t a run on day 2
        grid.relocate(course("D"), Cell::new(2, 0));
        let after = scorer.tier_load(&grid, 3);
        assert_eq!(after, TierLoad { students: 2, pairs: 2 });
        assert!(!after.no_worse_than(&before));
        assert!(before.no_worse_than(&before));
    }
}
