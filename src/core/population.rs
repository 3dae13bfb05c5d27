//! Population manager: repeated independent runs, filtered, deduplicated
//! and ranked
//!
//! Each run draws its own seed from a master generator, builds an initial
//! grid and runs the local search. Runs share nothing but the read-only
//! enrollment index, so they are spread over a fixed pool of scoped worker
//! threads that pull run numbers from a shared counter. Results are merged
//! back in run order, which keeps a seeded optimization reproducible
//! whatever the worker count.

use crate::core::clash::{find_preassignment_clashes, is_clash_free, Clash};
use crate::core::enrollment::EnrollmentIndex;
use crate::core::models::{GridAssignment, GridShape, PreAssignment};
use crate::core::placement::{InitialPlacer, PlacementError};
use crate::core::policy::Policy;
use crate::core::scoring::{Score, ScoreReport, Scorer, TierTable};
use crate::core::search::{LocalSearch, SearchBudget, SearchContext};
use crate::logger::WORKER_THREAD_PREFIX;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Knobs of one optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationConfig {
    /// Independent runs
    pub runs: usize,
    /// Candidates returned
    pub keep: usize,
    /// Worker threads; 0 uses the available parallelism
    pub workers: usize,
    /// Master seed; `None` draws fresh randomness
    pub seed: Option<u64>,
    /// Drop schedules that still contain the worst tier
    pub discard_worst_tier: bool,
    /// Per-pass attempt budgets
    pub budget: SearchBudget,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            runs: 25,
            keep: 3,
            workers: 0,
            seed: None,
            discard_worst_tier: true,
            budget: SearchBudget::default(),
        }
    }
}

impl PopulationConfig {
    /// Check that at least one run is made and one candidate kept
    ///
    /// # Errors
    /// Names the first counter that is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.runs == 0 {
            return Err("'runs' must be at least 1".to_string());
        }
        if self.keep == 0 {
            return Err("'keep' must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Counters describing what happened to the runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Runs executed
    pub runs: usize,
    /// Runs whose initial placement failed
    pub failed: usize,
    /// Finished schedules dropped for containing the worst tier
    pub worst_tier_discarded: usize,
    /// Finished schedules identical to a better-ranked one
    pub duplicates: usize,
    /// Candidates returned
    pub kept: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} runs: {} failed placement, {} discarded for the worst tier, {} duplicates, {} kept",
            self.runs, self.failed, self.worst_tier_discarded, self.duplicates, self.kept
        )
    }
}

/// Why an optimization produced no population
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizeError {
    /// The pre-assignment already breaks the hard constraint
    InputClashes(Vec<Clash>),
    /// Grid shape rejected
    InvalidShape(String),
    /// Tier table does not fit the grid
    InvalidTiers(String),
    /// Population settings rejected
    InvalidConfig(String),
    /// A worker thread could not be started or panicked
    WorkerPool(String),
    /// Every run failed or was filtered out
    NoFeasibleSchedule(RunSummary),
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputClashes(clashes) => {
                write!(f, "Pre-assignment has {} clash(es)", clashes.len())
            }
            Self::InvalidShape(msg) => write!(f, "Invalid grid shape: {msg}"),
            Self::InvalidTiers(msg) => write!(f, "Invalid tier table: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "Invalid optimizer settings: {msg}"),
            Self::WorkerPool(msg) => write!(f, "Worker pool failure: {msg}"),
            Self::NoFeasibleSchedule(summary) => {
                write!(f, "No feasible schedule found under current constraints ({summary})")
            }
        }
    }
}

impl Error for OptimizeError {}

/// One finished, scored schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSchedule {
    /// Run that produced it
    pub run: usize,
    /// Seed of that run
    pub seed: u64,
    /// Final grid
    pub grid: GridAssignment,
    /// Final score
    pub score: Score,
    /// Per-student run-length table
    pub report: ScoreReport,
}

/// Ranked, duplicate-free candidates
#[derive(Debug, Clone)]
pub struct Population {
    /// Best first
    pub candidates: Vec<CandidateSchedule>,
    /// What happened to every run
    pub summary: RunSummary,
}

impl Population {
    /// Best candidate
    #[must_use]
    pub fn best(&self) -> Option<&CandidateSchedule> {
        self.candidates.first()
    }
}

type RunOutcome = Result<CandidateSchedule, PlacementError>;

/// Runs the full pipeline over one enrollment index
#[derive(Debug)]
pub struct Optimizer<'a> {
    index: &'a EnrollmentIndex,
    shape: GridShape,
    tiers: TierTable,
    config: PopulationConfig,
    search: LocalSearch,
}

impl<'a> Optimizer<'a> {
    /// Create an optimizer for an explicit shape and tier table
    ///
    /// # Errors
    /// Returns [`OptimizeError::InvalidShape`] for an unsupported shape,
    /// [`OptimizeError::InvalidTiers`] when the table's worst tier is not a
    /// full day, and [`OptimizeError::InvalidConfig`] when `runs` or `keep`
    /// is zero.
    pub fn new(
        index: &'a EnrollmentIndex,
        shape: GridShape,
        tiers: TierTable,
        config: PopulationConfig,
    ) -> Result<Self, OptimizeError> {
        let shape = GridShape::new(shape.days, shape.slots_per_day).map_err(OptimizeError::InvalidShape)?;
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        if tiers.worst_run() != shape.slots_per_day {
            return Err(OptimizeError::InvalidTiers(format!(
                "{} tiers for {} slots per day",
                tiers.worst_run(),
                shape.slots_per_day
            )));
        }
        Ok(Self {
            index,
            shape,
            tiers,
            config,
            search: LocalSearch::new(config.budget),
        })
    }

    /// Create an optimizer from a policy, optionally overriding its shape
    ///
    /// # Errors
    /// Same as [`Optimizer::new`].
    pub fn for_policy(
        index: &'a EnrollmentIndex,
        policy: Policy,
        shape: Option<GridShape>,
        mut config: PopulationConfig,
    ) -> Result<Self, OptimizeError> {
        let shape = shape.unwrap_or_else(|| policy.shape());
        config.discard_worst_tier = policy.discards_worst_tier();
        Self::new(index, shape, policy.tiers_for(shape.slots_per_day), config)
    }

    /// Grid shape in use
    #[must_use]
    pub const fn shape(&self) -> GridShape {
        self.shape
    }

    /// Tier table in use
    #[must_use]
    pub const fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    /// Scorer bound to this optimizer's index and tiers
    #[must_use]
    pub fn scorer(&self) -> Scorer<'_> {
        Scorer::new(self.index, &self.tiers, self.shape)
    }

    /// Check the pre-assignment, run every seed and rank the survivors.
    ///
    /// # Errors
    /// Returns [`OptimizeError::InputClashes`] before any run when the
    /// pre-assignment has clashes, [`OptimizeError::WorkerPool`] when a
    /// worker dies, and [`OptimizeError::NoFeasibleSchedule`] when nothing
    /// survives filtering.
    pub fn optimize(&self, pre: Option<&PreAssignment>) -> Result<Population, OptimizeError> {
        let pre = pre.filter(|p| !p.is_empty());
        if let Some(pre) = pre {
            let clashes = find_preassignment_clashes(self.index, pre, self.shape.slots_per_day);
            if !clashes.is_empty() {
                crate::warn!("Pre-assignment has {} clash(es), not optimizing", clashes.len());
                return Err(OptimizeError::InputClashes(clashes));
            }
            crate::info!(
                "Pre-assignment of {} course(s) is clash-free",
                pre.course_count()
            );
        }

        let seeds = self.run_seeds();
        let outcomes = self.run_all(&seeds, pre)?;
        let population = self.rank(outcomes);
        crate::info!("{}", population.summary);

        if population.candidates.is_empty() {
            return Err(OptimizeError::NoFeasibleSchedule(population.summary));
        }
        Ok(population)
    }

    fn run_seeds(&self) -> Vec<u64> {
        let mut master = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(rand::rng().next_u64()),
        };
        (0..self.config.runs).map(|_| master.next_u64()).collect()
    }

    fn worker_count(&self, runs: usize) -> usize {
        let wanted = match self.config.workers {
            0 => std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            n => n,
        };
        wanted.min(runs).max(1)
    }

    /// One full pipeline run
    fn run_once(&self, run: usize, seed: u64, pre: Option<&PreAssignment>) -> RunOutcome {
        crate::debug!("run {run}: start (seed {seed})");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placer = InitialPlacer::new(self.index, self.shape);
        let mut grid = match pre {
            Some(pre) => placer.from_preassignment(pre, &mut rng)?,
            None => placer.greedy(&mut rng)?,
        };

        let scorer = self.scorer();
        let mut ctx = SearchContext { scorer, rng, run };
        let score = self.search.run(&mut ctx, &mut grid);
        debug_assert!(is_clash_free(self.index, &grid));
        crate::debug!("run {run}: finished with score {score}");

        Ok(CandidateSchedule {
            run,
            seed,
            report: scorer.breakdown(&grid),
            grid,
            score,
        })
    }

    fn run_all(&self, seeds: &[u64], pre: Option<&PreAssignment>) -> Result<Vec<RunOutcome>, OptimizeError> {
        let workers = self.worker_count(seeds.len());
        let next = AtomicUsize::new(0);
        crate::debug!("{} run(s) on {workers} worker(s)", seeds.len());

        let mut collected: Vec<(usize, RunOutcome)> = std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for worker in 0..workers {
                let next = &next;
                let handle = std::thread::Builder::new()
                    .name(format!("{WORKER_THREAD_PREFIX}-{worker}"))
                    .spawn_scoped(scope, move || {
                        let mut done = Vec::new();
                        loop {
                            let run = next.fetch_add(1, Ordering::SeqCst);
                            let Some(&seed) = seeds.get(run) else {
                                break;
                            };
                            done.push((run, self.run_once(run, seed, pre)));
                        }
                        done
                    })
                    .map_err(|e| OptimizeError::WorkerPool(e.to_string()))?;
                handles.push(handle);
            }

            let mut all = Vec::with_capacity(seeds.len());
            for handle in handles {
                let done = handle
                    .join()
                    .map_err(|_| OptimizeError::WorkerPool("worker thread panicked".to_string()))?;
                all.extend(done);
            }
            Ok::<_, OptimizeError>(all)
        })?;

        collected.sort_by_key(|(run, _)| *run);
        Ok(collected.into_iter().map(|(_, outcome)| outcome).collect())
    }

    /// Filter, sort, deduplicate and truncate
    fn rank(&self, outcomes: Vec<RunOutcome>) -> Population {
        let mut summary = RunSummary {
            runs: outcomes.len(),
            ..RunSummary::default()
        };

        let mut finished = Vec::with_capacity(outcomes.len());
        for (run, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(candidate) => {
                    if self.config.discard_worst_tier && candidate.score.has_worst_tier {
                        summary.worst_tier_discarded += 1;
                    } else {
                        finished.push(candidate);
                    }
                }
                Err(e) => {
                    crate::warn!("run {run}: {e}");
                    summary.failed += 1;
                }
            }
        }

        finished.sort_by(|a, b| a.score.cmp(&b.score).then(a.run.cmp(&b.run)));

        let mut candidates: Vec<CandidateSchedule> = Vec::new();
        for candidate in finished {
            if candidates.iter().any(|kept| kept.grid == candidate.grid) {
                summary.duplicates += 1;
            } else {
                candidates.push(candidate);
            }
        }
        candidates.truncate(self.config.keep);
        summary.kept = candidates.len();

        Population {
            candidates,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::enrollment::EnrollmentRecord;

    fn index(pairs: &[(&str, &str)]) -> EnrollmentIndex {
        let records: Vec<EnrollmentRecord> = pairs
            .iter()
            .map(|(s, c)| EnrollmentRecord::new(s, c))
            .collect();
        EnrollmentIndex::from_records(&records)
    }

    fn config(seed: u64) -> PopulationConfig {
        PopulationConfig {
            runs: 8,
            keep: 3,
            workers: 3,
            seed: Some(seed),
            ..PopulationConfig::default()
        }
    }

    fn roster() -> EnrollmentIndex {
        index(&[
            ("s1", "A"),
            ("s1", "B"),
            ("s1", "C"),
            ("s2", "B"),
            ("s2", "D"),
            ("s3", "E"),
            ("s3", "F"),
            ("s3", "A"),
            ("s4", "G"),
            ("s4", "H"),
        ])
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let idx = roster();
        let a = Optimizer::for_policy(&idx, Policy::Midsem, None, config(42))
            .unwrap()
            .optimize(None)
            .unwrap();
        let mut single = config(42);
        single.workers = 1;
        let b = Optimizer::for_policy(&idx, Policy::Midsem, None, single)
            .unwrap()
            .optimize(None)
            .unwrap();

        assert_eq!(a.candidates.len(), b.candidates.len());
        for (x, y) in a.candidates.iter().zip(&b.candidates) {
            assert_eq!(x.grid, y.grid);
            assert_eq!(x.score, y.score);
        }
    }

    #[test]
    fn test_ranked_and_unique() {
        let idx = roster();
        let population = Optimizer::for_policy(&idx, Policy::Midsem, None, config(3))
            .unwrap()
            .optimize(None)
            .unwrap();

        assert!(!population.candidates.is_empty());
        assert!(population.candidates.len() <= 3);
        for pair in population.candidates.windows(2) {
            assert!(pair[0].score <= pair[1].score);
            assert_ne!(pair[0].grid, pair[1].grid);
        }
        for c in &population.candidates {
            assert!(is_clash_free(&idx, &c.grid));
            assert!(!c.score.has_worst_tier);
        }
        assert_eq!(population.summary.runs, 8);
    }

    #[test]
    fn test_zero_runs_or_keep_rejected() {
        let idx = roster();
        for config in [
            PopulationConfig { runs: 0, ..config(1) },
            PopulationConfig { keep: 0, ..config(1) },
        ] {
            let err = Optimizer::for_policy(&idx, Policy::Midsem, None, config).unwrap_err();
            assert!(matches!(err, OptimizeError::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_input_clashes_abort() {
        let idx = index(&[("s1", "A"), ("s1", "B"), ("s2", "C")]);
        let mut pre = PreAssignment::new();
        pre.insert(1, "A").unwrap();
        pre.insert(1, "B").unwrap();
        pre.insert(2, "C").unwrap();

        let err = Optimizer::for_policy(&idx, Policy::Midsem, None, config(1))
            .unwrap()
            .optimize(Some(&pre))
            .unwrap_err();
        match err {
            OptimizeError::InputClashes(clashes) => {
                assert_eq!(clashes.len(), 1);
                assert_eq!(clashes[0].student, "s1");
                assert_eq!(clashes[0].courses, vec!["A", "B"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_runs_failing_is_reported() {
        // five mutually clashing courses, four cells
        let idx = index(&[("s", "A"), ("s", "B"), ("s", "C"), ("s", "D"), ("s", "E")]);
        let shape = GridShape::new(2, 2).unwrap();
        let err = Optimizer::for_policy(&idx, Policy::Endsem, Some(shape), config(5))
            .unwrap()
            .optimize(None)
            .unwrap_err();
        match err {
            OptimizeError::NoFeasibleSchedule(summary) => {
                assert_eq!(summary.failed, 8);
                assert_eq!(summary.kept, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unavoidable_worst_tier_discarded() {
        // one day of two slots: a student with two exams always sits them back to back
        let idx = index(&[("s", "A"), ("s", "B")]);
        let shape = GridShape::new(1, 2).unwrap();
        let err = Optimizer::new(&idx, shape, TierTable::endsem(), config(9))
            .unwrap()
            .optimize(None)
            .unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::NoFeasibleSchedule(RunSummary {
                worst_tier_discarded: 8,
                ..
            })
        ));

        // the end-semester policy ranks such schedules instead
        let population = Optimizer::for_policy(&idx, Policy::Endsem, Some(shape), config(9))
            .unwrap()
            .optimize(None)
            .unwrap();
        assert!(population.best().unwrap().score.has_worst_tier);
        // both layouts are mirror images, at most two distinct grids exist
        assert!(population.candidates.len() <= 2);
    }

    #[test]
    fn test_tier_table_must_match_shape() {
        let idx = roster();
        let err = Optimizer::new(&idx, GridShape::new(7, 2).unwrap(), TierTable::midsem(), config(0)).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidTiers(_)));
        let err = Optimizer::new(
            &idx,
            GridShape {
                days: 0,
                slots_per_day: 4,
            },
            TierTable::midsem(),
            config(0),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidShape(_)));
    }
}
