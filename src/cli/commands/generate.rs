//! Generate command handler
//!
//! Runs the optimizer and writes each ranked candidate as `v1`, `v2`, ...
//! in the requested formats. Timetable formats (csv, json) go to `out_dir`,
//! reports (markdown, html) to `reports_dir`, unless `--output` is given.

use super::{load_inputs, resolve_shape};
use crate::args::ShapeArgs;
use exam_scheduler::config::Config;
use exam_scheduler::core::population::{OptimizeError, Optimizer, Population};
use exam_scheduler::core::report::{JsonReporter, ReportContext, ReportFormat};
use exam_scheduler::core::scoring::Scorer;
use exam_scheduler::{error, info, verbose};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Exit status for input clashes and other input errors
const EXIT_INPUT: i32 = 1;
/// Exit status when no schedule survives
const EXIT_NO_SCHEDULE: i32 = 2;

/// Arguments of the generate command
pub struct GenerateArgs<'a> {
    /// Enrollment file
    pub enrollments: &'a Path,
    /// Optional pre-assignment file
    pub slots: Option<&'a Path>,
    /// Policy and shape flags
    pub shape: &'a ShapeArgs,
    /// Explicit output directory
    pub output: Option<&'a Path>,
    /// Requested formats
    pub formats: &'a [String],
}

/// Run the generate command and return the exit status
pub fn run(args: &GenerateArgs<'_>, config: &Config) -> i32 {
    match generate(args, config) {
        Ok(()) => 0,
        Err(code) => code,
    }
}

fn parse_formats(formats: &[String]) -> Result<Vec<ReportFormat>, String> {
    let mut parsed = Vec::new();
    for f in formats {
        let format = ReportFormat::from_str(f).map_err(|e| format!("✗ {e}"))?;
        if !parsed.contains(&format) {
            parsed.push(format);
        }
    }
    Ok(parsed)
}

fn generate(args: &GenerateArgs<'_>, config: &Config) -> Result<(), i32> {
    let fail = |msg: String| {
        eprintln!("{msg}");
        EXIT_INPUT
    };

    let formats = parse_formats(args.formats).map_err(fail)?;
    let (policy, shape) = resolve_shape(args.shape, config).map_err(fail)?;
    let (index, pre) = load_inputs(args.enrollments, args.slots).map_err(fail)?;

    let population_config = config
        .optimizer
        .population_config()
        .map_err(|e| fail(format!("✗ {e}")))?;
    let optimizer = Optimizer::for_policy(&index, policy, Some(shape), population_config)
        .map_err(|e| fail(format!("✗ {e}")))?;

    verbose!(
        "Optimizing {} courses for {} students on a {shape} {policy} grid ({} runs)",
        index.course_count(),
        index.student_count(),
        population_config.runs
    );

    let population = match optimizer.optimize(pre.as_ref()) {
        Ok(population) => population,
        Err(err) => return Err(report_failure(&err)),
    };

    let scorer = optimizer.scorer();
    write_population(&population, &scorer, args, config, &formats).map_err(|e| {
        error!("Failed to write timetables: {e}");
        fail(format!("✗ Failed to write timetables: {e}"))
    })?;

    println!("✓ {}", population.summary);
    Ok(())
}

/// Print an optimizer failure and map it to an exit status
fn report_failure(err: &OptimizeError) -> i32 {
    match err {
        OptimizeError::InputClashes(clashes) => {
            eprintln!("✗ {err}; fix these before generating:");
            for clash in clashes {
                eprintln!("  - {clash}");
            }
            EXIT_INPUT
        }
        OptimizeError::NoFeasibleSchedule(summary) if summary.failed == summary.runs => {
            eprintln!("✗ Some course fits no slot even after displacing others ({summary})");
            EXIT_INPUT
        }
        OptimizeError::NoFeasibleSchedule(_) => {
            eprintln!("✗ {err}");
            EXIT_NO_SCHEDULE
        }
        other => {
            eprintln!("✗ {other}");
            EXIT_INPUT
        }
    }
}

fn write_population(
    population: &Population,
    scorer: &Scorer<'_>,
    args: &GenerateArgs<'_>,
    config: &Config,
    formats: &[ReportFormat],
) -> Result<(), Box<dyn Error>> {
    let out_dir = args
        .output
        .map_or_else(|| PathBuf::from(&config.paths.out_dir), Path::to_path_buf);
    let reports_dir = args
        .output
        .map_or_else(|| PathBuf::from(&config.paths.reports_dir), Path::to_path_buf);

    for (i, candidate) in population.candidates.iter().enumerate() {
        let ctx = ReportContext::new(scorer, candidate, i + 1);
        let label = ctx.label();
        let mut written = Vec::new();

        for &format in formats {
            let dir = match format {
                ReportFormat::Csv | ReportFormat::Json => &out_dir,
                ReportFormat::Markdown | ReportFormat::Html => &reports_dir,
            };
            fs::create_dir_all(dir)?;
            let path = dir.join(format!("{label}.{}", format.extension()));
            format.reporter().generate(&ctx, &path)?;
            info!("Wrote {}", path.display());
            written.push(path);

            if format == ReportFormat::Json {
                let students = dir.join(format!("{label}_students.json"));
                fs::write(&students, JsonReporter::render_student_timetables(&ctx)?)?;
                written.push(students);
            }
        }

        println!(
            "✓ {label}: score {} from run {} ({} three-in-a-row, avg busiest day {:.2})",
            candidate.score,
            candidate.run,
            ctx.stats.run_count(3),
            ctx.stats.average_max_daily_load
        );
        for path in &written {
            verbose!("    {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats_dedups() {
        let formats = parse_formats(&["csv".into(), "md".into(), "CSV".into()]).unwrap();
        assert_eq!(formats, vec![ReportFormat::Csv, ReportFormat::Markdown]);
        assert!(parse_formats(&["pdf".into()]).is_err());
    }
}
