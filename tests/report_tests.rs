//! End-to-end: load the samples, optimize, and export every format

use exam_scheduler::core::loader::{build_index, load_enrollments, load_preassignment};
use exam_scheduler::core::policy::Policy;
use exam_scheduler::core::population::{Optimizer, PopulationConfig};
use exam_scheduler::core::report::{JsonReporter, ReportContext, ReportFormat};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("samples").join(name)
}

#[test]
fn sample_pipeline_exports_all_formats() {
    let records = load_enrollments(sample("enrollments.csv")).unwrap();
    let pre = load_preassignment(sample("preassignment.json")).unwrap();
    let index = build_index(&records, Some(&pre));

    let config = PopulationConfig {
        runs: 6,
        keep: 2,
        workers: 2,
        seed: Some(2024),
        ..PopulationConfig::default()
    };
    let optimizer = Optimizer::for_policy(&index, Policy::Midsem, None, config).unwrap();
    let population = optimizer.optimize(Some(&pre)).expect("sample roster is feasible");
    assert!(!population.candidates.is_empty());
    assert!(population.candidates.len() <= 2);

    let out = TempDir::new().unwrap();
    let scorer = optimizer.scorer();
    for (i, candidate) in population.candidates.iter().enumerate() {
        let ctx = ReportContext::new(&scorer, candidate, i + 1);
        for format in ReportFormat::ALL {
            let path = out.path().join(format!("{}.{}", ctx.label(), format.extension()));
            format.reporter().generate(&ctx, &path).unwrap();
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }

        let csv = fs::read_to_string(out.path().join(format!("{}.csv", ctx.label()))).unwrap();
        assert!(csv.starts_with("Day,Slot 1,Slot 2,Slot 3,Slot 4\n"));
        assert!(csv.contains("EC205: Electromagnetics, Waves"));

        let students: serde_json::Value =
            serde_json::from_str(&JsonReporter::render_student_timetables(&ctx).unwrap()).unwrap();
        assert_eq!(students.as_object().unwrap().len(), 10);

        let doc: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(out.path().join(format!("{}.json", ctx.label()))).unwrap(),
        )
        .unwrap();
        assert_eq!(doc["score"], candidate.score.total);
        assert_eq!(doc["has_worst_tier"], false);
        assert_eq!(doc["statistics"]["course_count"], 18);
    }
}
