//! Integration tests for configuration management

use exam_scheduler::config::{Config, ConfigOverrides};
use exam_scheduler::core::policy::Policy;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a temporary config directory
fn setup_temp_config() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_file = temp_dir.path().join("config.toml");
    (temp_dir, config_file)
}

#[test]
fn test_config_from_defaults() {
    let config = Config::from_defaults();

    // Should have non-empty defaults for critical fields
    assert!(
        !config.logging.level.is_empty(),
        "Default log level should not be empty"
    );
    assert!(
        !config.paths.out_dir.is_empty(),
        "Default out_dir should not be empty"
    );
    assert!(
        !config.paths.reports_dir.is_empty(),
        "Default reports_dir should not be empty"
    );
    assert_eq!(config.optimizer.policy, "midsem");
    assert_eq!(config.optimizer.runs, 25);
    assert_eq!(config.optimizer.keep, 3);
    assert_eq!(config.optimizer.reduction_attempts, 100);
}

#[test]
fn test_config_from_toml_basic() {
    let toml_str = r#"
[logging]
level = "info"
file = "/tmp/test.log"
verbose = true

[optimizer]
policy = "endsem"
runs = 10
keep = 2
workers = 4
seed = 99
swap_rounds = 5
relocation_rounds = 6
reduction_attempts = 7
balance_attempts = 8

[paths]
out_dir = "./timetables"
reports_dir = "./reports"
"#;

    let config = Config::from_toml(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file, "/tmp/test.log");
    assert!(config.logging.verbose);
    assert_eq!(config.optimizer.policy().unwrap(), Policy::Endsem);
    assert_eq!(config.optimizer.workers, 4);
    assert_eq!(config.paths.out_dir, "./timetables");
    assert_eq!(config.paths.reports_dir, "./reports");

    let population = config.optimizer.population_config().unwrap();
    assert_eq!(population.runs, 10);
    assert_eq!(population.keep, 2);
    assert_eq!(population.seed, Some(99));
    assert!(!population.discard_worst_tier);
    assert_eq!(population.budget.swap_rounds, 5);
    assert_eq!(population.budget.balance_attempts, 8);
}

#[test]
fn test_config_from_toml_partial() {
    // Missing sections and fields use their defaults
    let toml_str = r#"
[logging]
level = "error"

[optimizer]
runs = 5
"#;

    let config = Config::from_toml(toml_str).expect("Failed to parse partial TOML");

    assert_eq!(config.logging.level, "error");
    assert_eq!(config.logging.file, ""); // Default empty
    assert!(!config.logging.verbose); // Default false
    assert_eq!(config.optimizer.runs, 5);
    assert_eq!(config.optimizer.keep, 3);
    assert_eq!(config.optimizer.swap_rounds, 50);
    assert_eq!(config.paths.out_dir, "");

    // Empty policy means mid-semester; seed 0 means fresh randomness
    assert_eq!(config.optimizer.policy().unwrap(), Policy::Midsem);
    assert_eq!(config.optimizer.population_config().unwrap().seed, None);
}

#[test]
fn test_config_variable_expansion() {
    let toml_str = r#"
[logging]
file = "$EXAMSCHED/test.log"

[paths]
out_dir = "$EXAMSCHED/out"
"#;

    let config = Config::from_toml(toml_str).expect("Failed to parse TOML with variables");

    // Variable should be expanded to actual path
    assert!(config.logging.file.contains("examsched"));
    assert!(!config.logging.file.contains("$EXAMSCHED"));
    assert!(config.paths.out_dir.ends_with("out"));
    assert!(!config.paths.out_dir.contains("$EXAMSCHED"));
}

#[test]
fn test_config_get_set() {
    let mut config = Config::from_defaults();

    assert!(config.get("level").is_some());

    config.set("level", "debug").expect("Failed to set level");
    assert_eq!(config.get("level").unwrap(), "debug");

    config
        .set("verbose", "true")
        .expect("Failed to set verbose");
    assert!(config.logging.verbose);

    config.set("runs", "40").expect("Failed to set runs");
    assert_eq!(config.optimizer.runs, 40);
    config.set("swap-rounds", "12").expect("Dashes map to underscores");
    assert_eq!(config.get("swap_rounds").unwrap(), "12");
    config.set("policy", "END").expect("Failed to set policy");
    assert_eq!(config.get("policy").unwrap(), "endsem");

    // Invalid values and unknown keys
    assert!(config.set("runs", "0").is_err());
    assert!(config.set("keep", "-1").is_err());
    assert!(config.set("seed", "abc").is_err());
    assert!(config.set("policy", "finals").is_err());
    assert!(config.set("verbose", "sometimes").is_err());
    assert!(config.get("unknown_key").is_none());
    assert!(config.set("unknown_key", "value").is_err());
}

#[test]
fn test_config_unset() {
    let mut config = Config::from_defaults();
    let defaults = Config::from_defaults();

    config.set("keep", "9").expect("Failed to set keep");
    config.set("reports_dir", "/tmp/r").expect("Failed to set reports_dir");

    config.unset("keep", &defaults).expect("Failed to unset keep");
    config
        .unset("reports-dir", &defaults)
        .expect("Failed to unset reports_dir");
    assert_eq!(config.optimizer.keep, defaults.optimizer.keep);
    assert_eq!(config.paths.reports_dir, defaults.paths.reports_dir);
    assert!(config.unset("nope", &defaults).is_err());
}

#[test]
fn test_config_save_and_load() {
    let (_temp_dir, config_file) = setup_temp_config();

    let mut config = Config::from_defaults();
    config.set("level", "info").expect("Failed to set level");
    config.set("seed", "1234").expect("Failed to set seed");

    // Manually save to our test location
    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent).expect("Failed to create dir");
    }
    let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");
    fs::write(&config_file, toml_str).expect("Failed to write config");

    let content = fs::read_to_string(&config_file).expect("Failed to read config");
    let loaded_config = Config::from_toml(&content).expect("Failed to parse loaded config");

    assert_eq!(loaded_config.logging.level, "info");
    assert_eq!(loaded_config.optimizer.seed, 1234);
}

#[test]
fn test_config_overrides_apply() {
    let mut config = Config::from_defaults();

    let overrides = ConfigOverrides {
        level: Some("error".to_string()),
        file: Some("/custom/path.log".to_string()),
        verbose: Some(true),
        policy: Some("endsem".to_string()),
        runs: Some(3),
        keep: Some(1),
        workers: Some(2),
        seed: Some(5),
        out_dir: Some("./custom_out".to_string()),
        reports_dir: Some("./custom_reports".to_string()),
    };

    config.apply_overrides(&overrides);

    assert_eq!(config.logging.level, "error");
    assert_eq!(config.logging.file, "/custom/path.log");
    assert!(config.logging.verbose);
    assert_eq!(config.optimizer.policy, "endsem");
    assert_eq!(config.optimizer.runs, 3);
    assert_eq!(config.optimizer.keep, 1);
    assert_eq!(config.optimizer.workers, 2);
    assert_eq!(config.optimizer.seed, 5);
    assert_eq!(config.paths.out_dir, "./custom_out");
    assert_eq!(config.paths.reports_dir, "./custom_reports");
}

#[test]
fn test_config_overrides_partial() {
    let mut config = Config::from_defaults();
    let before = config.optimizer.runs;

    let overrides = ConfigOverrides {
        level: Some("debug".to_string()),
        ..Default::default()
    };
    config.apply_overrides(&overrides);

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.optimizer.runs, before);
}

#[test]
fn test_config_display_format() {
    let config = Config::from_defaults();
    let display_str = format!("{config}");

    assert!(display_str.contains("[logging]"));
    assert!(display_str.contains("[optimizer]"));
    assert!(display_str.contains("[paths]"));
    assert!(display_str.contains("runs = 25"));
    assert!(display_str.contains("policy = \"midsem\""));
}

#[test]
fn test_merge_defaults_adds_missing_fields() {
    let toml_str = r#"
[logging]
level = "error"
file = ""
verbose = false

[optimizer]
policy = ""

[paths]
out_dir = ""
reports_dir = ""
"#;

    let mut config = Config::from_toml(toml_str).expect("Failed to parse minimal config");
    let defaults = Config::from_defaults();

    let changed = config.merge_defaults(&defaults);

    assert!(
        changed,
        "merge_defaults should return true when fields are added"
    );
    assert_eq!(config.optimizer.policy, "midsem");
    assert_eq!(config.paths.out_dir, defaults.paths.out_dir);
    assert!(!config.merge_defaults(&defaults));
}

#[test]
fn test_merge_defaults_preserves_existing() {
    let toml_str = r#"
[logging]
level = "error"
file = "/my/custom/path.log"
verbose = false

[optimizer]
policy = "endsem"

[paths]
out_dir = "/my/out"
reports_dir = ""
"#;

    let mut config = Config::from_toml(toml_str).expect("Failed to parse config");
    let defaults = Config::from_defaults();

    config.merge_defaults(&defaults);

    assert_eq!(config.logging.level, "error");
    assert_eq!(config.logging.file, "/my/custom/path.log");
    assert_eq!(config.optimizer.policy, "endsem");
    assert_eq!(config.paths.out_dir, "/my/out");
}

#[test]
fn test_get_examsched_dir() {
    let dir = Config::get_examsched_dir();

    assert!(dir.to_string_lossy().contains("examsched"));
    assert_ne!(dir, PathBuf::from("."));
}

#[test]
fn test_get_config_file_path() {
    let path = Config::get_config_file_path();

    let path_str = path.to_string_lossy();
    assert!(path_str.ends_with("config.toml") || path_str.ends_with("dconfig.toml"));
}

#[test]
fn test_population_config_rejects_zero_counters() {
    let mut config = Config::from_toml("[optimizer]\nruns = 0\n").expect("Failed to parse TOML");
    let err = config.optimizer.population_config().unwrap_err();
    assert!(err.contains("runs"));

    config.optimizer.runs = 4;
    config.optimizer.keep = 0;
    let err = config.optimizer.population_config().unwrap_err();
    assert!(err.contains("keep"));

    config.optimizer.keep = 1;
    config.optimizer.policy = "finals".to_string();
    assert!(config.optimizer.population_config().is_err());
}
