//! CLI argument definitions for `examsched`

use clap::{builder::BoolishValueParser, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use exam_scheduler::config::ConfigOverrides;
use exam_scheduler::logger::Level;

/// CLI log level argument
///
/// Represents log levels that can be passed via CLI arguments. Converts to lowercase
/// strings for config storage and to `Level` for runtime use.
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevelArg {
    /// Error-level logging
    Error,
    /// Warning-level logging
    Warn,
    /// Info-level logging
    Info,
    /// Debug-level logging
    Debug,
}

impl From<LogLevelArg> for Level {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Debug => Self::Debug,
        }
    }
}

impl std::fmt::Display for LogLevelArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let as_str = match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        };
        write!(f, "{as_str}")
    }
}

/// CLI exam policy argument
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum PolicyArg {
    /// Mid-semester: 4 days × 4 slots
    Midsem,
    /// End-semester: 7 days × 2 slots
    Endsem,
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Midsem => write!(f, "midsem"),
            Self::Endsem => write!(f, "endsem"),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Display configuration values.
    ///
    /// If a KEY is provided, displays only that configuration value.
    /// If no KEY is provided, displays all configuration values.
    Get {
        /// Optional configuration key to display (e.g., `level`, `runs`, `out_dir`)
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },
    /// Set a configuration value.
    Set {
        /// Configuration key to set
        #[arg(value_name = "KEY")]
        key: String,
        /// Value to set
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Unset a configuration value.
    Unset {
        /// Configuration key to unset
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Reset configuration to defaults (asks for confirmation unless `--yes`).
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Grid shape flags shared by `check` and `generate`
#[derive(Debug, Clone, Copy, Args)]
pub struct ShapeArgs {
    /// Exam policy (defaults to config `policy`)
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Number of exam days (defaults to the policy's)
    #[arg(long, value_name = "N")]
    pub days: Option<usize>,

    /// Slots per day (defaults to the policy's)
    #[arg(long, value_name = "N")]
    pub slots_per_day: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage configuration.
    ///
    /// If no subcommand is provided, displays all configuration values.
    Config {
        #[command(subcommand)]
        subcommand: Option<ConfigSubcommand>,
    },
    /// Check an existing slot assignment for clashes.
    ///
    /// Exits with status 1 when any student has two exams in one slot.
    Check {
        /// Enrollment file (CSV or registration JSON)
        #[arg(short, long, value_name = "FILE")]
        enrollments: PathBuf,

        /// Slot assignment JSON keyed by slot number
        #[arg(short, long, value_name = "FILE")]
        slots: PathBuf,

        #[command(flatten)]
        shape: ShapeArgs,
    },
    /// Generate ranked exam timetables.
    ///
    /// Runs the optimizer and writes the best candidates as v1, v2, ...
    Generate {
        /// Enrollment file (CSV or registration JSON)
        #[arg(short, long, value_name = "FILE")]
        enrollments: PathBuf,

        /// Existing slot assignment to preserve and repair
        #[arg(short, long, value_name = "FILE")]
        slots: Option<PathBuf>,

        #[command(flatten)]
        shape: ShapeArgs,

        /// Output directory (defaults to config `out_dir`)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output formats: csv, json, markdown (md), html
        #[arg(short, long, value_name = "FORMAT", num_args = 1.., default_values = ["csv", "json"])]
        format: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = "examsched",
    about = "Clash-free exam timetable generator",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    /// Set the runtime log level (error|warn|info|debug). Falls back to config if omitted.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Enable verbose output (runtime only)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Enable debug-level logging and runtime debug flag (shorthand)
    #[arg(long = "debug")]
    pub debug_flag: bool,

    /// Write runtime logs to a file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    // --- Config overrides ---
    /// Override config logging level
    #[arg(long = "config-level", value_enum)]
    pub config_level: Option<LogLevelArg>,

    /// Override config log file path
    #[arg(long = "config-log-file", value_name = "PATH")]
    pub config_log_file: Option<PathBuf>,

    /// Override config verbose flag (true/false)
    #[arg(long = "config-verbose", value_parser = BoolishValueParser::new())]
    pub config_verbose: Option<bool>,

    /// Number of independent optimization runs
    #[arg(long, value_name = "N", global = true)]
    pub runs: Option<usize>,

    /// Number of ranked candidates to keep
    #[arg(long, value_name = "K", global = true)]
    pub keep: Option<usize>,

    /// Master random seed for reproducible output
    #[arg(long, value_name = "SEED", global = true)]
    pub seed: Option<u64>,

    /// Worker threads (0 = available parallelism)
    #[arg(long, value_name = "N", global = true)]
    pub workers: Option<usize>,

    /// Override config output directory
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Override config reports directory
    #[arg(long = "reports-dir", value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Subcommand to execute.
    /// A subcommand is required to run the CLI.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Convert CLI flags into config overrides
    ///
    /// Transforms CLI arguments into a `ConfigOverrides` struct that can be applied to
    /// the loaded configuration. A subcommand's `--policy` is carried over so the
    /// optimizer section reflects it.
    ///
    /// # Returns
    /// A `ConfigOverrides` struct with values from CLI flags, where `None` means no override.
    pub fn to_config_overrides(&self) -> ConfigOverrides {
        let policy = match &self.command {
            Command::Check { shape, .. } | Command::Generate { shape, .. } => shape.policy,
            Command::Config { .. } => None,
        };
        ConfigOverrides {
            level: self.config_level.map(|lvl| lvl.to_string()),
            file: self
                .config_log_file
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            verbose: self.config_verbose,
            policy: policy.map(|p| p.to_string()),
            runs: self.runs,
            keep: self.keep,
            workers: self.workers,
            seed: self.seed,
            out_dir: self.out_dir.as_ref().map(|p| p.to_string_lossy().to_string()),
            reports_dir: self
                .reports_dir
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        }
    }
}
