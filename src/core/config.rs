//! Configuration module for `examsched`

use crate::core::policy::Policy;
use crate::core::population::PopulationConfig;
use crate::core::search::SearchBudget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Default CLI configuration loaded based on build profile.
/// Uses release defaults in release mode, debug defaults in debug mode.
#[cfg(not(debug_assertions))]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultCLIConfigRelease.toml");

#[cfg(debug_assertions)]
const CONFIG_DEFAULTS: &str = include_str!("../assets/DefaultCLIConfigDebug.toml");

#[cfg(not(debug_assertions))]
const CONFIG_FILE_NAME: &str = "config.toml";

#[cfg(debug_assertions)]
const CONFIG_FILE_NAME: &str = "dconfig.toml";

/// Variable expanded to the config directory in string values
const DIR_VARIABLE: &str = "$EXAMSCHED";

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    #[serde(default)]
    pub level: String,
    /// Log file path
    #[serde(default)]
    pub file: String,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

/// Optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Exam policy (midsem, endsem)
    pub policy: String,
    /// Independent runs per optimization
    pub runs: usize,
    /// Candidates kept
    pub keep: usize,
    /// Worker threads (0 = available parallelism)
    pub workers: usize,
    /// Master seed (0 = fresh randomness)
    pub seed: u64,
    /// Cell-swap rounds
    pub swap_rounds: usize,
    /// Worst-tier relocation rounds
    pub relocation_rounds: usize,
    /// Secondary-tier reduction attempts
    pub reduction_attempts: usize,
    /// Load-balancing attempts
    pub balance_attempts: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let population = PopulationConfig::default();
        Self {
            policy: String::new(),
            runs: population.runs,
            keep: population.keep,
            workers: population.workers,
            seed: 0,
            swap_rounds: population.budget.swap_rounds,
            relocation_rounds: population.budget.relocation_rounds,
            reduction_attempts: population.budget.reduction_attempts,
            balance_attempts: population.budget.balance_attempts,
        }
    }
}

impl OptimizerConfig {
    /// Parsed policy; an empty value means mid-semester
    ///
    /// # Errors
    /// Returns an error for an unknown policy name.
    pub fn policy(&self) -> Result<Policy, String> {
        if self.policy.trim().is_empty() {
            Ok(Policy::default())
        } else {
            self.policy.parse()
        }
    }

    /// Population settings described by this section
    ///
    /// # Errors
    /// Returns an error for an unknown policy, or when `runs` or `keep` is 0.
    pub fn population_config(&self) -> Result<PopulationConfig, String> {
        let policy = self.policy()?;
        let population = PopulationConfig {
            runs: self.runs,
            keep: self.keep,
            workers: self.workers,
            seed: (self.seed != 0).then_some(self.seed),
            discard_worst_tier: policy.discards_worst_tier(),
            budget: SearchBudget {
                swap_rounds: self.swap_rounds,
                relocation_rounds: self.relocation_rounds,
                reduction_attempts: self.reduction_attempts,
                balance_attempts: self.balance_attempts,
            },
        };
        population.validate()?;
        Ok(population)
    }
}

/// Paths configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for generated timetables
    #[serde(default)]
    pub out_dir: String,
    /// Directory for report output files
    #[serde(default)]
    pub reports_dir: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Optimizer settings
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Path settings
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Optional CLI overrides for configuration values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override logging level
    pub level: Option<String>,
    /// Override log file path
    pub file: Option<String>,
    /// Override verbose flag
    pub verbose: Option<bool>,
    /// Override exam policy
    pub policy: Option<String>,
    /// Override run count
    pub runs: Option<usize>,
    /// Override kept candidates
    pub keep: Option<usize>,
    /// Override worker count
    pub workers: Option<usize>,
    /// Override master seed
    pub seed: Option<u64>,
    /// Override timetable output directory
    pub out_dir: Option<String>,
    /// Override reports output directory
    pub reports_dir: Option<String>,
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| format!("Invalid number for '{key}': '{value}'"))
}

impl Config {
    /// Get the `$EXAMSCHED` directory path
    ///
    /// Returns:
    /// - Linux: `~/.config/examsched`
    /// - macOS: `~/Library/Application Support/examsched`
    /// - Windows: `%APPDATA%\examsched`
    #[must_use]
    pub fn get_examsched_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("examsched")
    }

    /// Merge missing fields from defaults into this config
    ///
    /// Used when loading so that fields added in newer versions get their
    /// default values. Only string fields that are empty here and non-empty in
    /// the defaults are updated; numeric optimizer fields already fall back to
    /// their defaults during deserialization.
    ///
    /// # Returns
    ///
    /// `true` if any fields were added/changed, `false` otherwise
    #[allow(clippy::useless_let_if_seq)]
    pub fn merge_defaults(&mut self, defaults: &Self) -> bool {
        let mut changed = false;

        if self.logging.level.is_empty() && !defaults.logging.level.is_empty() {
            self.logging.level.clone_from(&defaults.logging.level);
            changed = true;
        }
        if self.logging.file.is_empty() && !defaults.logging.file.is_empty() {
            self.logging.file.clone_from(&defaults.logging.file);
            changed = true;
        }

        if self.optimizer.policy.is_empty() && !defaults.optimizer.policy.is_empty() {
            self.optimizer.policy.clone_from(&defaults.optimizer.policy);
            changed = true;
        }

        if self.paths.out_dir.is_empty() && !defaults.paths.out_dir.is_empty() {
            self.paths.out_dir.clone_from(&defaults.paths.out_dir);
            changed = true;
        }
        if self.paths.reports_dir.is_empty() && !defaults.paths.reports_dir.is_empty() {
            self.paths
                .reports_dir
                .clone_from(&defaults.paths.reports_dir);
            changed = true;
        }

        changed
    }

    /// Apply CLI-provided overrides onto the loaded configuration
    ///
    /// Overrides only affect the in-memory config; the file is not touched.
    /// Only non-`None` values replace config values.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut config = Config::load();
    /// let overrides = ConfigOverrides {
    ///     runs: Some(50),
    ///     ..Default::default()
    /// };
    /// config.apply_overrides(&overrides);
    /// ```
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(level) = &overrides.level {
            self.logging.level.clone_from(level);
        }
        if let Some(file) = &overrides.file {
            self.logging.file.clone_from(file);
        }
        if let Some(verbose) = overrides.verbose {
            self.logging.verbose = verbose;
        }

        if let Some(policy) = &overrides.policy {
            self.optimizer.policy.clone_from(policy);
        }
        if let Some(runs) = overrides.runs {
            self.optimizer.runs = runs;
        }
        if let Some(keep) = overrides.keep {
            self.optimizer.keep = keep;
        }
        if let Some(workers) = overrides.workers {
            self.optimizer.workers = workers;
        }
        if let Some(seed) = overrides.seed {
            self.optimizer.seed = seed;
        }

        if let Some(out_dir) = &overrides.out_dir {
            self.paths.out_dir.clone_from(out_dir);
        }
        if let Some(reports_dir) = &overrides.reports_dir {
            self.paths.reports_dir.clone_from(reports_dir);
        }
    }

    /// Get the user config file path
    ///
    /// `config.toml` for release builds, `dconfig.toml` for debug builds,
    /// inside [`get_examsched_dir`](Self::get_examsched_dir).
    #[must_use]
    pub fn get_config_file_path() -> PathBuf {
        Self::get_examsched_dir().join(CONFIG_FILE_NAME)
    }

    /// Expand `$EXAMSCHED` to the config directory
    #[must_use]
    fn expand_variables(value: &str) -> String {
        if value.contains(DIR_VARIABLE) {
            let dir = Self::get_examsched_dir();
            value.replace(DIR_VARIABLE, dir.to_str().unwrap_or("."))
        } else {
            value.to_string()
        }
    }

    /// Initialize config from a TOML string
    ///
    /// Expands `$EXAMSCHED` in path values. Missing fields use their serde
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed or doesn't match the expected schema
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(toml_str)?;

        config.logging.file = Self::expand_variables(&config.logging.file);
        config.paths.out_dir = Self::expand_variables(&config.paths.out_dir);
        config.paths.reports_dir = Self::expand_variables(&config.paths.reports_dir);

        Ok(config)
    }

    /// Load configuration from embedded defaults
    ///
    /// Debug builds use `DefaultCLIConfigDebug.toml`, release builds
    /// `DefaultCLIConfigRelease.toml`.
    ///
    /// # Panics
    /// Panics if the embedded default configuration is invalid TOML. The
    /// defaults are compiled into the binary and covered by tests.
    #[must_use]
    pub fn from_defaults() -> Self {
        Self::from_toml(CONFIG_DEFAULTS).expect("Failed to parse compiled-in default configuration")
    }

    /// Load configuration from file, or create from defaults if not found
    ///
    /// - If the config file exists: load it, merge missing fields from
    ///   defaults, save the merged config
    /// - On first run: create the config directory and save the defaults
    ///
    /// Falls back to defaults if the file cannot be read or parsed.
    #[must_use]
    pub fn load() -> Self {
        let config_file = Self::get_config_file_path();
        let defaults = Self::from_defaults();

        if config_file.exists() {
            if let Ok(content) = fs::read_to_string(&config_file) {
                if let Ok(mut config) = Self::from_toml(&content) {
                    if config.merge_defaults(&defaults) {
                        let _ = config.save();
                    }
                    return config;
                }
            }
        } else {
            if let Some(parent) = config_file.parent() {
                let _ = fs::create_dir_all(parent);
            }
            let _ = defaults.save();
            return defaults;
        }

        defaults
    }

    /// Save configuration to file
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_file = Self::get_config_file_path();
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(&config_file, toml_str)?;
        Ok(())
    }

    /// Get a configuration value by key
    ///
    /// Supported keys:
    /// - `level`, `file`, `verbose`
    /// - `policy`, `runs`, `keep`, `workers`, `seed`
    /// - `swap_rounds`, `relocation_rounds`, `reduction_attempts`, `balance_attempts`
    /// - `out_dir`, `reports_dir`
    ///
    /// Dashes may be used in place of underscores.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let o = &self.optimizer;
        match key.replace('-', "_").as_str() {
            "level" => Some(self.logging.level.clone()),
            "file" => Some(self.logging.file.clone()),
            "verbose" => Some(self.logging.verbose.to_string()),
            "policy" => Some(o.policy.clone()),
            "runs" => Some(o.runs.to_string()),
            "keep" => Some(o.keep.to_string()),
            "workers" => Some(o.workers.to_string()),
            "seed" => Some(o.seed.to_string()),
            "swap_rounds" => Some(o.swap_rounds.to_string()),
            "relocation_rounds" => Some(o.relocation_rounds.to_string()),
            "reduction_attempts" => Some(o.reduction_attempts.to_string()),
            "balance_attempts" => Some(o.balance_attempts.to_string()),
            "out_dir" => Some(self.paths.out_dir.clone()),
            "reports_dir" => Some(self.paths.reports_dir.clone()),
            _ => None,
        }
    }

    /// Set a configuration value by key
    ///
    /// Values are validated: `verbose` must be a boolean, `policy` a known
    /// policy, counters non-negative integers, and `runs`/`keep` at least 1.
    /// Call [`save()`](Config::save) to persist changes.
    ///
    /// # Errors
    /// Returns an error if the key is not recognized or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let key = key.replace('-', "_");
        let o = &mut self.optimizer;
        match key.as_str() {
            "level" => self.logging.level = value.to_string(),
            "file" => self.logging.file = value.to_string(),
            "verbose" => {
                self.logging.verbose = value
                    .parse::<bool>()
                    .map_err(|_| format!("Invalid boolean value for 'verbose': '{value}'"))?;
            }
            "policy" => {
                let policy: Policy = value.parse()?;
                o.policy = policy.to_string();
            }
            "runs" | "keep" => {
                let n: usize = parse_number(&key, value)?;
                if n == 0 {
                    return Err(format!("'{key}' must be at least 1"));
                }
                if key == "runs" {
                    o.runs = n;
                } else {
                    o.keep = n;
                }
            }
            "workers" => o.workers = parse_number(&key, value)?,
            "seed" => o.seed = parse_number(&key, value)?,
            "swap_rounds" => o.swap_rounds = parse_number(&key, value)?,
            "relocation_rounds" => o.relocation_rounds = parse_number(&key, value)?,
            "reduction_attempts" => o.reduction_attempts = parse_number(&key, value)?,
            "balance_attempts" => o.balance_attempts = parse_number(&key, value)?,
            "out_dir" => self.paths.out_dir = value.to_string(),
            "reports_dir" => self.paths.reports_dir = value.to_string(),
            _ => return Err(format!("Unknown config key: '{key}'")),
        }
        Ok(())
    }

    /// Unset a configuration value by key (reset to default)
    ///
    /// Call [`save()`](Config::save) to persist changes.
    ///
    /// # Errors
    /// Returns an error if the key is not recognized.
    pub fn unset(&mut self, key: &str, defaults: &Self) -> Result<(), String> {
        let o = &mut self.optimizer;
        let d = &defaults.optimizer;
        match key.replace('-', "_").as_str() {
            "level" => self.logging.level.clone_from(&defaults.logging.level),
            "file" => self.logging.file.clone_from(&defaults.logging.file),
            "verbose" => self.logging.verbose = defaults.logging.verbose,
            "policy" => o.policy.clone_from(&d.policy),
            "runs" => o.runs = d.runs,
            "keep" => o.keep = d.keep,
            "workers" => o.workers = d.workers,
            "seed" => o.seed = d.seed,
            "swap_rounds" => o.swap_rounds = d.swap_rounds,
            "relocation_rounds" => o.relocation_rounds = d.relocation_rounds,
            "reduction_attempts" => o.reduction_attempts = d.reduction_attempts,
            "balance_attempts" => o.balance_attempts = d.balance_attempts,
            "out_dir" => self.paths.out_dir.clone_from(&defaults.paths.out_dir),
            "reports_dir" => self
                .paths
                .reports_dir
                .clone_from(&defaults.paths.reports_dir),
            _ => return Err(format!("Unknown config key: '{key}'")),
        }
        Ok(())
    }

    /// Reset all configuration to defaults
    ///
    /// Deletes the configuration file so the next [`load()`](Config::load)
    /// recreates it. Succeeds if the file does not exist. The CLI asks for
    /// confirmation first.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be deleted.
    pub fn reset() -> Result<(), std::io::Error> {
        let config_file = Self::get_config_file_path();
        if config_file.exists() {
            fs::remove_file(config_file)?;
        }
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[logging]")?;
        writeln!(f, "  level = \"{}\"", self.logging.level)?;
        writeln!(f, "  file = \"{}\"", self.logging.file)?;
        writeln!(f, "  verbose = {}", self.logging.verbose)?;

        let o = &self.optimizer;
        writeln!(f, "\n[optimizer]")?;
        writeln!(f, "  policy = \"{}\"", o.policy)?;
        writeln!(f, "  runs = {}", o.runs)?;
        writeln!(f, "  keep = {}", o.keep)?;
        writeln!(f, "  workers = {}", o.workers)?;
        writeln!(f, "  seed = {}", o.seed)?;
        writeln!(f, "  swap_rounds = {}", o.swap_rounds)?;
        writeln!(f, "  relocation_rounds = {}", o.relocation_rounds)?;
        writeln!(f, "  reduction_attempts = {}", o.reduction_attempts)?;
        writeln!(f, "  balance_attempts = {}", o.balance_attempts)?;

        writeln!(f, "\n[paths]")?;
        writeln!(f, "  out_dir = \"{}\"", self.paths.out_dir)?;
        writeln!(f, "  reports_dir = \"{}\"", self.paths.reports_dir)?;

        Ok(())
    }
}
