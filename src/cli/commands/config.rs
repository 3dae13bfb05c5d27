//! Config command handler
//!
//! `get` shows the stored values followed by the optimizer settings that
//! `generate` would run with. `set` checks optimizer keys against the policy
//! and population rules before anything reaches the file. `set` and `unset`
//! edit the stored file, never the global flag overrides of this invocation.

use crate::args::ConfigSubcommand;
use exam_scheduler::config::Config;
use exam_scheduler::core::policy::Policy;
use std::io::{self, Write};

/// Keys of the `[optimizer]` section
const OPTIMIZER_KEYS: [&str; 9] = [
    "policy",
    "runs",
    "keep",
    "workers",
    "seed",
    "swap_rounds",
    "relocation_rounds",
    "reduction_attempts",
    "balance_attempts",
];

/// Dispatch config subcommands and return the exit status
pub fn run(subcommand: Option<ConfigSubcommand>, config: &Config, defaults: &Config) -> i32 {
    let outcome = match subcommand {
        None | Some(ConfigSubcommand::Get { key: None }) => {
            show_all(config);
            Ok(())
        }
        Some(ConfigSubcommand::Get { key: Some(key) }) => show_key(config, &key),
        Some(ConfigSubcommand::Set { key, value }) => set(&key, &value),
        Some(ConfigSubcommand::Unset { key }) => unset(&key, defaults),
        Some(ConfigSubcommand::Reset { yes }) => reset(yes),
    };
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("✗ {e}");
            1
        }
    }
}

fn is_optimizer_key(key: &str) -> bool {
    OPTIMIZER_KEYS.contains(&key.replace('-', "_").as_str())
}

fn describe_policy(policy: Policy) -> String {
    let shape = policy.shape();
    format!(
        "{} days × {} slots, tiers {}, worst tier {}",
        shape.days,
        shape.slots_per_day,
        policy.tiers_for(shape.slots_per_day),
        if policy.discards_worst_tier() {
            "discarded"
        } else {
            "ranked last"
        }
    )
}

/// The optimizer settings `generate` would run with
///
/// # Errors
/// Returns the validation message when the `[optimizer]` section is unusable.
pub fn effective_settings(config: &Config) -> Result<String, String> {
    let policy = config.optimizer.policy()?;
    let population = config.optimizer.population_config()?;
    let workers = match population.workers {
        0 => "all available workers".to_string(),
        1 => "1 worker".to_string(),
        n => format!("{n} workers"),
    };
    let seed = population
        .seed
        .map_or_else(|| "fresh each invocation".to_string(), |s| s.to_string());
    let budget = population.budget;

    Ok(format!(
        "  policy: {policy} ({})\n  runs: {} on {workers}, keeping {}\n  seed: {seed}\n  budgets: {} swap rounds, {} relocation rounds, {} reduction attempts, {} balance attempts\n",
        describe_policy(policy),
        population.runs,
        population.keep,
        budget.swap_rounds,
        budget.relocation_rounds,
        budget.reduction_attempts,
        budget.balance_attempts
    ))
}

/// Set `key` in memory and describe the stored value.
///
/// Optimizer keys are rejected when the section would no longer yield a
/// valid population; `config` is left untouched on any error.
///
/// # Errors
/// Returns an error for an unknown key or an invalid value.
pub fn apply_set(config: &mut Config, key: &str, value: &str) -> Result<String, String> {
    let mut updated = config.clone();
    updated.set(key, value)?;
    if is_optimizer_key(key) {
        updated.optimizer.population_config()?;
    }

    let shown = updated.get(key).unwrap_or_else(|| value.to_string());
    let note = match key.replace('-', "_").as_str() {
        "policy" => updated.optimizer.policy().ok().map(describe_policy),
        "workers" if updated.optimizer.workers == 0 => Some("available parallelism".to_string()),
        "seed" if updated.optimizer.seed == 0 => Some("fresh randomness each invocation".to_string()),
        _ => None,
    };
    *config = updated;

    Ok(match note {
        Some(note) => format!("Set {key} = {shown} ({note})"),
        None => format!("Set {key} = {shown}"),
    })
}

fn show_all(config: &Config) {
    println!("\n=== Configuration ===\n");
    print!("{config}");
    println!("\n=== Effective optimizer settings ===\n");
    match effective_settings(config) {
        Ok(summary) => print!("{summary}"),
        Err(e) => println!("  ✗ {e}"),
    }
}

fn show_key(config: &Config, key: &str) -> Result<(), String> {
    let value = config
        .get(key)
        .ok_or_else(|| format!("Unknown config key: '{key}'"))?;
    println!("{value}");
    Ok(())
}

fn set(key: &str, value: &str) -> Result<(), String> {
    let mut stored = Config::load();
    let message = apply_set(&mut stored, key, value)?;
    stored
        .save()
        .map_err(|e| format!("Failed to save config: {e}"))?;
    println!("✓ {message}");
    Ok(())
}

fn unset(key: &str, defaults: &Config) -> Result<(), String> {
    let mut stored = Config::load();
    stored.unset(key, defaults)?;
    stored
        .save()
        .map_err(|e| format!("Failed to save config: {e}"))?;
    println!(
        "✓ Reset {key} to {}",
        stored.get(key).unwrap_or_default()
    );
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} (y/n): ");
    io::stdout().flush().ok();

    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return false;
    }
    matches!(response.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn reset(yes: bool) -> Result<(), String> {
    if !Config::get_config_file_path().exists() {
        println!("✓ Config is already at defaults");
        return Ok(());
    }
    if !yes && !confirm("Reset config to defaults?") {
        println!("✗ Reset cancelled");
        return Ok(());
    }
    Config::reset().map_err(|e| format!("Failed to remove config file: {e}"))?;
    println!("✓ Config reset to defaults");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_policy_describes_grid() {
        let mut config = Config::from_defaults();
        let message = apply_set(&mut config, "policy", "END").unwrap();
        assert_eq!(config.optimizer.policy, "endsem");
        assert!(message.starts_with("Set policy = endsem"));
        assert!(message.contains("7 days × 2 slots"));
        assert!(message.contains("ranked last"));
    }

    #[test]
    fn test_set_notes_zero_meanings() {
        let mut config = Config::from_defaults();
        let message = apply_set(&mut config, "seed", "0").unwrap();
        assert!(message.contains("fresh randomness"));
        let message = apply_set(&mut config, "swap-rounds", "7").unwrap();
        assert_eq!(message, "Set swap-rounds = 7");
        assert_eq!(config.optimizer.swap_rounds, 7);
    }

    #[test]
    fn test_rejected_set_leaves_config_untouched() {
        let mut config = Config::from_defaults();
        assert!(apply_set(&mut config, "runs", "0").is_err());
        assert!(apply_set(&mut config, "policy", "finals").is_err());
        assert!(apply_set(&mut config, "colour", "blue").is_err());
        assert_eq!(config.optimizer.runs, 25);
        assert_eq!(config.optimizer.policy, "midsem");

        // an optimizer key cannot be saved while the section is unusable
        config.optimizer.policy = "finals".to_string();
        assert!(apply_set(&mut config, "runs", "5").is_err());
        assert_eq!(config.optimizer.runs, 25);
        // other sections still can
        assert!(apply_set(&mut config, "out_dir", "/tmp/timetables").is_ok());
    }

    #[test]
    fn test_effective_settings() {
        let mut config = Config::from_defaults();
        let summary = effective_settings(&config).unwrap();
        assert!(summary.contains("policy: midsem (4 days × 4 slots"));
        assert!(summary.contains("worst tier discarded"));
        assert!(summary.contains("runs: 25 on all available workers, keeping 3"));
        assert!(summary.contains("seed: fresh each invocation"));

        config.optimizer.seed = 42;
        config.optimizer.workers = 1;
        let summary = effective_settings(&config).unwrap();
        assert!(summary.contains("on 1 worker,"));
        assert!(summary.contains("seed: 42"));

        config.optimizer.keep = 0;
        assert!(effective_settings(&config).is_err());
    }
}
