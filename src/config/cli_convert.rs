//! CLI to Config conversion utilities

use crate::config::cli::Cli;
use crate::config::toml::{merge_cli_with_config, parse_toml_file};
use crate::config::Config;
use anyhow::{Context, Result};

/// Parse a duration string (e.g., "60s", "5m", "1h") to seconds
///
/// A bare number is seconds; "0" is accepted and means "no timeout".
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with("sec") || s.ends_with('s') {
        (s.trim_end_matches("sec").trim_end_matches('s'), 1u64)
    } else if s.ends_with("min") || s.ends_with('m') {
        (s.trim_end_matches("min").trim_end_matches('m'), 60)
    } else if s.ends_with("hr") || s.ends_with('h') {
        (s.trim_end_matches("hr").trim_end_matches('h'), 3600)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid duration format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Duration out of range: {}", s))
}

/// Build the effective configuration for a CLI invocation
///
/// Starts from the TOML file when `--config` is given, otherwise from the
/// defaults, and applies CLI overrides on top.
pub fn build_config(cli: &Cli) -> Result<Config> {
    let base = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };

    merge_cli_with_config(cli, base)
}
