//! TOML configuration file parsing
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0"
//! port = 60000
//! read_timeout = 300      # seconds, 0 = none
//! single_session = false
//!
//! [dictionary]
//! path = "basic_english_2000.txt"
//!
//! [limits]
//! input_chars = 100
//! output_chars = 200
//! top_k = 5
//!
//! [output]
//! summary_json = "requests.jsonl"
//!
//! [runtime]
//! debug = false
//! ```
//!
//! Every section and key is optional.

use super::cli::Cli;
use super::cli_convert::parse_duration;
use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Server
    if let Some(ref bind) = cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.listen_port {
        config.server.port = port;
    }
    if let Some(ref timeout) = cli.read_timeout {
        config.server.read_timeout = parse_duration(timeout)
            .with_context(|| format!("Invalid --read-timeout: {}", timeout))?;
    }
    if cli.single_session {
        config.server.single_session = true;
    }

    // Dictionary and limits
    if let Some(ref path) = cli.dictionary {
        config.dictionary.path = path.clone();
    }
    if let Some(input) = cli.input_limit {
        config.limits.input_chars = input;
    }
    if let Some(output) = cli.output_limit {
        config.limits.output_chars = output;
    }
    if let Some(top_k) = cli.top_k {
        config.limits.top_k = top_k;
    }

    // Output
    if let Some(ref path) = cli.summary_json {
        config.output.summary_json = Some(path.clone());
    }

    // Runtime
    if cli.debug {
        config.runtime.debug = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_parse_toml_empty() {
        let config = parse_toml_string("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_toml_basic() {
        let toml = r#"
[server]
bind = "127.0.0.1"
port = 6000
read_timeout = 0
single_session = true

[dictionary]
path = "/srv/words.txt"

[limits]
input_chars = 80
output_chars = 160
top_k = 3

[output]
summary_json = "requests.jsonl"

[runtime]
debug = true
"#;
        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.server.listen_addr(), "127.0.0.1:6000");
        assert_eq!(config.server.read_timeout(), None);
        assert!(config.server.single_session);
        assert_eq!(config.dictionary.path, PathBuf::from("/srv/words.txt"));
        assert_eq!(config.limits.input_chars, 80);
        assert_eq!(config.limits.output_chars, 160);
        assert_eq!(config.limits.top_k, 3);
        assert_eq!(config.output.summary_json, Some(PathBuf::from("requests.jsonl")));
        assert!(config.runtime.debug);
        assert!(!config.runtime.dry_run);
    }

    #[test]
    fn test_parse_toml_partial_section() {
        let config = parse_toml_string("[limits]\ntop_k = 7\n").unwrap();
        assert_eq!(config.limits.top_k, 7);
        assert_eq!(config.limits.input_chars, 100);
        assert_eq!(config.server.port, 60000);
    }

    #[test]
    fn test_parse_toml_rejects_bad_type() {
        assert!(parse_toml_string("[server]\nport = \"sixty\"\n").is_err());
    }

    #[test]
    fn test_merge_cli_overrides() {
        let cli = Cli::try_parse_from([
            "textpulse",
            "--bind",
            "127.0.0.1",
            "--read-timeout",
            "2m",
            "--dictionary",
            "words.txt",
            "--output-limit",
            "300",
            "--debug",
        ])
        .unwrap();

        let config = merge_cli_with_config(&cli, Config::default()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.read_timeout, 120);
        assert_eq!(config.dictionary.path, PathBuf::from("words.txt"));
        assert_eq!(config.limits.output_chars, 300);
        assert!(config.runtime.debug);
        // Untouched values keep the file/defaults
        assert_eq!(config.limits.input_chars, 100);
    }

    #[test]
    fn test_merge_bad_timeout() {
        let cli = Cli::try_parse_from(["textpulse", "--read-timeout", "later"]).unwrap();
        assert!(merge_cli_with_config(&cli, Config::default()).is_err());
    }
}
