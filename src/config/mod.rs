//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! Resolution order: built-in defaults, then the TOML file (if `--config` is
//! given), then explicit CLI flags.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::validate::INPUT_CHARACTER_LIMIT;
use crate::analysis::DEFAULT_TOP_K;
use crate::output::OUTPUT_CHARACTER_LIMIT;

/// Default TCP port of the service
pub const DEFAULT_PORT: u16 = 60000;

/// Default dictionary file, relative to the working directory
pub const DEFAULT_DICTIONARY: &str = "basic_english_2000.txt";

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Listener and connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client read timeout in seconds (0 = wait forever)
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    /// Stop after the first client session ends
    #[serde(default)]
    pub single_session: bool,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_read_timeout() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            read_timeout: default_read_timeout(),
            single_session: false,
        }
    }
}

impl ServerConfig {
    /// `bind:port`
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Socket read timeout, `None` when disabled
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Dictionary storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DictionaryConfig {
    /// Word-per-line dictionary file, rewritten after each request
    #[serde(default = "default_dictionary_path")]
    pub path: PathBuf,
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from(DEFAULT_DICTIONARY)
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            path: default_dictionary_path(),
        }
    }
}

/// Request limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimitsConfig {
    /// Maximum input line length in characters
    #[serde(default = "default_input_chars")]
    pub input_chars: usize,
    /// Maximum output line length in characters
    #[serde(default = "default_output_chars")]
    pub output_chars: usize,
    /// Ranked matches reported per word
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_input_chars() -> usize {
    INPUT_CHARACTER_LIMIT
}

fn default_output_chars() -> usize {
    OUTPUT_CHARACTER_LIMIT
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            input_chars: default_input_chars(),
            output_chars: default_output_chars(),
            top_k: default_top_k(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// JSON-lines file receiving one summary per completed request
    pub summary_json: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
    /// Validate and print the configuration, then exit
    #[serde(default)]
    pub dry_run: bool,
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Server: {}", self.server)?;
        writeln!(f, "  Dictionary: {}", self.dictionary)?;
        writeln!(f, "  Limits: {}", self.limits)?;
        writeln!(f, "  Output: {}", self.output)?;
        writeln!(f, "  Runtime: {}", self.runtime)?;
        Ok(())
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listen={}", self.listen_addr())?;
        match self.read_timeout() {
            Some(timeout) => write!(f, ", read_timeout={}s", timeout.as_secs())?,
            None => write!(f, ", read_timeout=none")?,
        }
        if self.single_session {
            write!(f, ", single_session")?;
        }
        Ok(())
    }
}

impl fmt::Display for DictionaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl fmt::Display for LimitsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input={} chars, output={} chars, top_k={}",
            self.input_chars, self.output_chars, self.top_k
        )
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.summary_json {
            Some(path) => write!(f, "summary_json={}", path.display()),
            None => write!(f, "console only"),
        }
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "debug={}, dry_run={}", self.debug, self.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 60000);
        assert_eq!(config.server.listen_addr(), "0.0.0.0:60000");
        assert_eq!(config.server.read_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.dictionary.path, PathBuf::from("basic_english_2000.txt"));
        assert_eq!(config.limits.input_chars, 100);
        assert_eq!(config.limits.output_chars, 200);
        assert_eq!(config.limits.top_k, 5);
        assert!(config.output.summary_json.is_none());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let server = ServerConfig {
            read_timeout: 0,
            ..ServerConfig::default()
        };
        assert_eq!(server.read_timeout(), None);
        assert!(server.to_string().contains("read_timeout=none"));
    }

    #[test]
    fn test_display() {
        let text = Config::default().to_string();
        assert!(text.contains("listen=0.0.0.0:60000"));
        assert!(text.contains("input=100 chars, output=200 chars, top_k=5"));
    }
}
