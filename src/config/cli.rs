//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Service mode (default) - accept clients over TCP
    Service,
    /// Standalone mode - one session over stdin/stdout
    Standalone,
}

/// TextPulse - Text Analysis Server
#[derive(Parser, Debug)]
#[command(name = "textpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: service or standalone
    #[arg(long, value_enum, default_value = "service")]
    pub mode: ExecutionMode,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    // === Service Options ===
    /// Address to bind (service mode only)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port for service to listen on (service mode only)
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Client read timeout (e.g., 300s, 5m; 0 disables)
    #[arg(long)]
    pub read_timeout: Option<String>,

    /// Exit after the first client session ends
    #[arg(long)]
    pub single_session: bool,

    // === Dictionary & Limits ===
    /// Dictionary file, one word per line
    #[arg(long, env = "TEXTPULSE_DICTIONARY")]
    pub dictionary: Option<PathBuf>,

    /// Maximum input length in characters
    #[arg(long)]
    pub input_limit: Option<usize>,

    /// Maximum output length in characters
    #[arg(long)]
    pub output_limit: Option<usize>,

    /// Number of ranked matches reported per word
    #[arg(long)]
    pub top_k: Option<usize>,

    // === Output Options ===
    /// Append a JSON summary of every request to this file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    // === Runtime Options ===
    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Dry run - validate configuration without executing
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mode == ExecutionMode::Standalone {
            if self.bind.is_some() || self.listen_port.is_some() {
                anyhow::bail!("--bind and --listen-port only apply to service mode");
            }
            if self.single_session {
                anyhow::bail!("--single-session only applies to service mode");
            }
        }

        if let Some(0) = self.top_k {
            anyhow::bail!("top_k must be at least 1");
        }

        Ok(())
    }
}
