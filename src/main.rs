//! TextPulse CLI entry point

use anyhow::{Context, Result};
use std::io::{self, BufReader};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use textpulse::config::cli::{Cli, ExecutionMode};
use textpulse::config::{cli_convert, validator, Config};
use textpulse::dictionary::FileBackend;
use textpulse::output::json::SummaryWriter;
use textpulse::service::TextService;
use textpulse::session::{LineChannel, Session, SessionEnd};
use textpulse::util::logging;
use tracing::info;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();
    cli.validate()?;

    let config = cli_convert::build_config(&cli)?;
    logging::init(config.runtime.debug);

    validator::validate_config(&config).context("Configuration validation failed")?;

    // stdout belongs to the client in standalone mode
    eprintln!("TextPulse v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Text Analysis Server");
    eprintln!();
    eprint!("{}", config);

    if config.runtime.dry_run {
        eprintln!();
        eprintln!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match cli.mode {
        ExecutionMode::Service => run_service(config),
        ExecutionMode::Standalone => run_standalone(config),
    }
}

/// Run the TCP service
fn run_service(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let service = TextService::new(config)?;
    info!(server = %service.server_id(), "Starting text analysis service");

    let sessions = runtime.block_on(service.run())?;
    info!(sessions, "Service stopped");

    // A session interrupted by Ctrl-C may still be unwinding on the blocking pool
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

/// Run one session over stdin/stdout
fn run_standalone(config: Config) -> Result<()> {
    let backend = Arc::new(FileBackend::new(config.dictionary.path.clone()));
    let mut session = Session::new(1, backend, config.limits.clone());

    if let Some(ref path) = config.output.summary_json {
        let writer = SummaryWriter::open(path)?;
        session = session.with_summaries(Arc::new(Mutex::new(writer)));
    }

    let mut channel = LineChannel::new(BufReader::new(io::stdin()), io::stdout());
    let report = session.run(&mut channel);

    if report.end == SessionEnd::DictionaryUnavailable {
        anyhow::bail!(
            "Dictionary unavailable: {}",
            config.dictionary.path.display()
        );
    }

    Ok(())
}
