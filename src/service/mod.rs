//! TCP service
//!
//! Listens for clients and runs one `Session` per connection, one connection
//! at a time. The accept loop is async (tokio); the session itself is
//! blocking code (worker threads, condvar waits, blocking socket reads) and
//! runs on tokio's blocking pool.
//!
//! # Lifecycle
//!
//! ```text
//! bind ─> accept ─> into_std + read timeout ─> spawn_blocking(Session::run)
//!            ^                                          │
//!            └──────────── next client ─────────────────┘
//! ```
//!
//! Ctrl-C stops the loop. If a session is running, its socket is shut down,
//! which surfaces in the session as a disconnect, and the loop exits once the
//! session has unwound. With `single_session` the loop exits after the first
//! client.

use crate::config::Config;
use crate::dictionary::{DictionaryBackend, FileBackend};
use crate::output::json::SummaryWriter;
use crate::session::{LineChannel, Session, SessionReport, SharedSummaryWriter};
use anyhow::{Context, Result};
use std::io::BufReader;
use std::net::Shutdown;
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tracing::{info, warn};

/// Text analysis service
pub struct TextService {
    config: Config,
    /// Server identifier (hostname), for logs
    server_id: String,
    backend: Arc<dyn DictionaryBackend>,
    summaries: Option<SharedSummaryWriter>,
}

/// Outcome of one client connection
struct ClientOutcome {
    report: SessionReport,
    interrupted: bool,
}

impl TextService {
    /// Create a service backed by the configured dictionary file
    pub fn new(config: Config) -> Result<Self> {
        let backend = Arc::new(FileBackend::new(config.dictionary.path.clone()));
        Self::with_backend(config, backend)
    }

    /// Create a service with an explicit dictionary backend
    pub fn with_backend(config: Config, backend: Arc<dyn DictionaryBackend>) -> Result<Self> {
        let summaries = match &config.output.summary_json {
            Some(path) => Some(Arc::new(Mutex::new(SummaryWriter::open(path)?))),
            None => None,
        };

        Ok(Self {
            config,
            server_id: get_server_id(),
            backend,
            summaries,
        })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.server.listen_addr();
        TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind text service on {}", addr))
    }

    /// Bind and serve until stopped
    pub async fn run(self) -> Result<u64> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve clients from `listener` until Ctrl-C (or the first session ends
    /// with `single_session`); returns the number of sessions served
    pub async fn serve(self, listener: TcpListener) -> Result<u64> {
        let local_addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        info!(
            server = %self.server_id,
            addr = %local_addr,
            dictionary = %self.backend.describe(),
            "Text analysis service listening"
        );

        let mut sessions = 0u64;

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted.context("Failed to accept connection")?,
                _ = signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
            };

            sessions += 1;
            info!(session = sessions, %peer, "Client connected");

            match self.handle_client(stream, sessions).await {
                Ok(outcome) => {
                    info!(
                        session = sessions,
                        %peer,
                        requests = outcome.report.requests,
                        end = %outcome.report.end,
                        "Client session complete"
                    );
                    if outcome.interrupted {
                        break;
                    }
                }
                Err(e) => warn!(session = sessions, %peer, error = %format!("{:#}", e), "Client session failed"),
            }

            if self.config.server.single_session {
                info!("Single session mode, stopping");
                break;
            }

            info!("Waiting for next connection...");
        }

        Ok(sessions)
    }

    async fn handle_client(&self, stream: TcpStream, id: u64) -> Result<ClientOutcome> {
        let stream = stream
            .into_std()
            .context("Failed to convert client stream")?;
        stream
            .set_nonblocking(false)
            .context("Failed to switch client stream to blocking")?;
        stream
            .set_read_timeout(self.config.server.read_timeout())
            .context("Failed to set client read timeout")?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!(error = %e, "Failed to set TCP_NODELAY");
        }

        let control = stream
            .try_clone()
            .context("Failed to clone client stream")?;
        let reader = stream
            .try_clone()
            .context("Failed to clone client stream")?;

        let mut session = Session::new(id, Arc::clone(&self.backend), self.config.limits.clone());
        if let Some(ref writer) = self.summaries {
            session = session.with_summaries(Arc::clone(writer));
        }

        let mut task = tokio::task::spawn_blocking(move || {
            let mut channel = LineChannel::new(BufReader::new(reader), stream);
            session.run(&mut channel)
        });

        tokio::select! {
            joined = &mut task => {
                let report = joined.context("Session task panicked")?;
                Ok(ClientOutcome { report, interrupted: false })
            }
            _ = signal::ctrl_c() => {
                info!(session = id, "Shutdown requested, closing client connection");
                if let Err(e) = control.shutdown(Shutdown::Both) {
                    warn!(error = %e, "Failed to shut down client connection");
                }
                let report = task.await.context("Session task panicked")?;
                Ok(ClientOutcome { report, interrupted: true })
            }
        }
    }
}

/// Get server identifier (hostname)
fn get_server_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::MemoryBackend;
    use crate::protocol;
    use crate::session::SessionEnd;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const WORDS: [&str; 8] = ["hello", "world", "help", "hall", "cello", "yellow", "the", "fox"];

    fn test_config() -> Config {
        let mut config = Config::default();
        config.server.bind = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.read_timeout = 5;
        config.server.single_session = true;
        config
    }

    async fn converse(addr: std::net::SocketAddr, script: &str) -> String {
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(script.as_bytes()).await.unwrap();

        let mut transcript = String::new();
        client.read_to_string(&mut transcript).await.unwrap();
        transcript
    }

    #[tokio::test]
    async fn test_loopback_session() {
        let backend = MemoryBackend::new(WORDS);
        let service = TextService::with_backend(test_config(), Arc::new(backend.clone())).unwrap();
        let listener = service.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(service.serve(listener));

        let transcript = converse(addr, "helo wrld\r\ny\r\n\r\nn\r\n").await;

        assert!(transcript.contains(protocol::GREETING));
        assert!(transcript.contains("WORD 01: helo"));
        assert!(transcript.contains("WORD 02: wrld"));
        assert!(transcript.find("WORD 01").unwrap() < transcript.find("WORD 02").unwrap());
        assert!(transcript.contains("INPUT: helo wrld"));
        assert!(transcript.contains("OUTPUT: helo world"));
        assert!(transcript.contains(protocol::NO_MORE_INPUT));
        assert!(transcript.contains(protocol::FAREWELL));

        assert_eq!(server.await.unwrap().unwrap(), 1);
        assert!(backend.words().contains(&"helo".to_string()));
    }

    #[tokio::test]
    async fn test_client_hangup_ends_session() {
        let backend = MemoryBackend::new(WORDS);
        let service = TextService::with_backend(test_config(), Arc::new(backend.clone())).unwrap();
        let listener = service.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(service.serve(listener));

        {
            let mut client = TcpStream::connect(addr).await.unwrap();
            client.write_all(b"helo\n").await.unwrap();
            // Dropped before answering the confirmation prompt
        }

        assert_eq!(server.await.unwrap().unwrap(), 1);
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_summaries_opened_from_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("requests.jsonl");
        let mut config = test_config();
        config.output.summary_json = Some(path.clone());

        let backend = MemoryBackend::new(WORDS);
        let service = TextService::with_backend(config, Arc::new(backend)).unwrap();
        let listener = service.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(service.serve(listener));

        converse(addr, "hello world\nn\n").await;
        server.await.unwrap().unwrap();

        let summaries = crate::output::json::read_summaries(&path).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].output, "hello world");
    }

    #[test]
    fn test_session_end_display() {
        assert_eq!(SessionEnd::Declined.to_string(), "declined");
    }
}
