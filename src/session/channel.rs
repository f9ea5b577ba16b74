//! Client channel
//!
//! The coordinator and the session talk to the client only through the
//! `ClientChannel` trait: send a line, send a prompt, read a line. Transport
//! failures surface as `ClientDisconnected` (EOF, reset) or `ClientTimeout`
//! (the socket read timeout expired).

use crate::error::AnalysisError;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Longest line accepted from a client, in bytes; the excess is discarded
pub const MAX_LINE_BYTES: usize = 4096;

/// Line-oriented, ordered connection to one client
///
/// Channels must be `Send`: word workers run on their own threads and take
/// turns writing to the same channel.
pub trait ClientChannel: Send {
    /// Send `line` followed by a line terminator
    fn send_line(&mut self, line: &str) -> Result<(), AnalysisError>;

    /// Send `prompt` without a terminator and flush
    fn send_prompt(&mut self, prompt: &str) -> Result<(), AnalysisError>;

    /// Read the next line, without its terminator
    fn read_line(&mut self) -> Result<String, AnalysisError>;
}

/// `ClientChannel` over any buffered reader and writer
///
/// Used with a `TcpStream` pair in service mode and with stdin/stdout in
/// standalone mode.
pub struct LineChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> LineChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R, W> ClientChannel for LineChannel<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn send_line(&mut self, line: &str) -> Result<(), AnalysisError> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush())
            .map_err(map_io_error)
    }

    fn send_prompt(&mut self, prompt: &str) -> Result<(), AnalysisError> {
        self.writer
            .write_all(prompt.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(map_io_error)
    }

    fn read_line(&mut self) -> Result<String, AnalysisError> {
        match read_bounded_line(&mut self.reader, MAX_LINE_BYTES).map_err(map_io_error)? {
            Some(line) => Ok(line),
            None => Err(AnalysisError::ClientDisconnected),
        }
    }
}

/// Read one line of at most `limit` bytes
///
/// Bytes past `limit` are consumed and dropped up to the newline. The
/// terminator (`\n` or `\r\n`) is stripped. Returns `None` at end of stream.
fn read_bounded_line<R: BufRead>(reader: &mut R, limit: usize) -> io::Result<Option<String>> {
    let mut line: Vec<u8> = Vec::new();
    let mut saw_any = false;

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        if available.is_empty() {
            if !saw_any {
                return Ok(None);
            }
            break;
        }
        saw_any = true;

        let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (&available[..pos], pos + 1, true),
            None => (available, available.len(), false),
        };

        let room = limit.saturating_sub(line.len());
        line.extend_from_slice(&chunk[..chunk.len().min(room)]);
        reader.consume(consumed);

        if done {
            break;
        }
    }

    while matches!(line.last(), Some(b'\r') | Some(b'\n')) {
        line.pop();
    }

    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

fn map_io_error(err: io::Error) -> AnalysisError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            debug!(error = %err, "Client read timed out");
            AnalysisError::ClientTimeout
        }
        _ => {
            debug!(error = %err, "Client channel failed");
            AnalysisError::ClientDisconnected
        }
    }
}
