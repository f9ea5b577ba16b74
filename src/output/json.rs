//! JSON request summaries
//!
//! When `output.summary_json` is set, every completed request is appended to
//! that file as one JSON object per line:
//!
//! ```text
//! {"timestamp":"2024-05-01T10:00:00Z","session":1,"request":1,"input":"helo world",
//!  "output":"hello world","words":2,"groups":1,"words_added":[],"output_too_long":false}
//! ```

use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Summary of one completed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSummary {
    pub timestamp: DateTime<Utc>,
    /// Session counter within this server process (1-based)
    pub session: u64,
    /// Request counter within the session (1-based)
    pub request: u64,
    pub input: String,
    pub output: String,
    pub words: usize,
    pub groups: usize,
    /// Words the client confirmed into the dictionary, in order
    pub words_added: Vec<String>,
    pub output_too_long: bool,
}

/// Appends request summaries as JSON lines
#[derive(Debug)]
pub struct SummaryWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SummaryWriter {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open summary file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one summary and flush it
    pub fn write(&mut self, summary: &RequestSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)
            .context("Failed to serialize request summary")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to flush summary file")?;
        Ok(())
    }
}

/// Read back every summary in a JSON-lines file
pub fn read_summaries(path: &Path) -> Result<Vec<RequestSummary>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read summary file: {}", path.display()))?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("Failed to parse request summary"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn summary(request: u64, output: &str) -> RequestSummary {
        RequestSummary {
            timestamp: Utc::now(),
            session: 1,
            request,
            input: "helo world".to_string(),
            output: output.to_string(),
            words: 2,
            groups: 1,
            words_added: vec!["helo".to_string()],
            output_too_long: false,
        }
    }

    #[test]
    fn test_appends_one_line_per_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summaries.jsonl");

        let mut writer = SummaryWriter::open(&path).unwrap();
        writer.write(&summary(1, "helo world")).unwrap();
        writer.write(&summary(2, "hello world")).unwrap();
        drop(writer);

        // Reopening appends instead of truncating
        let mut writer = SummaryWriter::open(&path).unwrap();
        writer.write(&summary(3, "world")).unwrap();

        let summaries = read_summaries(&path).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].output, "helo world");
        assert_eq!(summaries[2].request, 3);
        assert_eq!(summaries[0].words_added, vec!["helo"]);
    }
}
