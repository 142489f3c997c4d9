//! JSON-lines event feed.
//!
//! One [`FeedRecord`] per line; blank lines and lines starting with `#` are
//! ignored. Records must already be in source order.

use std::path::Path;

use anyhow::{Context, Result};
use futures::{stream, Stream};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};

use crate::db::models::FeedRecord;

/// Parse one feed line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<FeedRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let record = serde_json::from_str(trimmed).context("Invalid feed record")?;
    Ok(Some(record))
}

/// Parse a whole feed held in memory.
pub fn parse_feed(contents: &str) -> Result<Vec<FeedRecord>> {
    let mut records = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        if let Some(record) = parse_line(line).with_context(|| format!("line {}", i + 1))? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Streaming reader over a feed file.
pub struct FeedReader {
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl FeedReader {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open feed {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    /// Next record, or `None` at end of file.
    pub async fn next_record(&mut self) -> Result<Option<FeedRecord>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            if let Some(record) =
                parse_line(&line).with_context(|| format!("line {}", self.line_number))?
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<FeedRecord>> {
        stream::unfold(self, |mut reader| async move {
            reader
                .next_record()
                .await
                .transpose()
                .map(|item| (item, reader))
        })
    }
}
