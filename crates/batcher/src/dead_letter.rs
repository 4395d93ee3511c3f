//! Terminal record of batches that could not be anchored.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use gateway_primitives::Cid;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::{error, info};

/// Default file the dead-letter sink appends to.
pub const DEFAULT_DEAD_LETTER_FILE: &str = "dead-letter-queue.log";

/// One permanently failed batch, kept for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    /// The batch exactly as it was flushed.
    pub batch: Vec<Cid>,
}

impl DeadLetterEntry {
    pub fn new(batch: Vec<Cid>, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            reason: reason.into(),
            batch,
        }
    }
}

fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Append-only store for [`DeadLetterEntry`] records.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait DeadLetterSink: Send + Sync + 'static {
    async fn append(&self, entry: &DeadLetterEntry) -> Result<(), DeadLetterError>;
}

/// Writes entries as JSON lines to a local file.
#[derive(Debug)]
pub struct FileDeadLetterSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDeadLetterSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DeadLetterSink for FileDeadLetterSink {
    async fn append(&self, entry: &DeadLetterEntry) -> Result<(), DeadLetterError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let write_err = |source| DeadLetterError::Write {
            path: self.path.clone(),
            source,
        };

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;
        file.write_all(&line).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        Ok(())
    }
}

/// Persists `batch` to `sink`.
///
/// Never fails: a write error is logged with the full batch so the CIDs
/// still reach an operator through the logs.
pub async fn record_dead_letter<S: DeadLetterSink + ?Sized>(
    sink: &S,
    batch: Vec<Cid>,
    reason: impl Into<String>,
) {
    let entry = DeadLetterEntry::new(batch, reason);
    match sink.append(&entry).await {
        Ok(()) => info!(
            batch_len = entry.batch.len(),
            reason = %entry.reason,
            "batch moved to dead-letter queue"
        ),
        Err(err) => error!(
            %err,
            reason = %entry.reason,
            batch = ?entry.batch,
            "failed to write dead-letter entry"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn batch(n: usize) -> Vec<Cid> {
        (0..n).map(|i| Cid::new(format!("bafy-{i}"))).collect()
    }

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileDeadLetterSink::new(dir.path().join(DEFAULT_DEAD_LETTER_FILE));

        record_dead_letter(&sink, batch(3), "first").await;
        record_dead_letter(&sink, batch(1), "second").await;

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let entries: Vec<DeadLetterEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].reason, "first");
        assert_eq!(entries[0].batch, batch(3));
        assert_eq!(entries[1].reason, "second");
        assert_eq!(entries[1].batch, batch(1));
    }

    #[tokio::test]
    async fn test_entry_layout() {
        let entry = DeadLetterEntry::new(batch(2), "boom");
        let value: serde_json::Value = serde_json::to_value(&entry).unwrap();
        let ts = value["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "timestamp {ts} should be UTC");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
        assert_eq!(value["reason"], "boom");
        assert_eq!(value["batch"], serde_json::json!(["bafy-0", "bafy-1"]));
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileDeadLetterSink::new(dir.path().join("dlq.log")));

        let mut tasks = Vec::new();
        for i in 0..16 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                record_dead_letter(sink.as_ref(), batch(50), format!("task {i}")).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let contents = tokio::fs::read_to_string(sink.path()).await.unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 16);
        for line in lines {
            let entry: DeadLetterEntry = serde_json::from_str(line).unwrap();
            assert_eq!(entry.batch.len(), 50);
        }
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        let mut sink = MockDeadLetterSink::new();
        sink.expect_append().times(1).returning(|_| {
            Err(DeadLetterError::Write {
                path: PathBuf::from("/nonexistent/dlq.log"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        });

        record_dead_letter(&sink, batch(2), "unreachable disk").await;
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileDeadLetterSink::new(dir.path().join("missing").join("dlq.log"));
        let err = sink
            .append(&DeadLetterEntry::new(batch(1), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeadLetterError::Write { .. }));
    }
}
