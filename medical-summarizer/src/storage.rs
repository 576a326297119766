use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{trace, warn};

use crate::error::{Result, SummarizerError};

/// Append-only JSON Lines file.
///
/// Each record is serialized up front and written with a single call while
/// holding the lock, so concurrent requests never interleave partial lines.
pub struct JsonlFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append<T: Serialize>(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record).map_err(|e| {
            SummarizerError::storage(&self.path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SummarizerError::storage(parent, e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
            .map_err(|e| SummarizerError::storage(&self.path, e))?;
        file.write_all(&line)
            .await
            .map_err(|e| SummarizerError::storage(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| SummarizerError::storage(&self.path, e))?;

        trace!(path = %self.path.display(), "appended record");
        Ok(())
    }

    /// Read every record back. A missing file reads as empty; lines that do
    /// not parse are skipped.
    pub async fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SummarizerError::storage(&self.path, e)),
        };

        let mut out = Vec::new();
        for line in data.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(record) => out.push(record),
                Err(e) => warn!("Skipping unparsable line in {}: {}", self.path.display(), e),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        n: usize,
        text: String,
    }

    #[tokio::test]
    async fn test_creates_parent_directory_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonlFile::new(dir.path().join("nested").join("records.jsonl"));

        file.append(&Record { n: 1, text: "one".into() }).await.unwrap();
        file.append(&Record { n: 2, text: "two".into() }).await.unwrap();

        let records: Vec<Record> = file.read_all().await.unwrap();
        assert_eq!(
            records,
            vec![
                Record { n: 1, text: "one".into() },
                Record { n: 2, text: "two".into() }
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonlFile::new(dir.path().join("absent.jsonl"));
        let records: Vec<Record> = file.read_all().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let file = Arc::new(JsonlFile::new(dir.path().join("records.jsonl")));

        let mut handles = Vec::new();
        for n in 0..32 {
            let file = file.clone();
            handles.push(tokio::spawn(async move {
                let text = "x".repeat(4096 + n);
                file.append(&Record { n, text }).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw.lines().count(), 32);
        let mut seen: Vec<usize> = raw
            .lines()
            .map(|l| serde_json::from_str::<Record>(l).unwrap().n)
            .collect();
        seen.sort();
        assert_eq!(seen, (0..32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unwritable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let file = JsonlFile::new(blocker.join("records.jsonl"));
        let err = file.append(&Record { n: 0, text: String::new() }).await.unwrap_err();
        assert!(matches!(err, SummarizerError::Storage { .. }));
    }
}
