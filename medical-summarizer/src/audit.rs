//! Per-attempt audit trail: one JSON line per note the summarizer touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ProviderErrorKind, Result};
use crate::models::{ClinicalRole, SummaryFormat, TokenUsage};
use crate::storage::JsonlFile;

pub const AUDIT_FILE_NAME: &str = "summaries.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<String>,
    pub file_name: String,
    pub role: ClinicalRole,
    pub format: SummaryFormat,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
    pub latency_ms: u64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ProviderErrorKind>,
}

pub struct AuditLog {
    file: JsonlFile,
}

impl AuditLog {
    pub fn new(log_dir: &Path) -> Self {
        Self {
            file: JsonlFile::new(log_dir.join(AUDIT_FILE_NAME)),
        }
    }

    pub async fn record(&self, entry: &LogEntry) -> Result<()> {
        self.file.append(entry).await
    }

    pub async fn entries(&self) -> Result<Vec<LogEntry>> {
        self.file.read_all().await
    }
}
