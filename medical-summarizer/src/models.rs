use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ProviderErrorKind;

/// `sentence_<i>` of the summary -> indices of the note paragraphs it came from.
pub type SourceMapping = BTreeMap<String, Vec<usize>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub directory: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_highlight_critical")]
    pub highlight_critical: bool,
    #[serde(default)]
    pub recursive: bool,
}

fn default_highlight_critical() -> bool {
    true
}

/// Audience the summary is written for. Unknown labels fall back to `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalRole {
    Physician,
    Nurse,
    Pharmacist,
    Patient,
    #[default]
    General,
}

impl ClinicalRole {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("physician") | Some("doctor") => ClinicalRole::Physician,
            Some("nurse") => ClinicalRole::Nurse,
            Some("pharmacist") => ClinicalRole::Pharmacist,
            Some("patient") => ClinicalRole::Patient,
            _ => ClinicalRole::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalRole::Physician => "physician",
            ClinicalRole::Nurse => "nurse",
            ClinicalRole::Pharmacist => "pharmacist",
            ClinicalRole::Patient => "patient",
            ClinicalRole::General => "general",
        }
    }
}

impl fmt::Display for ClinicalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Length and layout of the summary. Unknown labels fall back to `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Brief,
    #[default]
    Standard,
    Detailed,
    Bullets,
}

impl SummaryFormat {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("brief") => SummaryFormat::Brief,
            Some("detailed") => SummaryFormat::Detailed,
            Some("bullets") | Some("bullet") => SummaryFormat::Bullets,
            _ => SummaryFormat::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryFormat::Brief => "brief",
            SummaryFormat::Standard => "standard",
            SummaryFormat::Detailed => "detailed",
            SummaryFormat::Bullets => "bullets",
        }
    }
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One note read from disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub file_name: String,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub model: String,
    pub role: ClinicalRole,
    pub format: SummaryFormat,
    pub processing_time_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    pub timestamp: DateTime<Utc>,
}

/// Per-note result returned by `/summarize`.
///
/// Failed notes keep their place in the response with `status: failed` and
/// an `error` instead of `summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub summary_id: String,
    pub file_name: String,
    pub status: SummaryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_findings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mapping: Option<SourceMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SummaryMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ProviderErrorKind>,
}

impl Summary {
    pub fn failed(
        summary_id: impl Into<String>,
        file_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            summary_id: summary_id.into(),
            file_name: file_name.into(),
            status: SummaryStatus::Failed,
            summary: None,
            critical_findings: None,
            source_mapping: None,
            metadata: None,
            error: Some(error.into()),
            error_kind: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == SummaryStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub summary_id: String,
    pub rating: i64,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Stored form of a feedback submission, one JSON line per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub feedback_id: String,
    pub summary_id: String,
    pub rating: i64,
    pub comments: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAck {
    pub status: String,
    pub feedback_id: String,
}

pub fn new_summary_id() -> String {
    format!("sum_{}", uuid::Uuid::new_v4().simple())
}

pub fn new_feedback_id() -> String {
    format!("fb_{}", uuid::Uuid::new_v4().simple())
}
