//! Accept-and-store feedback on generated summaries.
//!
//! `summary_id` is stored as given. Summaries are never persisted
//! server-side, so there is nothing to check it against.

use chrono::Utc;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{FeedbackAck, FeedbackEntry, FeedbackRequest, new_feedback_id};
use crate::storage::JsonlFile;

pub const FEEDBACK_FILE_NAME: &str = "feedback.jsonl";
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Reasons a feedback request is rejected before anything is stored.
pub fn validate(request: &FeedbackRequest) -> std::result::Result<(), String> {
    if request.summary_id.trim().is_empty() {
        return Err("summary_id is required".to_string());
    }
    if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
        return Err(format!(
            "rating must be between {} and {}, got {}",
            MIN_RATING, MAX_RATING, request.rating
        ));
    }
    Ok(())
}

pub struct FeedbackStore {
    file: JsonlFile,
}

impl FeedbackStore {
    pub fn new(feedback_dir: &Path) -> Self {
        Self {
            file: JsonlFile::new(feedback_dir.join(FEEDBACK_FILE_NAME)),
        }
    }

    pub async fn submit(&self, request: FeedbackRequest) -> Result<FeedbackAck> {
        let entry = FeedbackEntry {
            feedback_id: new_feedback_id(),
            summary_id: request.summary_id,
            rating: request.rating,
            comments: request.comments,
            timestamp: Utc::now(),
        };

        self.file.append(&entry).await?;
        info!(
            "Stored feedback {} for summary {}: rating={}",
            entry.feedback_id, entry.summary_id, entry.rating
        );

        Ok(FeedbackAck {
            status: "feedback received".to_string(),
            feedback_id: entry.feedback_id,
        })
    }

    pub async fn entries(&self) -> Result<Vec<FeedbackEntry>> {
        self.file.read_all().await
    }
}
