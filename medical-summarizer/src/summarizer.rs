use chrono::Utc;
use note_flow::{Context, Pipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::audit::{AuditLog, LogEntry, Outcome};
use crate::client::{Completion, CompletionClient};
use crate::error::{ProviderErrorKind, Result, SummarizerError};
use crate::files::{discover_notes, display_name, read_note};
use crate::models::{
    ClinicalRole, SourceFile, Summary, SummaryFormat, SummaryMetadata, SummaryRequest,
    SummaryStatus, new_summary_id,
};
use crate::parser::{ParsedCompletion, lexical_source_mapping};
use crate::tasks::{NoteJob, ProviderFailure, keys};
use crate::workflow::build_summary_pipeline;

/// Runs the summary pipeline over every note in a directory, one note at a
/// time, and records an audit entry for each.
pub struct Summarizer {
    pipeline: Pipeline,
    model: String,
    audit: AuditLog,
    notes_dir: PathBuf,
    min_note_chars: usize,
}

impl Summarizer {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        audit: AuditLog,
        notes_dir: impl Into<PathBuf>,
        min_note_chars: usize,
    ) -> Self {
        Self {
            model: client.model().to_string(),
            pipeline: build_summary_pipeline(client),
            audit,
            notes_dir: notes_dir.into(),
            min_note_chars,
        }
    }

    pub fn resolve_directory(&self, directory: &str) -> PathBuf {
        let path = Path::new(directory);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.notes_dir.join(path)
        }
    }

    pub async fn summarize(&self, request: &SummaryRequest) -> Result<Vec<Summary>> {
        let role = ClinicalRole::from_label(request.role.as_deref());
        let format = SummaryFormat::from_label(request.format.as_deref());
        let directory = self.resolve_directory(&request.directory);

        info!("Processing text files from directory: {}", directory.display());
        let paths = discover_notes(&directory, request.recursive).await?;

        let mut summaries = Vec::with_capacity(paths.len());
        for path in &paths {
            let note = match read_note(&directory, path).await {
                Ok(note) => note,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    self.record_skip(&display_name(&directory, path), role, format, e.to_string())
                        .await;
                    continue;
                }
            };

            if note.raw_text.chars().count() < self.min_note_chars {
                warn!("File {} too short, skipping", path.display());
                self.record_skip(&note.file_name, role, format, "note too short".to_string())
                    .await;
                continue;
            }

            let summary = self
                .summarize_note(note, role, format, request.highlight_critical)
                .await;
            summaries.push(summary);
        }

        let failed: Vec<&Summary> = summaries.iter().filter(|s| s.is_failed()).collect();
        if !summaries.is_empty() && failed.len() == summaries.len() {
            let first_error = failed[0].error.clone().unwrap_or_default();
            error!("Every note in {} failed to summarize", directory.display());
            return Err(SummarizerError::BatchFailed {
                failed: failed.len(),
                first_error,
            });
        }

        info!(
            "Generated {} summaries ({} failed) from {}",
            summaries.len(),
            failed.len(),
            directory.display()
        );
        Ok(summaries)
    }

    async fn summarize_note(
        &self,
        note: SourceFile,
        role: ClinicalRole,
        format: SummaryFormat,
        highlight_critical: bool,
    ) -> Summary {
        let summary_id = new_summary_id();
        let started = Instant::now();

        let job = NoteJob {
            raw_text: note.raw_text.clone(),
            role,
            format,
            highlight_critical,
        };
        let outcome = self.run_pipeline(job).await;
        let elapsed = started.elapsed();
        let latency_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok((completion, parsed)) => {
                let (text, critical_findings, source_mapping) = match parsed {
                    ParsedCompletion::Structured(s) => {
                        let mapping = s
                            .source_mapping
                            .unwrap_or_else(|| lexical_source_mapping(&note.raw_text, &s.summary));
                        (
                            s.summary,
                            highlight_critical.then_some(s.critical_findings),
                            Some(mapping).filter(|m| !m.is_empty()),
                        )
                    }
                    ParsedCompletion::Unstructured(raw) => (raw, None, None),
                };

                let timestamp = Utc::now();
                self.record(LogEntry {
                    timestamp,
                    summary_id: Some(summary_id.clone()),
                    file_name: note.file_name.clone(),
                    role,
                    format,
                    model: completion.model.clone(),
                    token_usage: completion.usage,
                    latency_ms,
                    outcome: Outcome::Success,
                    error: None,
                    error_kind: None,
                })
                .await;
                info!("Generated summary {} for file: {}", summary_id, note.file_name);

                Summary {
                    summary_id,
                    file_name: note.file_name,
                    status: SummaryStatus::Completed,
                    summary: Some(text),
                    critical_findings,
                    source_mapping,
                    metadata: Some(SummaryMetadata {
                        model: completion.model,
                        role,
                        format,
                        processing_time_sec: elapsed.as_secs_f64(),
                        tokens: completion.usage,
                        timestamp,
                    }),
                    error: None,
                    error_kind: None,
                }
            }
            Err(NoteError { kind, message }) => {
                error!("Failed to summarize {}: {}", note.file_name, message);
                self.record(LogEntry {
                    timestamp: Utc::now(),
                    summary_id: Some(summary_id.clone()),
                    file_name: note.file_name.clone(),
                    role,
                    format,
                    model: self.model.clone(),
                    token_usage: None,
                    latency_ms,
                    outcome: Outcome::Error,
                    error: Some(message.clone()),
                    error_kind: kind,
                })
                .await;

                let mut failed = Summary::failed(summary_id, note.file_name, message);
                failed.error_kind = kind;
                failed
            }
        }
    }

    async fn run_pipeline(
        &self,
        job: NoteJob,
    ) -> std::result::Result<(Completion, ParsedCompletion), NoteError> {
        let context = Context::new();
        match execute(&self.pipeline, &context, job).await {
            Ok(outputs) => Ok(outputs),
            // Prefer the provider's own error over the pipeline's wrapper.
            Err(e) => match context.get::<ProviderFailure>(keys::PROVIDER_FAILURE).await {
                Some(failure) => Err(NoteError {
                    kind: Some(failure.kind),
                    message: failure.message,
                }),
                None => Err(NoteError {
                    kind: None,
                    message: e.to_string(),
                }),
            },
        }
    }

    async fn record_skip(
        &self,
        file_name: &str,
        role: ClinicalRole,
        format: SummaryFormat,
        reason: String,
    ) {
        self.record(LogEntry {
            timestamp: Utc::now(),
            summary_id: None,
            file_name: file_name.to_string(),
            role,
            format,
            model: self.model.clone(),
            token_usage: None,
            latency_ms: 0,
            outcome: Outcome::Skipped,
            error: Some(reason),
            error_kind: None,
        })
        .await;
    }

    // An audit write failure is reported but does not fail the summary.
    async fn record(&self, entry: LogEntry) {
        if let Err(e) = self.audit.record(&entry).await {
            error!(
                "Failed to write audit record for {} ({:?}): {}",
                entry.file_name, entry.summary_id, e
            );
        }
    }
}

struct NoteError {
    kind: Option<ProviderErrorKind>,
    message: String,
}

async fn execute(
    pipeline: &Pipeline,
    context: &Context,
    job: NoteJob,
) -> note_flow::Result<(Completion, ParsedCompletion)> {
    context.set(keys::NOTE, job).await?;
    pipeline.execute(context.clone()).await?;

    let completion: Completion = context.require(keys::COMPLETION).await?;
    let parsed: ParsedCompletion = context.require(keys::PARSED).await?;
    Ok((completion, parsed))
}
