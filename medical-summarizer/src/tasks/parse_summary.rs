use async_trait::async_trait;
use note_flow::{Context, NextAction, Result, Task, TaskResult};
use tracing::warn;

use super::{NoteJob, keys};
use crate::client::Completion;
use crate::parser::{ParsedCompletion, parse_completion};
use crate::prompt::paragraphs;

pub struct ParseSummaryTask;

#[async_trait]
impl Task for ParseSummaryTask {
    fn id(&self) -> &str {
        "parse_summary"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let job: NoteJob = context.require(keys::NOTE).await?;
        let completion: Completion = context.require(keys::COMPLETION).await?;

        let passage_count = paragraphs(&job.raw_text).len();
        let parsed = parse_completion(&completion.text, job.highlight_critical, passage_count);
        let status = match &parsed {
            ParsedCompletion::Structured(_) => "parsed structured summary",
            ParsedCompletion::Unstructured(_) => {
                warn!("No section markers in completion, using the raw text as the summary");
                "no section markers, raw completion used"
            }
        };

        let summary = parsed.summary_text().to_string();
        context.set(keys::PARSED, parsed).await?;

        Ok(TaskResult::new_with_status(
            Some(summary),
            NextAction::End,
            Some(status.to_string()),
        ))
    }
}
