use note_flow::{Pipeline, PipelineBuilder};
use std::sync::Arc;

use crate::client::CompletionClient;
use crate::tasks::{BuildPromptTask, CompletionTask, ParseSummaryTask};

/// Prompt -> completion -> parse, run once per note.
pub fn build_summary_pipeline(client: Arc<dyn CompletionClient>) -> Pipeline {
    PipelineBuilder::new("note_summary")
        .add_task(Arc::new(BuildPromptTask))
        .add_task(Arc::new(CompletionTask::new(client)))
        .add_task(Arc::new(ParseSummaryTask))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Completion;
    use crate::error::ProviderError;
    use crate::models::{ClinicalRole, SummaryFormat};
    use crate::parser::ParsedCompletion;
    use crate::tasks::{NoteJob, keys};
    use async_trait::async_trait;
    use note_flow::Context;

    struct EchoClient;

    #[async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(&self, _prompt: &str) -> Result<Completion, ProviderError> {
            Ok(Completion {
                text: "SUMMARY: Echoed.".to_string(),
                model: "echo".to_string(),
                usage: None,
            })
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_pipeline_runs_prompt_completion_parse() {
        let pipeline = build_summary_pipeline(Arc::new(EchoClient));
        assert_eq!(
            pipeline.task_ids(),
            vec!["build_prompt", "completion", "parse_summary"]
        );

        let context = Context::new();
        context
            .set(
                keys::NOTE,
                NoteJob {
                    raw_text: "Sample medical note for testing.".to_string(),
                    role: ClinicalRole::Nurse,
                    format: SummaryFormat::Brief,
                    highlight_critical: false,
                },
            )
            .await
            .unwrap();

        let result = pipeline.execute(context.clone()).await.unwrap();

        assert_eq!(result.response.as_deref(), Some("Echoed."));
        let prompt: String = context.get(keys::PROMPT).await.unwrap();
        assert!(prompt.contains("Write for a nurse"));
        let parsed: ParsedCompletion = context.get(keys::PARSED).await.unwrap();
        assert!(matches!(parsed, ParsedCompletion::Structured(_)));
    }

    #[tokio::test]
    async fn test_missing_note_fails_first_task() {
        let pipeline = build_summary_pipeline(Arc::new(EchoClient));
        let err = pipeline.execute(Context::new()).await.unwrap_err();
        assert!(err.to_string().contains(keys::NOTE));
    }
}
