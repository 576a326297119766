use async_trait::async_trait;
use note_flow::{Context, FlowError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::{error, info};

use super::{ProviderFailure, keys};
use crate::client::CompletionClient;

pub struct CompletionTask {
    client: Arc<dyn CompletionClient>,
}

impl CompletionTask {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Task for CompletionTask {
    fn id(&self) -> &str {
        "completion"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let prompt: String = context.require(keys::PROMPT).await?;

        let completion = match self.client.complete(&prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                error!("Error in summarization: {}", e);
                context
                    .set(keys::PROVIDER_FAILURE, ProviderFailure::from(&e))
                    .await?;
                return Err(FlowError::TaskExecutionFailed(e.to_string()));
            }
        };

        if let Some(usage) = &completion.usage {
            info!(
                "Token usage: prompt={} completion={} total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        context.set(keys::COMPLETION, completion).await?;
        Ok(TaskResult::new(None, NextAction::Continue))
    }
}
