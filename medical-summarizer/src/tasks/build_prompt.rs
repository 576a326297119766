use async_trait::async_trait;
use note_flow::{Context, NextAction, Result, Task, TaskResult};
use tracing::debug;

use super::{NoteJob, keys};
use crate::prompt::build_prompt;

pub struct BuildPromptTask;

#[async_trait]
impl Task for BuildPromptTask {
    fn id(&self) -> &str {
        "build_prompt"
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let job: NoteJob = context.require(keys::NOTE).await?;

        let prompt = build_prompt(&job.raw_text, job.role, job.format, job.highlight_critical);
        debug!("Built {} character prompt for role {}", prompt.len(), job.role);

        context.set(keys::PROMPT, prompt).await?;
        Ok(TaskResult::new(None, NextAction::Continue))
    }
}
