use std::sync::Arc;
use tracing::debug;

use crate::{
    context::Context,
    error::{FlowError, Result},
    task::{NextAction, Task, TaskResult},
};

/// An ordered chain of tasks sharing one [`Context`]
pub struct Pipeline {
    pub id: String,
    tasks: Vec<Arc<dyn Task>>,
}

impl Pipeline {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: Vec::new(),
        }
    }

    /// Append a task to the end of the pipeline
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id()).collect()
    }

    /// Run every task in order against `context`.
    ///
    /// Execution stops at the first task that fails or returns
    /// [`NextAction::End`]. The returned result is the last one produced.
    pub async fn execute(&self, context: Context) -> Result<ExecutionResult> {
        let first = self
            .tasks
            .first()
            .ok_or_else(|| FlowError::EmptyPipeline(self.id.clone()))?;
        self.execute_from(first.id(), context).await
    }

    /// Run the pipeline starting at `task_id` instead of the first task
    pub async fn execute_from(&self, task_id: &str, context: Context) -> Result<ExecutionResult> {
        let start = self
            .tasks
            .iter()
            .position(|t| t.id() == task_id)
            .ok_or_else(|| FlowError::TaskNotFound(task_id.to_string()))?;

        let mut completed = Vec::new();
        let mut last: Option<TaskResult> = None;

        for task in &self.tasks[start..] {
            debug!(pipeline = %self.id, task = task.id(), "running task");
            let mut result = task.run(context.clone()).await?;
            result.task_id = task.id().to_string();
            completed.push(result.task_id.clone());

            let stop = result.next_action == NextAction::End;
            last = Some(result);
            if stop {
                break;
            }
        }

        let last = last.ok_or_else(|| FlowError::EmptyPipeline(self.id.clone()))?;
        Ok(ExecutionResult {
            response: last.response,
            status_message: last.status_message,
            completed_tasks: completed,
        })
    }
}

/// Builder for creating pipelines
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            pipeline: Pipeline::new(id),
        }
    }

    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        self.pipeline.add_task(task);
        self
    }

    pub fn build(self) -> Pipeline {
        self.pipeline
    }
}

/// Outcome of a pipeline run
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status_message: Option<String>,
    /// Ids of the tasks that ran, in order
    pub completed_tasks: Vec<String>,
}
