use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Pipeline has no tasks: {0}")]
    EmptyPipeline(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
