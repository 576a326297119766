pub mod context;
pub mod error;
pub mod pipeline;
pub mod task;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use pipeline::{ExecutionResult, Pipeline, PipelineBuilder};
pub use task::{NextAction, Task, TaskResult};
