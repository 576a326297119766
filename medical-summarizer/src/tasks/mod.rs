pub mod build_prompt;
pub mod completion;
pub mod parse_summary;

pub use build_prompt::BuildPromptTask;
pub use completion::CompletionTask;
pub use parse_summary::ParseSummaryTask;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderErrorKind};
use crate::models::{ClinicalRole, SummaryFormat};

/// Context keys shared by the summary tasks.
pub mod keys {
    pub const NOTE: &str = "note";
    pub const PROMPT: &str = "prompt";
    pub const COMPLETION: &str = "completion";
    pub const PARSED: &str = "parsed";
    pub const PROVIDER_FAILURE: &str = "provider_failure";
}

/// Input placed in the context before the pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteJob {
    pub raw_text: String,
    pub role: ClinicalRole,
    pub format: SummaryFormat,
    pub highlight_critical: bool,
}

/// Left in the context when the completion call fails, so the caller can
/// report the provider's own error instead of the pipeline's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl From<&ProviderError> for ProviderFailure {
    fn from(e: &ProviderError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
