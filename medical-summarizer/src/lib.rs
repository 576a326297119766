pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod feedback;
pub mod files;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod service;
pub mod storage;
pub mod summarizer;
pub mod tasks;
pub mod workflow;

pub use config::AppConfig;
pub use error::{ProviderError, SummarizerError};
pub use service::{AppState, build_router, create_app};
pub use summarizer::Summarizer;
pub use models::*;
