//! Process configuration, read once at startup and immutable afterwards.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SummarizerError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

/// Everything the completion client needs to reach the provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

// Keep the credential out of debug output.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Relative request directories are resolved against this path.
    pub notes_dir: PathBuf,
    pub log_dir: PathBuf,
    pub feedback_dir: PathBuf,
    pub min_note_chars: usize,
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables, loading the
    /// provider credential from `API_KEY_FILE`.
    pub fn from_env() -> Result<Self> {
        let key_file = env_or("API_KEY_FILE", "api-key.rtf");
        let api_key = load_api_key(Path::new(&key_file))?;

        let provider = ProviderConfig {
            base_url: env_or("LLM_BASE_URL", DEFAULT_BASE_URL),
            model: env_or("LLM_MODEL", DEFAULT_MODEL),
            api_key,
            max_tokens: env_parse("LLM_MAX_TOKENS", 1024)?,
            timeout: Duration::from_secs(env_parse("LLM_TIMEOUT_SECS", 60)?),
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8000)?,
            notes_dir: PathBuf::from(env_or("NOTES_DIR", ".")),
            log_dir: PathBuf::from(env_or("LOG_DIR", "./logs")),
            feedback_dir: PathBuf::from(env_or("FEEDBACK_DIR", "./feedback")),
            min_note_chars: env_parse("MIN_NOTE_CHARS", 10)?,
            provider,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The credential is the first line of the key file.
pub fn load_api_key(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SummarizerError::Config(format!("failed to read API key file {}: {}", path.display(), e))
    })?;

    let key = raw.lines().next().unwrap_or_default().trim();
    if key.is_empty() {
        return Err(SummarizerError::Config(format!(
            "API key file {} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| SummarizerError::Config(format!("invalid value for {}: {}", name, value))),
        Err(_) => Ok(default),
    }
}
