use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    audit::AuditLog,
    client::{ChatCompletionsClient, CompletionClient},
    config::AppConfig,
    error::SummarizerError,
    feedback::{self, FeedbackStore},
    models::{FeedbackAck, FeedbackRequest, Summary, SummaryRequest},
    summarizer::Summarizer,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, directory: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "directory": directory
        })),
    )
}

fn bad_gateway_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub feedback_store: Arc<FeedbackStore>,
}

impl AppState {
    pub fn new(config: &AppConfig, client: Arc<dyn CompletionClient>) -> Self {
        let summarizer = Summarizer::new(
            client,
            AuditLog::new(&config.log_dir),
            config.notes_dir.clone(),
            config.min_note_chars,
        );

        AppState {
            summarizer: Arc::new(summarizer),
            feedback_store: Arc::new(FeedbackStore::new(&config.feedback_dir)),
        }
    }
}

pub fn create_app(config: &AppConfig) -> Result<Router, SummarizerError> {
    let client = ChatCompletionsClient::new(config.provider.clone())
        .map_err(|e| SummarizerError::Config(format!("failed to build provider client: {}", e)))?;
    let app_state = AppState::new(config, Arc::new(client));
    Ok(build_router(app_state))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/summarize", post(summarize))
        .route("/feedback", post(submit_feedback))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Medical Note Summarizer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Summarizes medical text notes with a large language model",
        "endpoints": {
            "POST /summarize": "Summarize every note in a directory",
            "POST /feedback": "Submit feedback on a generated summary",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> ApiResult<Vec<Summary>> {
    info!("Summarize request for directory: {}", request.directory);

    validate_directory(&request.directory)?;

    state
        .summarizer
        .summarize(&request)
        .await
        .map(Json)
        .map_err(|e| summarize_error(&request.directory, e))
}

fn validate_directory(directory: &str) -> Result<(), ApiError> {
    if directory.trim().is_empty() {
        return Err(bad_request_error("directory is required"));
    }
    Ok(())
}

fn summarize_error(directory: &str, e: SummarizerError) -> ApiError {
    match &e {
        SummarizerError::NotFound(_) => not_found_error("Directory not found", directory),
        SummarizerError::NotADirectory(_) => not_found_error("Not a directory", directory),
        SummarizerError::BatchFailed { .. } => {
            error!("Summarization failed for every note in {}: {}", directory, e);
            bad_gateway_error("Summarization failed for every note", &e.to_string())
        }
        _ => {
            error!("Error processing files: {}", e);
            internal_error("Failed to process notes", &e.to_string())
        }
    }
}

async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<FeedbackAck> {
    info!(
        "Received feedback for summary {}: rating={}",
        request.summary_id, request.rating
    );

    feedback::validate(&request).map_err(|message| {
        warn!("Rejected feedback: {}", message);
        bad_request_error(&message)
    })?;

    state.feedback_store.submit(request).await.map(Json).map_err(|e| {
        error!("Failed to store feedback: {}", e);
        internal_error("Failed to store feedback", &e.to_string())
    })
}
