//! HTTP request handlers for the server.
//!
//! Implements batch parsing and health check endpoints using axum.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use trialparse_domain::EligibilityRelation;
use trialparse_engine::{Dictionaries, Engine};
use trialparse_pipeline::{BatchReport, PipelineAggregator, PipelineError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Batch pipeline over the configured engine
    pub aggregator: Arc<PipelineAggregator<Engine>>,
    /// Dictionaries loaded at startup
    pub dictionaries: Arc<Dictionaries>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Entries in the variable dictionary
    pub variables: usize,
    /// Entries in the unit dictionary
    pub units: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind
    pub kind: String,
    /// Error message
    pub message: String,
    /// Study that caused the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_id: Option<String>,
    /// Input row that caused the failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request body is not a JSON array of string rows
    MalformedRequest(String),
    /// Batch failed
    Pipeline(PipelineError),
    /// Internal server error
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MalformedRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    kind: "malformed_request".to_string(),
                    message,
                    study_id: None,
                    row_index: None,
                },
            ),
            AppError::Pipeline(e) => {
                let status = match e {
                    PipelineError::Ingest(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    ErrorResponse {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                        study_id: e.study_id().map(str::to_string),
                        row_index: e.row_index(),
                    },
                )
            }
            AppError::InternalError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    kind: "internal".to_string(),
                    message,
                    study_id: None,
                    row_index: None,
                },
            ),
        };

        if status.is_server_error() {
            error!("{}: {}", body.kind, body.message);
        } else {
            warn!("Rejected batch: {}", body.message);
        }

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

fn parse_rows(body: &[u8]) -> Result<Vec<Vec<String>>, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedRequest(format!("Expected a JSON array of rows: {}", e)))
}

async fn run_batch(state: &AppState, body: &[u8]) -> Result<BatchReport, AppError> {
    let rows = parse_rows(body)?;
    Ok(state.aggregator.ingest(&rows).await?)
}

/// POST /parse - Run a batch and return its relations
async fn parse_batch(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<EligibilityRelation>>, AppError> {
    let report = run_batch(&state, &body).await?;
    Ok(Json(report.relations))
}

/// POST /parse/report - Run a batch and return the full report
async fn parse_report(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BatchReport>, AppError> {
    let report = run_batch(&state, &body).await?;
    Ok(Json(report))
}

/// GET /health - Dictionary status
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        variables: state.dictionaries.variables.len(),
        units: state.dictionaries.units.len(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/parse", post(parse_batch))
        .route("/parse/report", post(parse_report))
        .route("/health", get(health_check))
        .with_state(state)
}
