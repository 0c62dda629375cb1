//! Canvass HTTP surface
//!
//! Axum-based HTTP server that serves the survey frontend, hands out trial
//! samples, and records submissions.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET  /health        — health check with loaded trial count
//! - GET  /version       — server version info
//! - GET  /trials        — random trial sample for one participant
//! - POST /submit        — record a participant submission
//! - GET  /download-data — zip archive of the data directory
//! - GET  /static/*      — static assets (trial images)
//! - GET  /*             — frontend files (/ resolves to index.html)

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use canvass_core::config::{CanvassConfig, PathsConfig, StudyConfig};
use canvass_core::{json_safe, Dataset};
use serde::Deserialize;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::subsystems::{export, submit};

/// Shared state for all HTTP handlers. The dataset is immutable after
/// startup and safe to share across concurrent requests.
#[derive(Clone)]
pub struct HttpState {
    pub dataset: Arc<Dataset>,
    pub config: CanvassConfig,
}

/// Build the Axum router with all endpoints and static-file services.
pub fn build_router(state: Arc<HttpState>) -> Router {
    let assets = ServeDir::new(&state.config.paths.static_dir);
    let frontend = ServeDir::new(&state.config.paths.frontend_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/trials", get(trials_handler))
        .route("/submit", post(submit_handler))
        .route("/download-data", get(download_handler))
        .nest_service("/static", assets)
        .fallback_service(frontend)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    dataset: Arc<Dataset>,
    config: CanvassConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { dataset, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Canvass HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct TrialsQuery {
    #[serde(rename = "workerId")]
    pub worker_id: Option<String>,
    #[serde(rename = "assignmentId")]
    pub assignment_id: Option<String>,
    pub condition: Option<String>,
    pub n: Option<usize>,
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner trials — sample the table and echo the client's identifiers.
/// `n` defaults to the configured study size and is clamped to the table.
pub fn trials_inner(
    dataset: &Dataset,
    study: &StudyConfig,
    query: TrialsQuery,
) -> (StatusCode, Value) {
    let worker_id = query.worker_id.unwrap_or_else(|| "local".to_string());
    let assignment_id = query.assignment_id.unwrap_or_else(|| "local".to_string());
    let condition = query.condition.unwrap_or_else(|| "baseline".to_string());
    let n = query.n.unwrap_or(study.default_trials);

    let trials: Vec<Value> = dataset
        .sample(n)
        .into_iter()
        .map(|t| serde_json::to_value(t.payload()).unwrap_or(Value::Null))
        .collect();

    let body = json_safe(serde_json::json!({
        "workerId": worker_id,
        "assignmentId": assignment_id,
        "condition": condition,
        "n": trials.len(),
        "trials": trials,
    }));
    (StatusCode::OK, body)
}

/// Inner submit — log the body and return the survey code.
pub fn submit_inner(paths: &PathsConfig, body: Value) -> (StatusCode, Value) {
    match submit::record_submission(paths, body) {
        Ok(code) => (
            StatusCode::OK,
            serde_json::json!({
                "ok": true,
                "survey_code": code,
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({
                "error": e.to_string(),
                "status": "error",
            }),
        ),
    }
}

/// Inner download — archive the data directory.
pub fn download_inner(paths: &PathsConfig) -> std::result::Result<Vec<u8>, String> {
    export::archive_data_dir(&paths.data_dir).map_err(|e| e.to_string())
}

/// Inner health — the dataset is in memory, so this is always healthy.
pub fn health_inner(dataset: &Dataset, config: &CanvassConfig) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "trials": dataset.len(),
            "data_dir": config.paths.data_dir.display().to_string(),
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "canvass/1",
    })
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.dataset, &state.config);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn trials_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<TrialsQuery>,
) -> impl IntoResponse {
    let (status, body) = trials_inner(&state.dataset, &state.config.study, query);
    (status, Json(body))
}

/// An unreadable body is treated as an empty submission rather than
/// rejected — the canonical log tolerates any client shape.
pub async fn submit_handler(
    State(state): State<Arc<HttpState>>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let body = body.map(|Json(v)| v).unwrap_or_else(|| Value::Object(Default::default()));
    let (status, body) = submit_inner(&state.config.paths, body);
    (status, Json(body))
}

pub async fn download_handler(State(state): State<Arc<HttpState>>) -> Response {
    match download_inner(&state.config.paths) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/zip"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"submissions_backup.zip\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": e,
                "status": "error",
            })),
        )
            .into_response(),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
