use crate::commands::analyze::{AnalysisService, StartedAnalysis};
use crate::error::AnalysisError;
use crate::models::task::Task;
use crate::services::NarrativeProvider;
use crate::store::tasks::TaskError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: AnalysisService,
    pub narrator: Arc<dyn NarrativeProvider>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub repo_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_service_rate_limit: Option<u64>,
    pub narrative_service_available: bool,
    pub cached_repos: usize,
}

/// Error body shape shared by every endpoint: `{"detail": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Offline { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalysisError::Exhausted(_)
            | AnalysisError::Transient(_)
            | AnalysisError::EmptyResource(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        let status = match err {
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Finished { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

/// Routes behind a permissive CORS layer so a browser frontend on any origin can call them.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/progress/:task_id", get(progress_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "message": "GitGrade API",
        "health": "/api/health"
    }))
}

/// Never fails: a broken rate-limit probe only degrades the status.
async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    let probe = state
        .service
        .pipeline()
        .repositories()
        .rate_limit_remaining()
        .await;
    let (status, data_service_rate_limit) = match probe {
        Ok(remaining) => ("healthy", Some(remaining)),
        Err(err) => {
            log::warn!("Health check degraded: {err}");
            ("degraded", None)
        }
    };

    Json(HealthReport {
        status,
        data_service_rate_limit,
        narrative_service_available: state.narrator.is_available(),
        cached_repos: state.service.cached_repos(),
    })
}

async fn analyze_handler(
    State(state): State<AppState>,
    request: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<StartedAnalysis>, ApiError> {
    let Json(request) = request?;
    Ok(Json(state.service.start(&request.repo_url)?))
}

async fn progress_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.service.progress(&task_id)?))
}
