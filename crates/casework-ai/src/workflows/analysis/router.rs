use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::documents::DocumentStore;
use super::domain::AnalysisRequest;
use super::service::{AnalysisError, DocumentAnalysisService};

/// Router builder exposing the analysis endpoints.
pub fn analysis_router<S>(service: Arc<DocumentAnalysisService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/v1/analysis", post(analyze_handler::<S>))
        .route(
            "/api/v1/analysis/capabilities",
            get(capabilities_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn analyze_handler<S>(
    State(service): State<Arc<DocumentAnalysisService<S>>>,
    axum::Json(request): axum::Json<AnalysisRequest>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.analyze(request).await {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn capabilities_handler<S>(
    State(service): State<Arc<DocumentAnalysisService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let payload = json!({
        "rules_version": service.rules_version(),
        "directives": service.capabilities(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_response(error: AnalysisError) -> Response {
    let (status, code) = match &error {
        AnalysisError::InvalidRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_request"),
        AnalysisError::DocumentNotFound { .. } => (StatusCode::NOT_FOUND, "document_not_found"),
        AnalysisError::AnalysisUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "analysis_unavailable")
        }
        AnalysisError::DeadlineExceeded => (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded"),
        AnalysisError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
    };
    let payload = match &error {
        AnalysisError::InvalidRequest(violation) => json!({
            "code": code,
            "error": error.to_string(),
            "field": violation.field(),
        }),
        _ => json!({
            "code": code,
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
