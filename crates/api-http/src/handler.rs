//! HTTP Handlers

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{DomainBody, DomainView, EnqueueResponse, HealthResponse, TriggerResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use indexer_core::application::{EnqueueRequest, QueueStats};
use indexer_core::domain::QueueItem;
use tracing::info;

/// GET / - liveness
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Auto-indexing service is running".to_string(),
    })
}

/// POST / - run one batch-drain synchronously (request body ignored)
pub async fn trigger(State(state): State<AppState>) -> Result<Json<TriggerResponse>, ApiError> {
    info!("Manual queue processing triggered");
    let summary = state.processor.run_batch().await?;

    Ok(Json(TriggerResponse {
        message: "Indexing queue processed".to_string(),
        summary,
    }))
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// POST /queue
pub async fn enqueue(
    State(state): State<AppState>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EnqueueResponse>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let ids = state.queue_service.enqueue(req).await?;

    Ok((StatusCode::CREATED, Json(EnqueueResponse { ids })))
}

/// GET /queue/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueueItem>, ApiError> {
    Ok(Json(state.queue_service.get_item(&id).await?))
}

/// GET /queue/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<QueueStats>, ApiError> {
    Ok(Json(state.queue_service.stats().await?))
}

/// PUT /domains/{id}
pub async fn put_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<DomainBody>, JsonRejection>,
) -> Result<Json<DomainView>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let domain = state
        .queue_service
        .upsert_domain(body.into_domain(id))
        .await?;

    Ok(Json(DomainView::from(&domain)))
}

/// GET /domains
pub async fn list_domains(State(state): State<AppState>) -> Result<Json<Vec<DomainView>>, ApiError> {
    let domains = state.queue_service.list_domains().await?;
    Ok(Json(domains.iter().map(DomainView::from).collect()))
}
