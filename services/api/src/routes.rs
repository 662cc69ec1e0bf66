use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use lettings_import::error::AppError;
use lettings_import::workflows::property_list::{
    AmountOrder, ExtractedRecord, PropertyListImporter,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Largest preview a single request may ask for.
const MAX_PREVIEW_RECORDS: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewRequest {
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) amount_order: Option<AmountOrder>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PreviewResponse {
    pub(crate) pages_found: usize,
    pub(crate) amount_order: AmountOrder,
    pub(crate) records: Vec<ExtractedRecord>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/property-list/preview", post(preview_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Segment and extract the submitted text without touching storage.
pub(crate) async fn preview_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let mut config = (*state.import).clone();
    if let Some(order) = payload.amount_order {
        config.amount_order = order;
    }
    let limit = payload
        .limit
        .unwrap_or(config.preview_count)
        .min(MAX_PREVIEW_RECORDS);

    let importer = PropertyListImporter::new(&config)?;
    let pages_found = importer.count_pages(&payload.text)?;
    let records = importer.preview_n(&payload.text, limit)?;

    Ok(Json(PreviewResponse {
        pages_found,
        amount_order: config.amount_order,
        records,
    }))
}
