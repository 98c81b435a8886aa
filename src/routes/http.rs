// HTTP handlers: version, fleet snapshot, manual refresh, range management

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::AppState;
use crate::coordinator::CycleOutcome;
use crate::error::RangeSetError;
use crate::models::RangeDescriptor;
use crate::version::{NAME, VERSION};

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/fleet: last published snapshot; empty rows and null capturedAt when none.
pub(super) async fn fleet_handler(State(state): State<AppState>) -> Response {
    match state.coordinator.published().await {
        Some(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        None => Json(json!({
            "rows": [],
            "totalHashrate": 0.0,
            "capturedAt": null,
        }))
        .into_response(),
    }
}

/// POST /api/refresh: run a cycle now and report how it went.
pub(super) async fn refresh_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.coordinator.run_cycle().await {
        Ok(CycleOutcome::Succeeded(snapshot)) => (
            StatusCode::OK,
            Json(json!({
                "status": "succeeded",
                "devices": snapshot.device_count(),
                "totalHashrate": snapshot.total_hashrate,
            })),
        ),
        Ok(CycleOutcome::AlreadyRunning) => {
            (StatusCode::OK, Json(json!({ "status": "already-running" })))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "failed", "error": e.to_string() })),
        ),
    }
}

/// GET /api/ranges: configured ranges in scan order.
pub(super) async fn ranges_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.coordinator.ranges().await)
}

/// POST /api/ranges: add one range. 201 with the range, 409 on a taken label, 400 when blank.
pub(super) async fn add_range_handler(
    State(state): State<AppState>,
    Json(range): Json<RangeDescriptor>,
) -> impl IntoResponse {
    let range = RangeDescriptor::new(range.label.trim(), range.subnet_spec.trim());
    match state.coordinator.add_range(range.clone()).await {
        Ok(()) => (StatusCode::CREATED, Json(json!(range))),
        Err(e) => {
            let status = match e {
                RangeSetError::DuplicateLabel(_) => StatusCode::CONFLICT,
                RangeSetError::EmptyLabel | RangeSetError::EmptySubnet(_) => {
                    StatusCode::BAD_REQUEST
                }
            };
            tracing::warn!(error = %e, operation = "add_range", "range rejected");
            (status, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// DELETE /api/ranges/{label}: 204 when removed, 404 when no range has that label.
pub(super) async fn delete_range_handler(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> StatusCode {
    if state.coordinator.remove_range(&label).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// POST /api/ranges/reset: replace ranges with the locations in the config file.
pub(super) async fn reset_ranges_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.config.reload_ranges() {
        Ok(ranges) => {
            let body = json!(ranges.descriptors());
            state.coordinator.reset_ranges(ranges).await;
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::warn!(error = %e, operation = "reset_ranges", "range reset failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}
