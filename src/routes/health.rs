// src/routes/health.rs
//! Health check endpoint for the dashboard backend.
//!
//! `/health` answers as long as the process is serving requests, and also
//! reports whether a snapshot has been loaded so orchestrators and operators
//! can tell "up but still loading" from "up and serving data".

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;
use crate::StoreStatus;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    data: StoreStatus,
    records: usize,
}

/// Handle `GET /health`.
///
/// Always `200 OK`; a failing upstream feed shows up in `data`, not in the
/// HTTP status.
async fn health(State((store, _)): State<AppState>) -> Json<HealthResponse> {
    // ---
    let state = store.current();
    Json(HealthResponse {
        status: "ok",
        data: state.status(),
        records: state.snapshot.map_or(0, |s| s.records().len()),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
