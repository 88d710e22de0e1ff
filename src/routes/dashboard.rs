use axum::{extract::Query, extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::{int_param, AppState};
use crate::views::{self, DashboardView};
use crate::window::clamp_offset;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/dashboard", get(handler))
}

/// Query parameters for the dashboard.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// History windows to step back from the latest reading. Negative values
    /// and empty values are treated as 0.
    offset: Option<String>,
}

async fn handler(
    Query(params): Query<DashboardQuery>,
    State((store, settings)): State<AppState>,
) -> Json<DashboardView> {
    // ---
    let offset = clamp_offset(int_param("offset", params.offset.as_deref()).unwrap_or(0));
    debug!("GET /dashboard - offset {}", offset);

    let state = store.current();
    let view = views::dashboard(&state, &settings, offset, Utc::now());

    debug!(
        "GET /dashboard - {} records, {} history points, has_older_data={}",
        view.total_records,
        view.history.points.len(),
        view.history.has_older_data
    );
    Json(view)
}
