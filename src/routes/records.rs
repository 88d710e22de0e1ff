use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use super::{int_param, AppState};
use crate::browse::FilterParams;
use crate::views::{self, RecordsView};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/records", get(handler))
}

/// Query parameters for browsing records.
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    /// State label (`Alto`, `Normal`, `Bajo`), or `Todos`/`All` for any.
    status: Option<String>,
    /// Inclusive first day, `YYYY-MM-DD`.
    start_date: Option<String>,
    /// Inclusive last day, `YYYY-MM-DD`.
    end_date: Option<String>,
    /// Case-insensitive substring of the action text.
    action: Option<String>,
    /// 1-indexed page, clamped into range; empty means the first page.
    page: Option<String>,
}

async fn handler(
    Query(params): Query<RecordsQuery>,
    State((store, settings)): State<AppState>,
) -> Json<RecordsView> {
    // ---
    info!("Apply filter: {:?}", params);
    let page = int_param("page", params.page.as_deref()).unwrap_or(1);

    let filters = FilterParams {
        status: params.status,
        start_date: params.start_date,
        end_date: params.end_date,
        action: params.action,
    };

    let state = store.current();
    let view = views::records(&state, &settings, &filters, page);

    debug!(
        "GET /records - page {}/{} with {} of {} matches",
        view.page,
        view.total_pages,
        view.records.len(),
        view.total_matches
    );
    Json(view)
}
