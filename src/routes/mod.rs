//! HTTP gateway. Each sibling module exports a subrouter; this module merges
//! them and attaches the shared state, so `main.rs` only sees [`router`].

use std::sync::Arc;

use axum::Router;

use tracing::debug;

use crate::{RecordStore, ViewSettings};

mod dashboard;
mod health;
mod records;

/// State shared by every route.
pub type AppState = (Arc<RecordStore>, ViewSettings);

// ---

pub fn router(store: Arc<RecordStore>, settings: ViewSettings) -> Router {
    // ---
    Router::new()
        .merge(dashboard::router())
        .merge(records::router())
        .merge(health::router())
        .with_state((store, settings))
}

/// Read an optional integer query value.
///
/// HTML forms submit untouched inputs as `name=`, so an empty or unparsable
/// value means "not given" rather than a rejected request.
fn int_param(name: &str, value: Option<&str>) -> Option<i64> {
    // ---
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match value.parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => {
            debug!("Ignoring query {}={:?}: {}", name, value, e);
            None
        }
    }
}
