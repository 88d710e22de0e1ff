//! Record Store: holds the latest full snapshot supplied by the data source.
//!
//! A snapshot is immutable once built. A refresh swaps the `Arc` under a short
//! write lock, so every computation works against exactly one snapshot even
//! while a newer one is being installed.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::SensorRecord;

// ---

/// One complete replacement set of records.
#[derive(Debug, Clone)]
pub struct Snapshot {
    // ---
    records: Vec<SensorRecord>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    // ---
    pub fn new(records: Vec<SensorRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Availability of data as the presentation layer should report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    /// No fetch has completed yet.
    Loading,
    /// The last fetch succeeded.
    Ready,
    /// The last fetch failed; any earlier snapshot is still served.
    Error,
}

/// Point-in-time view of the store handed to readers.
#[derive(Debug, Clone)]
pub struct StoreState {
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_error: Option<String>,
}

impl StoreState {
    pub fn status(&self) -> StoreStatus {
        // ---
        match (&self.snapshot, &self.last_error) {
            (_, Some(_)) => StoreStatus::Error,
            (Some(_), None) => StoreStatus::Ready,
            (None, None) => StoreStatus::Loading,
        }
    }
}

/// Shared holder of the current snapshot reference.
#[derive(Debug)]
pub struct RecordStore {
    inner: RwLock<StoreState>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    // ---
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState {
                snapshot: None,
                last_error: None,
            }),
        }
    }

    /// Replace the held snapshot wholesale and clear any recorded failure.
    pub fn replace(&self, snapshot: Snapshot) {
        // ---
        let snapshot = Arc::new(snapshot);
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.snapshot = Some(snapshot);
        guard.last_error = None;
    }

    /// Record a failed fetch. The previous snapshot, if any, stays in place.
    pub fn record_failure(&self, message: impl Into<String>) {
        // ---
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.last_error = Some(message.into());
    }

    /// Cheap clone of the current state for one computation.
    pub fn current(&self) -> StoreState {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
