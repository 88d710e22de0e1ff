//! Data source abstraction and the polling task that feeds the record store.
//!
//! A source yields the current full record collection or a [`FetchError`].
//! The [`Poller`] owns the refresh schedule: it fetches once on start, then
//! every interval, and each outcome either replaces the store's snapshot or
//! records the failure. Its lifecycle belongs to the caller through
//! [`PollerHandle::stop`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::models::RawRecord;
use crate::store::{RecordStore, Snapshot};
use crate::SensorRecord;

// ---

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("unreadable response body: {0}")]
    Body(String),
}

/// Anything that can supply the current full record collection.
pub trait RecordSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<SensorRecord>, FetchError>> + Send;
}

/// Decode a JSON payload into records.
///
/// A payload that is not an array decodes to an empty collection. Elements are
/// decoded one by one; an element that is malformed or missing a required
/// field is skipped.
pub fn decode_payload(payload: &serde_json::Value, zone: FixedOffset) -> Vec<SensorRecord> {
    // ---
    let Some(items) = payload.as_array() else {
        warn!("Payload is not an array, treating as empty");
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let raw = match serde_json::from_value::<RawRecord>(item.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Failed to parse item {}: {} - Raw item: {}", i, e, item);
                continue;
            }
        };

        match raw.to_record(zone) {
            Some(record) => records.push(record),
            None => debug!("Skipping incomplete item {} - Raw item: {}", i, item),
        }
    }

    if records.len() < items.len() {
        info!(
            "Decoded {} of {} records ({} skipped)",
            records.len(),
            items.len(),
            items.len() - records.len()
        );
    }
    records
}

/// Fetches the record collection from the sensor API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
    zone: FixedOffset,
}

impl HttpSource {
    /// Build a source whose requests give up after `timeout`, so a stalled
    /// upstream surfaces as a [`FetchError::Http`] instead of hanging a refresh.
    pub fn new(
        url: impl Into<String>,
        zone: FixedOffset,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        // ---
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            zone,
        })
    }
}

impl RecordSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        // ---
        debug!("Fetching records from: {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        Ok(decode_payload(&payload, self.zone))
    }
}

/// Serves a fixed collection. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<SensorRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<SensorRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<SensorRecord>, FetchError> {
        Ok(self.records.clone())
    }
}

/// Refresh the store once from `source`.
///
/// Returns the number of records installed, or the error that was recorded.
pub async fn refresh<S: RecordSource>(source: &S, store: &RecordStore) -> Result<usize, FetchError> {
    // ---
    match source.fetch().await {
        Ok(records) => {
            let count = records.len();
            store.replace(Snapshot::new(records, Utc::now()));
            debug!("Installed snapshot of {} records", count);
            Ok(count)
        }
        Err(e) => {
            error!("Failed to fetch sensor records: {}", e);
            store.record_failure(e.to_string());
            Err(e)
        }
    }
}

/// Periodic refresh task.
pub struct Poller;

/// Owner handle for a running [`Poller`]. Dropping it also ends polling.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Poller {
    // ---
    /// Start polling `source` into `store` every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: RecordSource>(
        source: S,
        store: Arc<RecordStore>,
        interval: Duration,
    ) -> PollerHandle {
        // ---
        let (shutdown, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!("Poller started, interval {:?}", interval);
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop_rx.changed() => break,
                }

                // An in-flight fetch must not outlive a stop request.
                tokio::select! {
                    // Errors are already recorded in the store.
                    _ = refresh(&source, &store) => {}
                    _ = stop_rx.changed() => break,
                }
            }
            info!("Poller stopped");
        });

        PollerHandle { shutdown, task }
    }
}

impl PollerHandle {
    /// Stop polling and wait for the task to finish.
    pub async fn stop(self) {
        // ---
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Poller task ended abnormally: {}", e);
        }
    }
}
