//! Aggregation and browsing engine for periodic environmental sensor readings.
//!
//! The engine turns one immutable snapshot of readings into the views an
//! operator dashboard needs:
//! - [`aggregate`]: latest reading, global and per-state averages, state counts
//! - [`window`]: fixed-width history windows anchored at the latest reading
//! - [`browse`]: AND-combined filters, newest-first ordering, pagination
//! - [`severity`]: state to severity tier
//!
//! Around it sit the service pieces: [`store`] holds the current snapshot,
//! [`source`] fetches and polls the upstream API, [`views`] assembles the view
//! models and [`routes`] serves them over HTTP.

pub mod aggregate;
pub mod browse;
pub mod config;
pub mod models;
pub mod routes;
pub mod severity;
pub mod source;
pub mod store;
pub mod views;
pub mod window;

pub use config::Config;

// Re-exported so sibling modules depend on the crate root rather than on each
// other's file layout.
pub use models::{SensorRecord, SensorState};
pub use severity::{severity_tier, SeverityTier};
pub use source::{FetchError, HttpSource, Poller, PollerHandle, RecordSource, StaticSource};
pub use store::{RecordStore, Snapshot, StoreStatus};
pub use views::ViewSettings;
