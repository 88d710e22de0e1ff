//! View models handed to the presentation layer.
//!
//! Each builder reads exactly one snapshot out of a [`StoreState`] and derives
//! everything from it, so a refresh landing mid-request never mixes records
//! from two snapshots.

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::aggregate::{self, Averages, StateAverage, StateCounts};
use crate::browse::{self, FilterParams, FilterWarning, RecordFilter};
use crate::severity::{severity_tier, SeverityTier};
use crate::store::{StoreState, StoreStatus};
use crate::window::{self, HistoryPoint};
use crate::SensorRecord;

// ---

/// Engine parameters that do not change per request.
#[derive(Debug, Clone, Copy)]
pub struct ViewSettings {
    pub window: Duration,
    pub page_size: usize,
    pub recent_limit: usize,
    /// Zone used for day boundaries and chart labels.
    pub zone: FixedOffset,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            window: Duration::hours(window::DEFAULT_WINDOW_HOURS),
            page_size: browse::DEFAULT_PAGE_SIZE,
            recent_limit: 50,
            zone: Utc.fix(),
        }
    }
}

/// A record together with its severity tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    #[serde(flatten)]
    pub record: SensorRecord,
    pub severity: SeverityTier,
}

impl From<SensorRecord> for RecordRow {
    fn from(record: SensorRecord) -> Self {
        let severity = severity_tier(record.state);
        Self { record, severity }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    pub offset: u32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub has_older_data: bool,
    pub points: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: StoreStatus,
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub total_records: usize,
    pub latest: Option<RecordRow>,
    pub averages: Option<Averages>,
    pub state_counts: StateCounts,
    pub per_state: [StateAverage; 3],
    pub history: HistoryView,
    pub recent: Vec<RecordRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordsView {
    pub status: StoreStatus,
    pub error: Option<String>,
    pub warnings: Vec<FilterWarning>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub records: Vec<RecordRow>,
}

/// Build the dashboard for history window `offset`.
pub fn dashboard(
    state: &StoreState,
    settings: &ViewSettings,
    offset: u32,
    now: DateTime<Utc>,
) -> DashboardView {
    // ---
    let records: &[SensorRecord] = state.snapshot.as_ref().map(|s| s.records()).unwrap_or(&[]);

    let history = window::select_window(records, settings.window, offset, now);

    DashboardView {
        status: state.status(),
        error: state.last_error.clone(),
        fetched_at: state.snapshot.as_ref().map(|s| s.fetched_at()),
        total_records: records.len(),
        latest: aggregate::latest(records).cloned().map(RecordRow::from),
        averages: aggregate::global_averages(records),
        state_counts: aggregate::state_counts(records),
        per_state: aggregate::per_state_averages(records),
        history: HistoryView {
            offset,
            window_start: history.start,
            window_end: history.end,
            has_older_data: history.has_older_data,
            points: history.points(settings.zone),
        },
        recent: aggregate::recent(records, settings.recent_limit)
            .into_iter()
            .map(RecordRow::from)
            .collect(),
    }
}

/// Build the record browser page. `page` is clamped into range here, on the
/// caller side of the engine.
pub fn records(
    state: &StoreState,
    settings: &ViewSettings,
    params: &FilterParams,
    page: i64,
) -> RecordsView {
    // ---
    let records: &[SensorRecord] = state.snapshot.as_ref().map(|s| s.records()).unwrap_or(&[]);

    let (filter, warnings) = RecordFilter::parse(params, settings.zone);
    let matches = browse::apply(records, &filter);
    let total_pages = matches.len().div_ceil(settings.page_size.max(1));
    let page = browse::paginate(
        &matches,
        browse::clamp_page(page, total_pages),
        settings.page_size,
    );

    RecordsView {
        status: state.status(),
        error: state.last_error.clone(),
        warnings,
        page: page.page,
        page_size: page.page_size,
        total_pages: page.total_pages,
        total_matches: page.total_matches,
        records: page.records.into_iter().map(RecordRow::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::store::{RecordStore, Snapshot};
    use crate::SensorState;
    use chrono::TimeZone;

    fn record(id: i64, hour: u32, state: Option<SensorState>) -> SensorRecord {
        SensorRecord {
            id,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
            temperature: 20.0 + hour as f64,
            humidity: 50.0,
            state,
            action: "Ventilador ON".to_string(),
        }
    }

    fn loaded(records: Vec<SensorRecord>) -> StoreState {
        let store = RecordStore::new();
        store.replace(Snapshot::new(records, Utc::now()));
        store.current()
    }

    #[test]
    fn test_loading_dashboard_has_no_data() {
        // ---
        let state = RecordStore::new().current();
        let view = dashboard(&state, &ViewSettings::default(), 0, Utc::now());

        assert_eq!(view.status, StoreStatus::Loading);
        assert!(view.latest.is_none());
        assert!(view.averages.is_none());
        assert_eq!(view.per_state.len(), 3);
        assert!(view.history.points.is_empty());
        assert!(!view.history.has_older_data);
    }

    #[test]
    fn test_dashboard_from_snapshot() {
        // ---
        let state = loaded(vec![
            record(1, 8, Some(SensorState::Low)),
            record(3, 10, Some(SensorState::High)),
            record(2, 9, Some(SensorState::Normal)),
        ]);
        let view = dashboard(&state, &ViewSettings::default(), 0, Utc::now());

        assert_eq!(view.status, StoreStatus::Ready);
        assert_eq!(view.total_records, 3);
        let latest = view.latest.as_ref().unwrap();
        assert_eq!(latest.record.id, 3);
        assert_eq!(latest.severity, SeverityTier::High);
        assert_eq!(view.averages.unwrap().temperature, 29.0);
        assert_eq!(view.history.points.len(), 2);
        assert_eq!(view.history.points[0].label, "08:00");
        let recent: Vec<_> = view.recent.iter().map(|r| r.record.id).collect();
        assert_eq!(recent, vec![3, 2, 1]);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        // ---
        let state = loaded((0..20).map(|h| record(h as i64, h, None)).collect());
        let now = Utc::now();
        let settings = ViewSettings::default();
        assert_eq!(
            dashboard(&state, &settings, 1, now),
            dashboard(&state, &settings, 1, now)
        );
    }

    #[test]
    fn test_records_page_is_clamped() {
        // ---
        let state = loaded((0..20).map(|h| record(h as i64, h, None)).collect());
        let settings = ViewSettings::default();

        let last = records(&state, &settings, &FilterParams::default(), 99);
        assert_eq!(last.page, 2);
        assert_eq!(last.total_pages, 2);
        assert_eq!(last.records.len(), 5);

        let first = records(&state, &settings, &FilterParams::default(), -1);
        assert_eq!(first.page, 1);
        assert_eq!(first.records.len(), 15);
        assert_eq!(first.records[0].record.id, 19);
    }

    #[test]
    fn test_records_zero_matches() {
        // ---
        let state = loaded(vec![record(1, 8, Some(SensorState::Low))]);
        let params = FilterParams {
            status: Some("Alto".to_string()),
            ..Default::default()
        };

        let view = records(&state, &ViewSettings::default(), &params, 1);
        assert_eq!(view.status, StoreStatus::Ready);
        assert_eq!(view.total_pages, 0);
        assert_eq!(view.total_matches, 0);
        assert_eq!(view.page, 1);
        assert!(view.records.is_empty());
    }
}
