//! Time-Window Selector.
//!
//! History is paged backward in fixed-width windows anchored at the latest
//! reading rather than at wall-clock time. Offset `0` is the window ending at
//! the latest record's timestamp (exclusive); each increment steps one full
//! width further back. Windows are half-open `[start, end)`, so consecutive
//! offsets never overlap and never leave a gap.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::aggregate::{chronological, latest};
use crate::SensorRecord;

// ---

/// Default window width in hours.
pub const DEFAULT_WINDOW_HOURS: i64 = 12;

/// Records selected for one history window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryWindow {
    // ---
    pub offset: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Selected records, ascending by timestamp then `id`.
    pub records: Vec<SensorRecord>,
    /// True iff some record lies strictly before `start`.
    pub has_older_data: bool,
}

/// One chart point of a history window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// `HH:MM` in the display zone.
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
}

/// Clamp a caller-supplied offset to the non-negative range.
pub fn clamp_offset(offset: i64) -> u32 {
    offset.clamp(0, u32::MAX as i64) as u32
}

/// Select the window `offset` widths back from the latest record.
///
/// `now` is only used as the anchor when `records` is empty, in which case the
/// window is empty as well.
pub fn select_window(
    records: &[SensorRecord],
    width: Duration,
    offset: u32,
    now: DateTime<Utc>,
) -> HistoryWindow {
    // ---
    let anchor = latest(records).map_or(now, |r| r.timestamp);
    let (start, end) = bounds(anchor, width, offset);

    let mut sorted: Vec<&SensorRecord> = records.iter().collect();
    sorted.sort_by(|a, b| chronological(a, b));

    let selected = sorted
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp < end)
        .map(|r| (*r).clone())
        .collect();

    let has_older_data = sorted.first().is_some_and(|r| r.timestamp < start);

    HistoryWindow {
        offset,
        start,
        end,
        records: selected,
        has_older_data,
    }
}

impl HistoryWindow {
    /// Chart points for the selected records, labelled in `zone`.
    pub fn points(&self, zone: FixedOffset) -> Vec<HistoryPoint> {
        // ---
        self.records
            .iter()
            .map(|r| HistoryPoint {
                label: r.timestamp.with_timezone(&zone).format("%H:%M").to_string(),
                timestamp: r.timestamp,
                temperature: r.temperature,
                humidity: r.humidity,
            })
            .collect()
    }
}

/// `end = anchor - offset * width`, `start = end - width`, saturating at the
/// earliest representable instant.
fn bounds(anchor: DateTime<Utc>, width: Duration, offset: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    // ---
    let end = i32::try_from(offset)
        .ok()
        .and_then(|n| width.checked_mul(n))
        .and_then(|back| anchor.checked_sub_signed(back))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let start = end
        .checked_sub_signed(width)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    (start, end)
}
