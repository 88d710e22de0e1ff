//! Filter/Sort/Paginate engine behind the record browser.
//!
//! Criteria are independent and AND-combined; an absent criterion matches
//! everything. Survivors are ordered newest first and sliced into fixed-size,
//! 1-indexed pages.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::chronological;
use crate::{SensorRecord, SensorState};

// ---

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: usize = 15;

/// Status values that disable the status filter.
const STATUS_SENTINELS: [&str; 2] = ["todos", "all"];

/// Raw filter inputs as they arrive from the browser form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub status: Option<String>,
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive through the last instant of the day.
    pub end_date: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    Any,
    Only(SensorState),
    /// A label that names no state; matches nothing.
    Unknown(String),
}

/// Parsed, ready-to-apply filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: StatusFilter,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Lower-cased search needle.
    pub action: Option<String>,
}

/// Input that could not be used and was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterWarning {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

/// One page of filtered records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_matches: usize,
    pub records: Vec<SensorRecord>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::Any,
            from: None,
            until: None,
            action: None,
        }
    }
}

impl RecordFilter {
    // ---
    /// Build a filter from raw inputs. Day boundaries are taken in `zone`.
    ///
    /// Unparsable dates are dropped (no bound) and reported as warnings.
    pub fn parse(params: &FilterParams, zone: FixedOffset) -> (Self, Vec<FilterWarning>) {
        // ---
        let mut warnings = Vec::new();

        let status = match non_empty(params.status.as_deref()) {
            None => StatusFilter::Any,
            Some(s) if STATUS_SENTINELS.contains(&s.to_lowercase().as_str()) => StatusFilter::Any,
            Some(s) => match SensorState::from_label(s) {
                Some(state) => StatusFilter::Only(state),
                None => StatusFilter::Unknown(s.to_string()),
            },
        };

        let from = parse_day("start_date", params.start_date.as_deref(), &mut warnings)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .and_then(|start| in_zone(start, zone));

        let until = parse_day("end_date", params.end_date.as_deref(), &mut warnings)
            .and_then(|day| day.and_hms_milli_opt(23, 59, 59, 999))
            .and_then(|end| in_zone(end, zone));

        let action = non_empty(params.action.as_deref()).map(str::to_lowercase);

        let filter = RecordFilter {
            status,
            from,
            until,
            action,
        };
        (filter, warnings)
    }

    pub fn matches(&self, record: &SensorRecord) -> bool {
        // ---
        let status_ok = match &self.status {
            StatusFilter::Any => true,
            StatusFilter::Only(state) => record.state == Some(*state),
            StatusFilter::Unknown(_) => false,
        };

        status_ok
            && self.from.map_or(true, |from| record.timestamp >= from)
            && self.until.map_or(true, |until| record.timestamp <= until)
            && self
                .action
                .as_ref()
                .map_or(true, |needle| record.action.to_lowercase().contains(needle))
    }
}

/// Apply `filter` and order the survivors newest first (ties: higher `id` first).
pub fn apply(records: &[SensorRecord], filter: &RecordFilter) -> Vec<SensorRecord> {
    // ---
    let mut matched: Vec<SensorRecord> = records
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect();
    matched.sort_by(|a, b| chronological(b, a));
    matched
}

/// Slice page `page` (1-indexed) out of `matches`.
///
/// No clamping happens here: a page outside `1..=total_pages` is empty.
pub fn paginate(matches: &[SensorRecord], page: usize, page_size: usize) -> Page {
    // ---
    let total_matches = matches.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_matches.div_ceil(page_size)
    };

    let records = match page.checked_sub(1).and_then(|p| p.checked_mul(page_size)) {
        Some(start) if start < total_matches => {
            let end = (start + page_size).min(total_matches);
            matches[start..end].to_vec()
        }
        _ => Vec::new(),
    };

    Page {
        page,
        page_size,
        total_pages,
        total_matches,
        records,
    }
}

/// Clamp a requested page into `[1, max(1, total_pages)]`.
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let upper = total_pages.max(1) as i64;
    requested.clamp(1, upper) as usize
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_day(
    field: &'static str,
    value: Option<&str>,
    warnings: &mut Vec<FilterWarning>,
) -> Option<NaiveDate> {
    // ---
    let value = non_empty(value)?;
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(e) => {
            warn!("Ignoring {} filter {:?}: {}", field, value, e);
            warnings.push(FilterWarning {
                field,
                value: value.to_string(),
                message: format!("expected YYYY-MM-DD ({}); filter not applied", e),
            });
            None
        }
    }
}

fn in_zone(local: NaiveDateTime, zone: FixedOffset) -> Option<DateTime<Utc>> {
    local
        .and_local_timezone(zone)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
