//! Data models for the sensor dashboard.
//!
//! `RawRecord` mirrors the wire shape served by the sensor API; `SensorRecord`
//! is the validated value every engine module works with.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Classification attached to every reading by the sensor firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorState {
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Alto")]
    High,
}

impl SensorState {
    // ---
    /// Fixed document order used by every per-state view.
    pub const ALL: [SensorState; 3] = [SensorState::Low, SensorState::Normal, SensorState::High];

    /// Parse a state label, accepting the wire labels and the English names.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        // ---
        match label.trim().to_lowercase().as_str() {
            "bajo" | "low" => Some(SensorState::Low),
            "normal" => Some(SensorState::Normal),
            "alto" | "high" => Some(SensorState::High),
            _ => None,
        }
    }

    /// The label used on the wire.
    pub fn label(self) -> &'static str {
        match self {
            SensorState::Low => "Bajo",
            SensorState::Normal => "Normal",
            SensorState::High => "Alto",
        }
    }
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw record as delivered by the sensor API.
///
/// Every field is optional so a single incomplete element never fails the
/// decoding of its neighbours; completeness is checked in [`RawRecord::to_record`].
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    // ---
    pub id: Option<i64>,
    #[serde(rename = "fecha_hora")]
    pub timestamp: Option<String>,
    #[serde(rename = "temperatura")]
    pub temperature: Option<f64>,
    #[serde(rename = "humedad")]
    pub humidity: Option<f64>,
    #[serde(rename = "estado")]
    pub state: Option<String>,
    #[serde(rename = "accion")]
    pub action: Option<String>,
}

/// Validated sensor reading. Identity is `id` within one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRecord {
    // ---
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    /// `None` when the feed sent no state or one we do not recognise.
    pub state: Option<SensorState>,
    pub action: String,
}

impl RawRecord {
    // ---
    /// Convert into a [`SensorRecord`], or `None` if a required field is
    /// missing or the timestamp cannot be parsed.
    ///
    /// Timestamps without an offset are read in `zone`.
    pub fn to_record(&self, zone: FixedOffset) -> Option<SensorRecord> {
        // ---
        let timestamp = parse_timestamp(self.timestamp.as_deref()?, zone)?;

        Some(SensorRecord {
            id: self.id?,
            timestamp,
            temperature: self.temperature?,
            humidity: self.humidity?,
            state: self.state.as_deref().and_then(SensorState::from_label),
            action: self.action.clone().unwrap_or_default(),
        })
    }
}

/// Offset-less layouts accepted from the feed, seconds optional.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp. RFC 3339 values keep their own offset; naive
/// values are interpreted in `zone`.
pub fn parse_timestamp(value: &str, zone: FixedOffset) -> Option<DateTime<Utc>> {
    // ---
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())?;

    naive
        .and_local_timezone(zone)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
