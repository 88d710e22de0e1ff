//! Snapshot statistics: latest reading, global and per-state averages, state
//! occurrence counts and the newest-first recent table.
//!
//! Every function is a pure function of the slice it is given. Source order is
//! never trusted; "latest" and "newest" are decided by timestamp with `id` as
//! the tie-break.

use std::cmp::Ordering;

use serde::Serialize;

use crate::{SensorRecord, SensorState};

// ---

/// Ascending order by timestamp, ties broken by ascending `id`.
pub fn chronological(a: &SensorRecord, b: &SensorRecord) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id))
}

/// Mean temperature and humidity over some set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    pub temperature: f64,
    pub humidity: f64,
}

/// Averages over the records of one state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateAverage {
    pub state: SensorState,
    pub temperature: f64,
    pub humidity: f64,
    pub count: usize,
}

/// Occurrences per state, with one fallback bucket for missing or
/// unrecognised states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    pub undefined: usize,
}

impl StateCounts {
    // ---
    pub fn get(&self, state: Option<SensorState>) -> usize {
        match state {
            Some(SensorState::Low) => self.low,
            Some(SensorState::Normal) => self.normal,
            Some(SensorState::High) => self.high,
            None => self.undefined,
        }
    }

    fn bump(&mut self, state: Option<SensorState>) {
        let slot = match state {
            Some(SensorState::Low) => &mut self.low,
            Some(SensorState::Normal) => &mut self.normal,
            Some(SensorState::High) => &mut self.high,
            None => &mut self.undefined,
        };
        *slot += 1;
    }
}

/// The record with the greatest timestamp, or `None` for an empty snapshot.
pub fn latest(records: &[SensorRecord]) -> Option<&SensorRecord> {
    records.iter().max_by(|a, b| chronological(a, b))
}

/// Mean temperature and humidity over all records; `None` when empty.
pub fn global_averages(records: &[SensorRecord]) -> Option<Averages> {
    averages_of(records.iter())
}

pub fn state_counts(records: &[SensorRecord]) -> StateCounts {
    // ---
    records.iter().fold(StateCounts::default(), |mut counts, r| {
        counts.bump(r.state);
        counts
    })
}

/// Per-state averages for Low, Normal and High, always in that order.
///
/// A state with no records yields a zero-valued entry rather than being dropped.
pub fn per_state_averages(records: &[SensorRecord]) -> [StateAverage; 3] {
    // ---
    SensorState::ALL.map(|state| {
        let matching = records.iter().filter(|r| r.state == Some(state));
        let count = matching.clone().count();
        let avg = averages_of(matching).unwrap_or(Averages {
            temperature: 0.0,
            humidity: 0.0,
        });

        StateAverage {
            state,
            temperature: avg.temperature,
            humidity: avg.humidity,
            count,
        }
    })
}

/// The `limit` newest records, newest first.
pub fn recent(records: &[SensorRecord], limit: usize) -> Vec<SensorRecord> {
    // ---
    let mut sorted: Vec<&SensorRecord> = records.iter().collect();
    sorted.sort_by(|a, b| chronological(b, a));
    sorted.into_iter().take(limit).cloned().collect()
}

fn averages_of<'a>(records: impl Iterator<Item = &'a SensorRecord>) -> Option<Averages> {
    // ---
    let (count, temp_sum, hum_sum) = records.fold((0usize, 0.0f64, 0.0f64), |(n, t, h), r| {
        (n + 1, t + r.temperature, h + r.humidity)
    });

    if count == 0 {
        return None;
    }

    let n = count as f64;
    Some(Averages {
        temperature: temp_sum / n,
        humidity: hum_sum / n,
    })
}
