//! Maps a reading's state onto a presentation-neutral severity tier.

use serde::Serialize;

use crate::SensorState;

// ---

/// Coarse severity used for KPI colouring and table badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
}

/// Severity for a state. A missing or unrecognised state is `Medium`.
pub fn severity_tier(state: Option<SensorState>) -> SeverityTier {
    // ---
    match state {
        Some(SensorState::Low) => SeverityTier::Low,
        Some(SensorState::Normal) | None => SeverityTier::Medium,
        Some(SensorState::High) => SeverityTier::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_maps() {
        // ---
        assert_eq!(severity_tier(Some(SensorState::Low)), SeverityTier::Low);
        assert_eq!(severity_tier(Some(SensorState::Normal)), SeverityTier::Medium);
        assert_eq!(severity_tier(Some(SensorState::High)), SeverityTier::High);
        assert_eq!(severity_tier(None), SeverityTier::Medium);
    }
}
