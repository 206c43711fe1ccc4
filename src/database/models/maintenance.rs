//! Maintenance-mode state document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Singleton maintenance state, keyed by a fixed `_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceDoc {
    #[serde(rename = "_id", default = "MaintenanceDoc::key")]
    pub id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scheduled_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MaintenanceDoc {
    pub fn key() -> String {
        "state".to_string()
    }

    /// Whether maintenance is in effect at `now`: either switched on, or
    /// inside the scheduled window.
    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        if self.enabled {
            return true;
        }
        matches!(
            (self.scheduled_start, self.scheduled_end),
            (Some(start), Some(end)) if start <= now && now <= end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, h, 0, 0).unwrap()
    }

    #[test]
    fn test_enabled_flag_wins() {
        let state = MaintenanceDoc { enabled: true, ..Default::default() };
        assert!(state.active_at(at(12)));
    }

    #[test]
    fn test_scheduled_window() {
        let state = MaintenanceDoc {
            scheduled_start: Some(at(10)),
            scheduled_end: Some(at(14)),
            ..Default::default()
        };
        assert!(!state.active_at(at(9)));
        assert!(state.active_at(at(10)));
        assert!(state.active_at(at(12)));
        assert!(!state.active_at(at(15)));
    }

    #[test]
    fn test_half_open_schedule_is_inactive() {
        let state = MaintenanceDoc {
            scheduled_start: Some(at(10)),
            ..Default::default()
        };
        assert!(!state.active_at(at(12)));
    }
}
