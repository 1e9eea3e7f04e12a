//! Quiet hours window.
//!
//! Start is inclusive, end is exclusive. When `start > end` the window wraps
//! past midnight (22:00-08:00 covers 23:00 and 03:00 but not 12:00).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Time-of-day window during which only high-priority nudges are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: true,
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl QuietHours {
    /// Build from `HH:MM` strings.
    pub fn parse(enabled: bool, start: &str, end: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled,
            start: parse_hhmm("quiet_hours.start", start)?,
            end: parse_hhmm("quiet_hours.end", end)?,
        })
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check if a local time of day falls within quiet hours.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if !self.enabled || self.start == self.end {
            return false;
        }

        // Overnight window (e.g., 22:00 - 08:00)
        if self.start > self.end {
            return time >= self.start || time < self.end;
        }

        // Daytime window (e.g., 12:00 - 14:00)
        time >= self.start && time < self.end
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_hhmm(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected HH:MM, got '{value}' ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn overnight_window_wraps() {
        let q = QuietHours::parse(true, "22:00", "08:00").unwrap();
        assert!(q.contains(t(23, 0)));
        assert!(q.contains(t(3, 0)));
        assert!(q.contains(t(22, 0)));
        assert!(!q.contains(t(8, 0)));
        assert!(!q.contains(t(12, 0)));
        assert!(!q.contains(t(21, 59)));
    }

    #[test]
    fn daytime_window() {
        let q = QuietHours::parse(true, "12:00", "14:00").unwrap();
        assert!(q.contains(t(12, 0)));
        assert!(q.contains(t(13, 59)));
        assert!(!q.contains(t(14, 0)));
        assert!(!q.contains(t(11, 59)));
    }

    #[test]
    fn disabled_or_empty_window_never_matches() {
        assert!(!QuietHours::disabled().contains(t(23, 0)));
        let empty = QuietHours::parse(true, "09:00", "09:00").unwrap();
        assert!(!empty.contains(t(9, 0)));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(QuietHours::parse(true, "25:00", "08:00").is_err());
        assert!(QuietHours::parse(true, "22:00", "8am").is_err());
    }
}
