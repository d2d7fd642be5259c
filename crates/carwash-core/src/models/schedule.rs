//! Time slot and booked interval models
//!
//! A `TimeSlot` is produced fresh for every availability query; a
//! `BookingInterval` is the range an existing appointment occupies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Reason attached to slots that collide with an existing appointment
pub const BLOCKED_REASON: &str = "Blocked by existing booking";

/// Candidate start time for a new appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Clock time in "HH:MM"
    pub time: String,

    /// Whether an appointment may start here
    pub available: bool,

    /// Why the slot is unavailable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TimeSlot {
    pub fn open(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            available: true,
            reason: None,
        }
    }

    pub fn blocked(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            available: false,
            reason: Some(BLOCKED_REASON.to_string()),
        }
    }
}

/// Range of time already committed to an appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInterval {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub label: String,
}

impl BookingInterval {
    pub fn new(start_time: NaiveDateTime, end_time: NaiveDateTime, label: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            label: label.into(),
        }
    }

    /// Length of the interval in minutes
    pub fn minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_blocked_slot_serialization() {
        let json = serde_json::to_string(&TimeSlot::blocked("09:00")).unwrap();
        assert!(json.contains("\"available\":false"));
        assert!(json.contains(BLOCKED_REASON));

        let json = serde_json::to_string(&TimeSlot::open("10:30")).unwrap();
        assert!(!json.contains("reason"));
    }

    #[test]
    fn test_interval_minutes() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let interval = BookingInterval::new(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(10, 30, 0).unwrap(),
            "Standard Full Package",
        );
        assert_eq!(interval.minutes(), 90);
    }
}
