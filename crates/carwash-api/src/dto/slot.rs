//! Availability DTOs

use carwash_core::models::TimeSlot;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for a day's slot grid
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SlotQuery {
    pub date: NaiveDate,

    /// Length of the appointment being planned
    #[validate(range(min = 1, max = 720, message = "duration_minutes must be between 1 and 720"))]
    pub duration_minutes: u32,
}

/// Slot grid for one day
#[derive(Debug, Clone, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub available_count: usize,
    pub slots: Vec<TimeSlot>,
}

impl SlotsResponse {
    pub fn new(date: NaiveDate, duration_minutes: u32, slots: Vec<TimeSlot>) -> Self {
        Self {
            date,
            duration_minutes,
            available_count: slots.iter().filter(|s| s.available).count(),
            slots,
        }
    }
}
