//! Time-slot availability
//!
//! Builds the bookable grid for a day and checks candidate appointments
//! against the intervals already committed on that day.
//!
//! The overlap test is deliberately not the textbook interval predicate. A
//! candidate `[start, end)` is blocked by an existing interval when:
//!
//! 1. `start` lies strictly inside the interval
//! 2. `end` lies strictly inside the interval
//! 3. the candidate strictly contains the interval
//! 4. `start` equals the interval's start
//!
//! A candidate that covers an interval while sharing its end boundary is
//! therefore still reported as available.

use carwash_core::{
    config::ScheduleConfig,
    models::{BookingInterval, TimeSlot},
    traits::BookingRepository,
    AppError, AppResult,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Parse an "HH:MM" clock time
pub fn parse_clock_time(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not a HH:MM time", value)))
}

/// End of an appointment starting at `time` on `date`
pub fn booking_end_time(
    date: NaiveDate,
    time: &str,
    duration_minutes: u32,
) -> AppResult<NaiveDateTime> {
    let start = date.and_time(parse_clock_time(time)?);
    Ok(start + Duration::minutes(i64::from(duration_minutes)))
}

/// Whether `[start, end)` is blocked by `existing`
#[inline]
fn blocked_by(start: NaiveDateTime, end: NaiveDateTime, existing: &BookingInterval) -> bool {
    let starts_inside = start > existing.start_time && start < existing.end_time;
    let ends_inside = end > existing.start_time && end < existing.end_time;
    let contains = start < existing.start_time && end > existing.end_time;
    let same_start = start == existing.start_time;

    starts_inside || ends_inside || contains || same_start
}

/// Daily booking window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub opening: NaiveTime,

    /// Exclusive
    pub closing: NaiveTime,

    pub slot_minutes: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closing: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
        }
    }
}

impl BusinessHours {
    pub fn new(opening: NaiveTime, closing: NaiveTime, slot_minutes: u32) -> Self {
        Self {
            opening,
            closing,
            slot_minutes,
        }
    }

    /// Build from the `schedule` configuration section
    pub fn from_config(config: &ScheduleConfig) -> AppResult<Self> {
        Ok(Self::new(
            parse_clock_time(&config.opening_time)?,
            parse_clock_time(&config.closing_time)?,
            config.slot_minutes,
        ))
    }

    /// Slot start times on `date`, ascending
    ///
    /// Empty when the window is degenerate or the step is zero.
    pub fn slot_starts(&self, date: NaiveDate) -> Vec<NaiveDateTime> {
        if self.slot_minutes == 0 || self.closing <= self.opening {
            return Vec::new();
        }

        let step = Duration::minutes(i64::from(self.slot_minutes));
        let closing = date.and_time(self.closing);
        let mut current = date.and_time(self.opening);
        let mut starts = Vec::new();

        while current < closing {
            starts.push(current);
            current += step;
        }

        starts
    }
}

/// Slot availability calculator
#[derive(Debug, Clone, Default)]
pub struct SlotCalculator {
    hours: BusinessHours,
}

impl SlotCalculator {
    pub fn new(hours: BusinessHours) -> Self {
        Self { hours }
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    /// Every slot of the day with its availability
    ///
    /// The slot count depends only on the business hours, never on the
    /// bookings.
    // TODO: reject start times whose appointment runs past closing
    pub fn generate_slots(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        existing: &[BookingInterval],
    ) -> Vec<TimeSlot> {
        let duration = Duration::minutes(i64::from(duration_minutes));

        self.hours
            .slot_starts(date)
            .into_iter()
            .map(|start| {
                let label = start.format("%H:%M").to_string();
                if Self::is_free(start, start + duration, existing) {
                    TimeSlot::open(label)
                } else {
                    TimeSlot::blocked(label)
                }
            })
            .collect()
    }

    /// Only the free "HH:MM" start times
    pub fn available_times(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        existing: &[BookingInterval],
    ) -> Vec<String> {
        self.generate_slots(date, duration_minutes, existing)
            .into_iter()
            .filter(|slot| slot.available)
            .map(|slot| slot.time)
            .collect()
    }

    /// Check a single "HH:MM" start time
    pub fn is_available(
        &self,
        date: NaiveDate,
        time: &str,
        duration_minutes: u32,
        existing: &[BookingInterval],
    ) -> AppResult<bool> {
        let start = date.and_time(parse_clock_time(time)?);
        let end = booking_end_time(date, time, duration_minutes)?;
        Ok(Self::is_free(start, end, existing))
    }

    /// Check an already parsed start
    pub fn is_available_at(
        &self,
        start: NaiveDateTime,
        duration_minutes: u32,
        existing: &[BookingInterval],
    ) -> bool {
        let end = start + Duration::minutes(i64::from(duration_minutes));
        Self::is_free(start, end, existing)
    }

    fn is_free(start: NaiveDateTime, end: NaiveDateTime, existing: &[BookingInterval]) -> bool {
        !existing.iter().any(|interval| blocked_by(start, end, interval))
    }
}

/// Slot queries against the booking store
pub struct AvailabilityService {
    bookings: Arc<dyn BookingRepository>,
    calculator: SlotCalculator,
}

impl AvailabilityService {
    /// Create a new availability service
    pub fn new(bookings: Arc<dyn BookingRepository>, calculator: SlotCalculator) -> Self {
        Self {
            bookings,
            calculator,
        }
    }

    pub fn calculator(&self) -> &SlotCalculator {
        &self.calculator
    }

    /// Slot grid for `date` given the appointment length
    #[instrument(skip(self))]
    pub async fn slots_for(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> AppResult<Vec<TimeSlot>> {
        if duration_minutes == 0 {
            return Err(AppError::InvalidInput(
                "duration_minutes must be at least 1".to_string(),
            ));
        }

        let intervals = self.bookings.intervals_on(date).await?;
        let slots = self
            .calculator
            .generate_slots(date, duration_minutes, &intervals);

        debug!(
            "{} of {} slots free on {} ({} bookings)",
            slots.iter().filter(|s| s.available).count(),
            slots.len(),
            date,
            intervals.len()
        );

        Ok(slots)
    }
}
