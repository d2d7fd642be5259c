//! Booking models
//!
//! A booking is a single scheduled appointment at the customer's address.
//! Its interval is derived from the start time and the summed duration of
//! the booked services.

use super::customer::Customer;
use super::invoice::InvoiceMetadata;
use super::payment::PaymentState;
use super::schedule::BookingInterval;
use super::service::VehicleType;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, not yet confirmed
    #[default]
    Pending,
    /// Slot confirmed
    Confirmed,
    /// Wash carried out
    Completed,
    /// Cancelled; no longer holds its slot
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl BookingStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the booking still occupies its slot
    pub fn holds_slot(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }
}

/// Service line as priced at booking time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedService {
    pub service_id: Uuid,
    pub name: String,

    /// Unit price for the booking's vehicle category
    pub price: Decimal,

    pub duration_minutes: u32,
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer: Customer,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub location: String,
    pub vehicle_type: VehicleType,
    pub number_of_cars: u32,
    pub services: Vec<BookedService>,

    /// Sum of service prices times number of cars
    pub base_price: Decimal,

    /// Distance surcharge (zero inside the free radius)
    pub service_charge: Decimal,

    pub total_price: Decimal,
    pub distance_km: Option<f64>,
    pub within_radius: Option<bool>,
    pub notes: Option<String>,
    pub status: BookingStatus,
    pub invoice: Option<InvoiceMetadata>,
    pub payment: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Total time the appointment blocks in the schedule
    pub fn duration_minutes(&self) -> u32 {
        self.services.iter().map(|s| s.duration_minutes).sum()
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Interval this booking occupies
    pub fn interval(&self) -> BookingInterval {
        let start = self.starts_at();
        BookingInterval::new(
            start,
            start + Duration::minutes(i64::from(self.duration_minutes())),
            self.label(),
        )
    }

    /// Comma separated service names
    pub fn label(&self) -> String {
        self.services
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Admin listing filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,

    /// Case-insensitive match on customer name, e-mail or location
    pub search: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        if self.status.is_some_and(|s| s != booking.status) {
            return false;
        }

        match self.search.as_deref() {
            Some(term) => {
                let term = term.to_lowercase();
                let contains = |value: &str| value.to_lowercase().contains(&term);
                booking.customer.name.as_deref().is_some_and(contains)
                    || contains(&booking.customer.email)
                    || contains(&booking.location)
            }
            None => true,
        }
    }
}

/// Admin edits to an existing booking; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingChanges {
    pub status: Option<BookingStatus>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl BookingChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.location.is_none() && self.notes.is_none()
    }

    pub fn touches_details(&self) -> bool {
        self.location.is_some() || self.notes.is_some()
    }
}

/// Data needed to persist a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub location: String,
    pub vehicle_type: VehicleType,
    pub number_of_cars: u32,
    pub services: Vec<BookedService>,
    pub base_price: Decimal,
    pub service_charge: Decimal,
    pub total_price: Decimal,
    pub distance_km: Option<f64>,
    pub within_radius: Option<bool>,
    pub notes: Option<String>,
    pub status: BookingStatus,
}

impl NewBooking {
    /// Materialize into a stored booking for the given customer
    pub fn into_booking(self, customer: Customer, now: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            customer,
            date: self.date,
            start_time: self.start_time,
            location: self.location,
            vehicle_type: self.vehicle_type,
            number_of_cars: self.number_of_cars,
            services: self.services,
            base_price: self.base_price,
            service_charge: self.service_charge,
            total_price: self.total_price,
            distance_km: self.distance_km,
            within_radius: self.within_radius,
            notes: self.notes,
            status: self.status,
            invoice: None,
            payment: PaymentState::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
