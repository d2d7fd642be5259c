//! Business logic services for the K2025 mobile carwash
//!
//! This crate contains the three pure calculators (slot availability,
//! invoice math and distance surcharge) and the services that wire them to
//! the store and the external providers.
//!
//! # Architecture
//!
//! - Calculators are synchronous, hold no mutable state and never log
//! - Services own their collaborators as `Arc<dyn Trait>` so any store or
//!   provider (including test fakes) can be injected
//! - All service operations are instrumented with tracing
//! - Errors propagate as `AppError`
//!
//! # Services
//!
//! - `AvailabilityService` - Daily slot grid against stored bookings
//! - `InvoiceService` - Invoice issuing and invoice overview
//! - `LocationService` - Address to travel-surcharge quote
//! - `BookingService` - Booking creation and lookup
//! - `ContractService` - Prepaid package sales and lookup
//! - `PaymentService` - Payment intents, gateway webhooks, manual confirmation
//! - `NotificationService` - Fan-out of rendered messages over e-mail/WhatsApp

pub mod bookings;
pub mod contracts;
pub mod distance;
pub mod invoicing;
pub mod notifications;
pub mod payments;
pub mod scheduling;

pub use bookings::{BookingRequest, BookingService};
pub use contracts::{ContractRequest, ContractService};
pub use distance::{haversine_km, quote, surcharge_for, LocationService};
pub use invoicing::{
    InvoiceCalculator, InvoiceNumberGenerator, InvoiceOverview, InvoiceQuery, InvoiceRequest,
    InvoiceService, InvoiceSource, InvoiceSummary, IssuedInvoice,
};
pub use notifications::{ChannelReport, NotificationReport, NotificationService, Recipient};
pub use payments::{IntentRequest, ManualPayment, PaymentConfirmation, PaymentService};
pub use scheduling::{
    booking_end_time, parse_clock_time, AvailabilityService, BusinessHours, SlotCalculator,
};

/// Business logic constants
pub mod constants {
    /// Earth radius used by the haversine distance, in kilometres
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Invoice number prefix
    pub const INVOICE_PREFIX: &str = "INV";

    /// Window used for the "expiring soon" invoice summary, in hours
    pub const EXPIRING_SOON_HOURS: i64 = 6;

    /// Minor units per currency unit
    pub const MINOR_UNITS: i64 = 100;

    /// Payment method recorded for card payments
    pub const CARD_PAYMENT_METHOD: &str = "stripe";
}
