//! Domain models for the carwash service
//!
//! This module contains all the core domain models used throughout the application.

pub mod booking;
pub mod contract;
pub mod customer;
pub mod invoice;
pub mod location;
pub mod notification;
pub mod payment;
pub mod schedule;
pub mod service;

pub use booking::{
    BookedService, Booking, BookingChanges, BookingFilter, BookingStatus, NewBooking,
};
pub use contract::{Contract, ContractPackage, ContractStatus, NewContract};
pub use customer::{Customer, CustomerContact};
pub use invoice::{
    Invoice, InvoiceFilter, InvoiceKind, InvoiceLineItem, InvoiceMetadata, PaymentInstructions,
};
pub use location::{Coordinates, DistanceQuote};
pub use notification::{Channel, DeliveryReceipt, OutboundMessage};
pub use payment::{
    NewPayment, Payment, PaymentIntent, PaymentIntentRequest, PaymentOutcome, PaymentOutcomeKind,
    PaymentState, PaymentStatus,
};
pub use schedule::{BookingInterval, TimeSlot};
pub use service::{ServiceTier, VehicleType, WashService};
