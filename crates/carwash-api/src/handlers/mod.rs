//! HTTP request handlers

pub mod booking;
pub mod contract;
pub mod health;
pub mod invoice;
pub mod location;
pub mod notification;
pub mod payment;
pub mod service;
pub mod slot;

pub use booking::configure as configure_bookings;
pub use contract::configure as configure_contracts;
pub use health::configure as configure_health;
pub use invoice::configure as configure_invoices;
pub use location::configure as configure_locations;
pub use notification::configure as configure_notifications;
pub use payment::configure as configure_payments;
pub use service::configure as configure_services;
pub use slot::configure as configure_slots;
