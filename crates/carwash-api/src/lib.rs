//! API layer for the K2025 mobile carwash
//!
//! HTTP handlers and DTOs for slots, bookings, contracts, invoices, address
//! quotes, payments and notifications. All routes are mounted by
//! [`configure`] and share one [`AppState`].

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::ApiResponse;
pub use state::{AppState, Providers, Repositories};

use actix_web::web;

/// Mount every API route on the given scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(handlers::configure_health)
        .configure(handlers::configure_slots)
        .configure(handlers::configure_services)
        .configure(handlers::configure_bookings)
        .configure(handlers::configure_contracts)
        .configure(handlers::configure_invoices)
        .configure(handlers::configure_locations)
        .configure(handlers::configure_payments)
        .configure(handlers::configure_notifications);
}
