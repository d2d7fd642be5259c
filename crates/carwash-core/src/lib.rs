//! K2025 Carwash Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the mobile carwash service. It includes:
//!
//! - Domain models (Booking, Contract, Invoice, TimeSlot, etc.)
//! - Collaborator traits for persistence and external providers
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
