//! K2025 Carwash Database Layer
//!
//! This crate provides persistence for the carwash service. It includes:
//!
//! - Connection pool management and embedded migrations with sqlx
//! - PostgreSQL repositories for bookings, contracts, payments and the
//!   service catalog
//! - `MemoryStore`, an in-process store used when no database is configured
//!   and by the service tests
//!
//! Both stores reject a second non-cancelled booking at the same date and
//! start time; the PostgreSQL store enforces it with a partial unique index.

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use carwash_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
