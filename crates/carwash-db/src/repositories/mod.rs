//! Repository implementations
//!
//! This module contains concrete implementations of the repository traits
//! defined in carwash-core, using sqlx for PostgreSQL access.

pub mod booking_repo;
pub mod contract_repo;
mod customers;
pub mod payment_repo;
pub mod service_repo;

pub use booking_repo::PgBookingRepository;
pub use contract_repo::PgContractRepository;
pub use payment_repo::PgPaymentRepository;
pub use service_repo::PgServiceCatalog;

use carwash_core::models::{InvoiceMetadata, PaymentState, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Canonical form of a customer e-mail address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whether the error is a unique constraint violation (SQLSTATE 23505)
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Invoice metadata from its nullable columns
pub(crate) fn invoice_from_columns(
    number: Option<String>,
    sent_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
) -> Option<InvoiceMetadata> {
    match (number, sent_at, expires_at) {
        (Some(invoice_number), Some(sent_at), Some(expires_at)) => Some(InvoiceMetadata {
            invoice_number,
            sent_at,
            expires_at,
        }),
        _ => None,
    }
}

/// Payment state from its columns
pub(crate) fn payment_from_columns(
    status: &str,
    method: Option<String>,
    paid_amount: Option<Decimal>,
    paid_at: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
) -> PaymentState {
    PaymentState {
        status: PaymentStatus::from_str(status).unwrap_or_default(),
        method,
        paid_amount,
        paid_at,
        admin_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Thandi@Example.COM "), "thandi@example.com");
    }

    #[test]
    fn test_invoice_requires_all_columns() {
        let now = Utc::now();
        assert!(invoice_from_columns(Some("INV-1".to_string()), Some(now), None).is_none());

        let meta =
            invoice_from_columns(Some("INV-1".to_string()), Some(now), Some(now)).unwrap();
        assert_eq!(meta.invoice_number, "INV-1");
    }

    #[test]
    fn test_payment_status_fallback() {
        let state = payment_from_columns("mystery", None, None, None, None);
        assert_eq!(state.status, PaymentStatus::Pending);

        let state = payment_from_columns("paid", Some("eft".to_string()), None, None, None);
        assert_eq!(state.status, PaymentStatus::Paid);
    }
}
