//! Payment transaction repository implementation
//!
//! One row per gateway transaction, keyed by the gateway's identifier so a
//! webhook can be matched back to the booking or contract it pays for.

use super::is_unique_violation;
use carwash_core::{
    models::{NewPayment, Payment, PaymentStatus},
    traits::PaymentRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// PostgreSQL implementation of PaymentRepository
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> PaymentStatus {
        PaymentStatus::from_str(s).unwrap_or(PaymentStatus::Pending)
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self, payment), fields(transaction_id = %payment.transaction_id))]
    async fn create(&self, payment: NewPayment) -> AppResult<Payment> {
        debug!("Recording payment of {} {}", payment.amount, payment.currency);

        let payment = payment.into_payment(Utc::now());

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            INSERT INTO payments (
                id, booking_id, contract_id, amount, currency,
                status, method, transaction_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, booking_id, contract_id, amount, currency,
                status, method, transaction_id, created_at, updated_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.contract_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.to_string())
        .bind(&payment.method)
        .bind(&payment.transaction_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!(
                    "Transaction {} already recorded",
                    payment.transaction_id
                ))
            } else {
                error!("Database error recording payment: {}", e);
                AppError::Database(format!("Failed to record payment: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT
                id, booking_id, contract_id, amount, currency,
                status, method, transaction_id, created_at, updated_at
            FROM payments
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment {}: {}", transaction_id, e);
            AppError::Database(format!("Failed to find payment: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn update_status_by_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            UPDATE payments
            SET status = $2, updated_at = NOW()
            WHERE transaction_id = $1
            RETURNING
                id, booking_id, contract_id, amount, currency,
                status, method, transaction_id, created_at, updated_at
            "#,
        )
        .bind(transaction_id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating payment {}: {}", transaction_id, e);
            AppError::Database(format!("Failed to update payment: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Option<Uuid>,
    contract_id: Option<Uuid>,
    amount: Decimal,
    currency: String,
    status: String,
    method: String,
    transaction_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            contract_id: row.contract_id,
            amount: row.amount,
            currency: row.currency,
            status: PgPaymentRepository::parse_status(&row.status),
            method: row.method,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(PgPaymentRepository::parse_status("paid"), PaymentStatus::Paid);
        assert_eq!(
            PgPaymentRepository::parse_status("failed"),
            PaymentStatus::Failed
        );
        assert_eq!(
            PgPaymentRepository::parse_status("bogus"),
            PaymentStatus::Pending
        );
    }
}
