//! Contract repository implementation

use super::customers::upsert_customer;
use super::{invoice_from_columns, payment_from_columns};
use carwash_core::{
    models::{
        Contract, ContractStatus, Customer, InvoiceFilter, InvoiceMetadata, NewContract,
        PaymentState,
    },
    traits::ContractRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const CONTRACT_SELECT: &str = r#"
    SELECT
        k.id, k.contract_type, k.total_washes, k.used_washes, k.total_price,
        k.start_date, k.end_date, k.status,
        k.invoice_number, k.invoice_sent_at, k.invoice_expires_at,
        k.payment_status, k.payment_method, k.paid_amount, k.paid_at, k.admin_notes,
        k.created_at, k.updated_at,
        c.id AS customer_id, c.name AS customer_name,
        c.email AS customer_email, c.phone AS customer_phone
    FROM contracts k
    JOIN customers c ON c.id = k.customer_id
"#;

/// PostgreSQL implementation of ContractRepository
pub struct PgContractRepository {
    pool: PgPool,
}

impl PgContractRepository {
    /// Create a new contract repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> ContractStatus {
        ContractStatus::from_str(s).unwrap_or(ContractStatus::Pending)
    }

    fn ensure_updated(id: Uuid, rows_affected: u64) -> AppResult<()> {
        if rows_affected == 0 {
            warn!("Contract {} not found for update", id);
            return Err(AppError::NotFound(format!("Contract {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContractRepository for PgContractRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>> {
        debug!("Finding contract by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, ContractRow>(&format!(
            "{} WHERE k.id = $1",
            CONTRACT_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding contract {}: {}", id, e);
            AppError::Database(format!("Failed to find contract: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, contract), fields(contract_type = %contract.contract_type))]
    async fn create(&self, contract: NewContract) -> AppResult<Contract> {
        debug!("Creating contract for {}", contract.customer_email);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Database(format!("Failed to start transaction: {}", e))
        })?;

        let customer = upsert_customer(
            &mut *tx,
            contract.customer_name.as_deref(),
            &contract.customer_email,
            contract.customer_phone.as_deref(),
        )
        .await?;
        let contract = contract.into_contract(customer, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, customer_id, contract_type, total_washes, used_washes, total_price,
                start_date, end_date, status, payment_status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(contract.id)
        .bind(contract.customer.id)
        .bind(&contract.contract_type)
        .bind(contract.total_washes as i32)
        .bind(contract.used_washes as i32)
        .bind(contract.total_price)
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.status.to_string())
        .bind(contract.payment.status.to_string())
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Database error creating contract: {}", e);
            AppError::Database(format!("Failed to create contract: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Database(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(contract)
    }

    #[instrument(skip(self, invoice), fields(invoice = %invoice.invoice_number))]
    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET invoice_number = $2,
                invoice_sent_at = $3,
                invoice_expires_at = $4,
                payment_status = 'pending',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&invoice.invoice_number)
        .bind(invoice.sent_at)
        .bind(invoice.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error recording invoice on contract {}: {}", id, e);
            AppError::Database(format!("Failed to record invoice: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: Uuid, status: ContractStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE contracts SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating contract {}: {}", id, e);
            AppError::Database(format!("Failed to update contract: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self, payment), fields(status = %payment.status))]
    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET payment_status = $2,
                payment_method = $3,
                paid_amount = $4,
                paid_at = $5,
                admin_notes = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payment.status.to_string())
        .bind(&payment.method)
        .bind(payment.paid_amount)
        .bind(payment.paid_at)
        .bind(&payment.admin_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error recording payment on contract {}: {}", id, e);
            AppError::Database(format!("Failed to record payment: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_invoiced(&self, filter: &InvoiceFilter) -> AppResult<Vec<Contract>> {
        let (from, to) = filter.expires_between.unzip();

        let rows = sqlx::query_as::<sqlx::Postgres, ContractRow>(&format!(
            r#"{}
            WHERE k.invoice_number IS NOT NULL
              AND ($1::text IS NULL OR k.payment_status = $1)
              AND ($2::timestamptz IS NULL OR k.invoice_expires_at >= $2)
              AND ($3::timestamptz IS NULL OR k.invoice_expires_at <= $3)
            ORDER BY k.invoice_sent_at DESC
            "#,
            CONTRACT_SELECT
        ))
        .bind(filter.payment_status.map(|s| s.to_string()))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing invoiced contracts: {}", e);
            AppError::Database(format!("Failed to list invoiced contracts: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: Uuid,
    contract_type: String,
    total_washes: i32,
    used_washes: i32,
    total_price: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    invoice_number: Option<String>,
    invoice_sent_at: Option<DateTime<Utc>>,
    invoice_expires_at: Option<DateTime<Utc>>,
    payment_status: String,
    payment_method: Option<String>,
    paid_amount: Option<Decimal>,
    paid_at: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_id: Uuid,
    customer_name: Option<String>,
    customer_email: String,
    customer_phone: Option<String>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            id: row.id,
            customer: Customer {
                id: row.customer_id,
                name: row.customer_name,
                email: row.customer_email,
                phone: row.customer_phone,
            },
            contract_type: row.contract_type,
            total_washes: row.total_washes.max(0) as u32,
            used_washes: row.used_washes.max(0) as u32,
            total_price: row.total_price,
            start_date: row.start_date,
            end_date: row.end_date,
            status: PgContractRepository::parse_status(&row.status),
            invoice: invoice_from_columns(
                row.invoice_number,
                row.invoice_sent_at,
                row.invoice_expires_at,
            ),
            payment: payment_from_columns(
                &row.payment_status,
                row.payment_method,
                row.paid_amount,
                row.paid_at,
                row.admin_notes,
            ),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
