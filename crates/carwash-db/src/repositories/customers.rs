//! Customer upsert shared by the booking and contract repositories

use super::normalize_email;
use carwash_core::{models::Customer, AppError, AppResult};
use sqlx::PgConnection;
use tracing::error;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: Option<String>,
    email: String,
    phone: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
        }
    }
}

/// Find or create the customer with this e-mail
///
/// Known customers keep their stored name and phone unless new values are
/// supplied.
pub(crate) async fn upsert_customer(
    conn: &mut PgConnection,
    name: Option<&str>,
    email: &str,
    phone: Option<&str>,
) -> AppResult<Customer> {
    let row = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
        r#"
        INSERT INTO customers (id, name, email, phone)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET
            name = COALESCE(EXCLUDED.name, customers.name),
            phone = COALESCE(EXCLUDED.phone, customers.phone),
            updated_at = NOW()
        RETURNING id, name, email, phone
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(normalize_email(email))
    .bind(phone)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        error!("Database error upserting customer {}: {}", email, e);
        AppError::Database(format!("Failed to save customer: {}", e))
    })?;

    Ok(row.into())
}
