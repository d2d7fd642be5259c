//! Booking repository implementation
//!
//! Bookings are stored with a snapshot of the services as priced at booking
//! time. A partial unique index on `(booking_date, start_time)` keeps two
//! live bookings from claiming the same start.

use super::customers::upsert_customer;
use super::{invoice_from_columns, is_unique_violation, payment_from_columns};
use carwash_core::{
    models::{
        BookedService, Booking, BookingFilter, BookingInterval, BookingStatus, Customer,
        InvoiceFilter, InvoiceMetadata, NewBooking, PaymentState, VehicleType,
    },
    traits::BookingRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const BOOKING_SELECT: &str = r#"
    SELECT
        b.id, b.booking_date, b.start_time, b.location, b.vehicle_type,
        b.number_of_cars, b.base_price, b.service_charge, b.total_price,
        b.distance_km, b.within_radius, b.notes, b.status,
        b.invoice_number, b.invoice_sent_at, b.invoice_expires_at,
        b.payment_status, b.payment_method, b.paid_amount, b.paid_at, b.admin_notes,
        b.created_at, b.updated_at,
        c.id AS customer_id, c.name AS customer_name,
        c.email AS customer_email, c.phone AS customer_phone
    FROM bookings b
    JOIN customers c ON c.id = b.customer_id
"#;

/// PostgreSQL implementation of BookingRepository
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> BookingStatus {
        BookingStatus::from_str(s).unwrap_or(BookingStatus::Pending)
    }

    /// Convert database vehicle type string to enum
    fn parse_vehicle_type(s: &str) -> VehicleType {
        VehicleType::from_str(s).unwrap_or(VehicleType::Small)
    }

    /// Load the service snapshots for the rows and assemble bookings
    async fn assemble(&self, rows: Vec<BookingRow>) -> AppResult<Vec<Booking>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let lines = sqlx::query_as::<sqlx::Postgres, BookedServiceRow>(
            r#"
            SELECT booking_id, service_id, name, price, duration_minutes
            FROM booking_services
            WHERE booking_id = ANY($1)
            ORDER BY booking_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading booked services: {}", e);
            AppError::Database(format!("Failed to load booked services: {}", e))
        })?;

        let mut by_booking: HashMap<Uuid, Vec<BookedService>> = HashMap::new();
        for line in lines {
            by_booking
                .entry(line.booking_id)
                .or_default()
                .push(line.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let services = by_booking.remove(&row.id).unwrap_or_default();
                row.into_booking(services)
            })
            .collect())
    }

    fn ensure_updated(id: Uuid, rows_affected: u64) -> AppResult<()> {
        if rows_affected == 0 {
            warn!("Booking {} not found for update", id);
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        debug!("Finding booking by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "{} WHERE b.id = $1",
            BOOKING_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding booking {}: {}", id, e);
            AppError::Database(format!("Failed to find booking: {}", e))
        })?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, booking), fields(date = %booking.date, start = %booking.start_time))]
    async fn create(&self, booking: NewBooking) -> AppResult<Booking> {
        debug!("Creating booking for {}", booking.customer_email);

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Database(format!("Failed to start transaction: {}", e))
        })?;

        let customer = upsert_customer(
            &mut *tx,
            booking.customer_name.as_deref(),
            &booking.customer_email,
            booking.customer_phone.as_deref(),
        )
        .await?;
        let booking = booking.into_booking(customer, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, customer_id, booking_date, start_time, location, vehicle_type,
                number_of_cars, base_price, service_charge, total_price,
                distance_km, within_radius, notes, status, payment_status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id)
        .bind(booking.customer.id)
        .bind(booking.date)
        .bind(booking.start_time)
        .bind(&booking.location)
        .bind(booking.vehicle_type.to_string())
        .bind(booking.number_of_cars as i32)
        .bind(booking.base_price)
        .bind(booking.service_charge)
        .bind(booking.total_price)
        .bind(booking.distance_km)
        .bind(booking.within_radius)
        .bind(&booking.notes)
        .bind(booking.status.to_string())
        .bind(booking.payment.status.to_string())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(
                    "Slot {} {} already taken",
                    booking.date,
                    booking.start_time.format("%H:%M")
                );
                AppError::Conflict(format!(
                    "Time slot {} {} is already booked",
                    booking.date,
                    booking.start_time.format("%H:%M")
                ))
            } else {
                error!("Database error creating booking: {}", e);
                AppError::Database(format!("Failed to create booking: {}", e))
            }
        })?;

        for (position, service) in booking.services.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO booking_services (
                    booking_id, position, service_id, name, price, duration_minutes
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(booking.id)
            .bind(position as i32)
            .bind(service.service_id)
            .bind(&service.name)
            .bind(service.price)
            .bind(service.duration_minutes as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Database error saving booked service: {}", e);
                AppError::Database(format!("Failed to save booked service: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Database(format!("Failed to commit transaction: {}", e))
        })?;

        debug!("Created booking {}", booking.id);
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn intervals_on(&self, date: NaiveDate) -> AppResult<Vec<BookingInterval>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "{} WHERE b.booking_date = $1 AND b.status <> 'cancelled' ORDER BY b.start_time",
            BOOKING_SELECT
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading bookings on {}: {}", date, e);
            AppError::Database(format!("Failed to load bookings: {}", e))
        })?;

        let bookings = self.assemble(rows).await?;
        debug!("{} bookings on {}", bookings.len(), date);

        Ok(bookings.iter().map(Booking::interval).collect())
    }

    #[instrument(skip(self, invoice), fields(invoice = %invoice.invoice_number))]
    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
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
            error!("Database error recording invoice on booking {}: {}", id, e);
            AppError::Database(format!("Failed to record invoice: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Booking {} slot is already taken", id))
            } else {
                error!("Database error updating booking {}: {}", id, e);
                AppError::Database(format!("Failed to update booking: {}", e))
            }
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self, payment), fields(status = %payment.status))]
    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
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
            error!("Database error recording payment on booking {}: {}", id, e);
            AppError::Database(format!("Failed to record payment: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_invoiced(&self, filter: &InvoiceFilter) -> AppResult<Vec<Booking>> {
        let (from, to) = filter.expires_between.unzip();

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            r#"{}
            WHERE b.invoice_number IS NOT NULL
              AND ($1::text IS NULL OR b.payment_status = $1)
              AND ($2::timestamptz IS NULL OR b.invoice_expires_at >= $2)
              AND ($3::timestamptz IS NULL OR b.invoice_expires_at <= $3)
            ORDER BY b.invoice_sent_at DESC
            "#,
            BOOKING_SELECT
        ))
        .bind(filter.payment_status.map(|s| s.to_string()))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing invoiced bookings: {}", e);
            AppError::Database(format!("Failed to list invoiced bookings: {}", e))
        })?;

        self.assemble(rows).await
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        debug!(
            "Listing bookings with filters: status={:?}, search={:?}, limit={}, offset={}",
            filter.status, filter.search, limit, offset
        );

        let status = filter.status.map(|s| s.to_string());
        let pattern = filter.search.as_deref().map(like_pattern);

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM bookings b JOIN customers c ON c.id = b.customer_id {}",
            LIST_WHERE
        ))
        .bind(&status)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting bookings: {}", e);
            AppError::Database(format!("Failed to count bookings: {}", e))
        })?;

        let rows = sqlx::query_as::<sqlx::Postgres, BookingRow>(&format!(
            "{} {} ORDER BY b.created_at DESC, b.id DESC LIMIT $3 OFFSET $4",
            BOOKING_SELECT, LIST_WHERE
        ))
        .bind(&status)
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing bookings: {}", e);
            AppError::Database(format!("Failed to list bookings: {}", e))
        })?;

        Ok((self.assemble(rows).await?, total.0))
    }

    #[instrument(skip(self, notes))]
    async fn update_details(&self, id: Uuid, location: &str, notes: Option<&str>) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE bookings SET location = $2, notes = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(location)
        .bind(notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating booking {}: {}", id, e);
            AppError::Database(format!("Failed to update booking: {}", e))
        })?;

        Self::ensure_updated(id, result.rows_affected())
    }
}

/// Status and search conditions shared by the listing and its count
const LIST_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR b.status = $1)
      AND ($2::text IS NULL
           OR c.name ILIKE $2 ESCAPE '\'
           OR c.email ILIKE $2 ESCAPE '\'
           OR b.location ILIKE $2 ESCAPE '\')
"#;

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_date: NaiveDate,
    start_time: NaiveTime,
    location: String,
    vehicle_type: String,
    number_of_cars: i32,
    base_price: Decimal,
    service_charge: Decimal,
    total_price: Decimal,
    distance_km: Option<f64>,
    within_radius: Option<bool>,
    notes: Option<String>,
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

impl BookingRow {
    fn into_booking(self, services: Vec<BookedService>) -> Booking {
        Booking {
            id: self.id,
            customer: Customer {
                id: self.customer_id,
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
            },
            date: self.booking_date,
            start_time: self.start_time,
            location: self.location,
            vehicle_type: PgBookingRepository::parse_vehicle_type(&self.vehicle_type),
            number_of_cars: self.number_of_cars.max(0) as u32,
            services,
            base_price: self.base_price,
            service_charge: self.service_charge,
            total_price: self.total_price,
            distance_km: self.distance_km,
            within_radius: self.within_radius,
            notes: self.notes,
            status: PgBookingRepository::parse_status(&self.status),
            invoice: invoice_from_columns(
                self.invoice_number,
                self.invoice_sent_at,
                self.invoice_expires_at,
            ),
            payment: payment_from_columns(
                &self.payment_status,
                self.payment_method,
                self.paid_amount,
                self.paid_at,
                self.admin_notes,
            ),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookedServiceRow {
    booking_id: Uuid,
    service_id: Uuid,
    name: String,
    price: Decimal,
    duration_minutes: i32,
}

impl From<BookedServiceRow> for BookedService {
    fn from(row: BookedServiceRow) -> Self {
        Self {
            service_id: row.service_id,
            name: row.name,
            price: row.price,
            duration_minutes: row.duration_minutes.max(0) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            PgBookingRepository::parse_status("confirmed"),
            BookingStatus::Confirmed
        );
        assert_eq!(
            PgBookingRepository::parse_status("cancelled"),
            BookingStatus::Cancelled
        );
        assert_eq!(
            PgBookingRepository::parse_status("unknown"),
            BookingStatus::Pending
        );
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("danoon"), "%danoon%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_parse_vehicle_type() {
        assert_eq!(PgBookingRepository::parse_vehicle_type("suv"), VehicleType::Suv);
        assert_eq!(
            PgBookingRepository::parse_vehicle_type("bakkie"),
            VehicleType::Small
        );
    }
}
