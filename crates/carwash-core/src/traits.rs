//! Collaborator traits
//!
//! Defines the abstractions the services depend on: the persistence layer
//! and the external providers (geocoding, payments, notifications). Every
//! collaborator is injected, so production and tests can swap a real store
//! or provider for a deterministic fake.

use crate::error::AppError;
use crate::models::{
    Booking, BookingFilter, BookingInterval, BookingStatus, Channel, Contract, ContractStatus, Coordinates,
    DeliveryReceipt, InvoiceFilter, InvoiceMetadata, NewBooking, NewContract, NewPayment,
    OutboundMessage, Payment, PaymentIntent, PaymentIntentRequest, PaymentOutcome, PaymentState,
    PaymentStatus, WashService,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Booking persistence
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find booking by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;

    /// Persist a new booking
    ///
    /// Fails with `AppError::Conflict` when another non-cancelled booking
    /// already starts at the same date and time.
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError>;

    /// Intervals occupied by non-cancelled bookings on a day
    async fn intervals_on(&self, date: NaiveDate) -> Result<Vec<BookingInterval>, AppError>;

    /// Store freshly issued invoice metadata and reset payment to pending
    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> Result<(), AppError>;

    /// Update booking status
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<(), AppError>;

    /// Replace the payment state
    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> Result<(), AppError>;

    /// Invoiced bookings matching the filter, most recent invoice first
    async fn list_invoiced(&self, filter: &InvoiceFilter) -> Result<Vec<Booking>, AppError>;

    /// Bookings matching the filter, newest first, with the total match count
    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Booking>, i64), AppError>;

    /// Replace the service address and notes
    async fn update_details(
        &self,
        id: Uuid,
        location: &str,
        notes: Option<&str>,
    ) -> Result<(), AppError>;
}

/// Contract persistence
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Find contract by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>, AppError>;

    /// Persist a new pending contract
    async fn create(&self, contract: NewContract) -> Result<Contract, AppError>;

    /// Store freshly issued invoice metadata and reset payment to pending
    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> Result<(), AppError>;

    /// Update contract status
    async fn update_status(&self, id: Uuid, status: ContractStatus) -> Result<(), AppError>;

    /// Replace the payment state
    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> Result<(), AppError>;

    /// Invoiced contracts matching the filter, most recent invoice first
    async fn list_invoiced(&self, filter: &InvoiceFilter) -> Result<Vec<Contract>, AppError>;
}

/// Gateway transaction persistence
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record a new pending transaction
    ///
    /// Fails with `AppError::Conflict` on a duplicate transaction id.
    async fn create(&self, payment: NewPayment) -> Result<Payment, AppError>;

    /// Find transaction by gateway identifier
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, AppError>;

    /// Update status, returning the updated record if it exists
    async fn update_status_by_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, AppError>;
}

/// Wash service catalog
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Services with the given ids; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<WashService>, AppError>;

    /// All services, cheapest first
    async fn list(&self) -> Result<Vec<WashService>, AppError>;
}

/// Address to coordinates lookup
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text address
    async fn geocode(&self, address: &str) -> Result<Coordinates, AppError>;
}

/// Card payment provider
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment for the given amount
    async fn create_intent(&self, request: PaymentIntentRequest)
        -> Result<PaymentIntent, AppError>;

    /// Authenticate and decode a webhook delivery
    ///
    /// Returns `None` for events that carry no payment outcome.
    fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<Option<PaymentOutcome>, AppError>;
}

/// Delivery channel for pre-rendered messages
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Channel this implementation delivers on
    fn channel(&self) -> Channel;

    /// Deliver one message
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, AppError>;
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        assert_eq!(PaginationMeta::new(0, 1, 10).total_pages, 0);
        assert_eq!(PaginationMeta::new(10, 1, 10).total_pages, 1);
        assert_eq!(PaginationMeta::new(11, 2, 10).total_pages, 2);
        assert_eq!(PaginationMeta::new(5, 1, 0).total_pages, 0);
    }
}
