//! Invoice computation and lifecycle
//!
//! `InvoiceCalculator` is pure apart from invoice numbering: given a booking
//! or contract and the issue instant it produces line items, tax, total and
//! expiry. `InvoiceService` loads the source, stores the invoice metadata on
//! it and e-mails the customer.

use carwash_core::{
    config::BillingConfig,
    models::{
        Booking, Contract, CustomerContact, Invoice, InvoiceFilter, InvoiceKind, InvoiceLineItem,
        PaymentInstructions, PaymentStatus,
    },
    traits::{BookingRepository, ContractRepository},
    AppError, AppResult,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::{EXPIRING_SOON_HOURS, INVOICE_PREFIX};
use crate::notifications::{ChannelReport, NotificationService};

/// Description of the distance surcharge line
const SURCHARGE_DESCRIPTION: &str = "Mobile Service Charge (Distance)";

/// `now` plus `hours`, rejecting windows chrono cannot represent
fn window_end(now: DateTime<Utc>, hours: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| {
            AppError::InvalidInput(format!("expiring window of {} hours is out of range", hours))
        })
}

/// Unique invoice numbers for the lifetime of the process
///
/// Format: `INV-<millisecond stamp>-<3 random digits>`. The stamp is forced
/// to increase strictly, so two numbers issued in the same millisecond still
/// differ.
#[derive(Debug, Default)]
pub struct InvoiceNumberGenerator {
    last_stamp: AtomicI64,
}

impl InvoiceNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next invoice number for an invoice issued at `now`
    pub fn next(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(millis.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        let stamp = millis.max(previous + 1);

        let suffix: u16 = rand::thread_rng().gen_range(0..1000);
        format!("{}-{}-{:03}", INVOICE_PREFIX, stamp, suffix)
    }
}

/// What an invoice is built from
#[derive(Debug, Clone, Copy)]
pub enum InvoiceSource<'a> {
    Booking(&'a Booking),
    Contract(&'a Contract),
}

impl InvoiceSource<'_> {
    pub fn kind(&self) -> InvoiceKind {
        match self {
            InvoiceSource::Booking(_) => InvoiceKind::Booking,
            InvoiceSource::Contract(_) => InvoiceKind::Contract,
        }
    }

    fn customer(&self) -> CustomerContact {
        match self {
            InvoiceSource::Booking(b) => b.customer.contact(),
            InvoiceSource::Contract(c) => c.customer.contact(),
        }
    }
}

/// Invoice math
pub struct InvoiceCalculator {
    billing: BillingConfig,
    numbers: InvoiceNumberGenerator,
}

impl InvoiceCalculator {
    pub fn new(billing: BillingConfig) -> Self {
        Self {
            billing,
            numbers: InvoiceNumberGenerator::new(),
        }
    }

    pub fn tax_rate(&self) -> Decimal {
        self.billing.tax_rate
    }

    /// One line per service (quantity = cars) plus the distance surcharge
    pub fn booking_line_items(booking: &Booking) -> Vec<InvoiceLineItem> {
        let mut items: Vec<InvoiceLineItem> = booking
            .services
            .iter()
            .map(|service| {
                InvoiceLineItem::new(
                    format!("{} ({})", service.name, booking.vehicle_type.label()),
                    booking.number_of_cars,
                    service.price,
                )
            })
            .collect();

        if booking.service_charge > Decimal::ZERO {
            items.push(InvoiceLineItem::new(
                SURCHARGE_DESCRIPTION,
                1,
                booking.service_charge,
            ));
        }

        items.retain(|item| item.quantity > 0);
        items
    }

    /// The single package line of a contract
    pub fn contract_line_items(contract: &Contract) -> Vec<InvoiceLineItem> {
        vec![InvoiceLineItem::new(
            format!(
                "{} Package ({} washes)",
                contract.contract_type, contract.total_washes
            ),
            1,
            contract.total_price,
        )]
    }

    /// Subtotal, tax and total, each rounded to cents
    pub fn totals(items: &[InvoiceLineItem], tax_rate: Decimal) -> (Decimal, Decimal, Decimal) {
        let subtotal: Decimal = items.iter().map(|i| i.line_total).sum();
        let subtotal = subtotal.round_dp(2);
        let tax = (subtotal * tax_rate).round_dp(2);
        (subtotal, tax, subtotal + tax)
    }

    /// Build a fresh invoice issued at `now`
    ///
    /// Every call yields a new number; amounts depend only on the source.
    pub fn build_invoice(&self, source: InvoiceSource<'_>, now: DateTime<Utc>) -> Invoice {
        let line_items = match source {
            InvoiceSource::Booking(b) => Self::booking_line_items(b),
            InvoiceSource::Contract(c) => Self::contract_line_items(c),
        };
        let (subtotal, tax_amount, total) = Self::totals(&line_items, self.billing.tax_rate);
        let invoice_number = self.numbers.next(now);

        let (booking_id, contract_id) = match source {
            InvoiceSource::Booking(b) => (Some(b.id), None),
            InvoiceSource::Contract(c) => (None, Some(c.id)),
        };

        Invoice {
            kind: source.kind(),
            issued_at: now,
            due_at: now + Duration::hours(self.billing.invoice_validity_hours),
            customer: source.customer(),
            line_items,
            subtotal,
            tax_rate: self.billing.tax_rate,
            tax_amount,
            total,
            currency: self.billing.currency.clone(),
            payment_reference: invoice_number.clone(),
            payment: PaymentInstructions {
                bank_name: self.billing.bank_name.clone(),
                account_name: self.billing.account_name.clone(),
                account_number: self.billing.account_number.clone(),
                reference: invoice_number.clone(),
            },
            invoice_number,
            booking_id,
            contract_id,
        }
    }
}

/// Invoice issue request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceRequest {
    pub kind: Option<InvoiceKind>,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
}

impl InvoiceRequest {
    /// Resolve which record is being invoiced
    fn target(&self) -> AppResult<(InvoiceKind, Uuid)> {
        let (kind, id) = match (self.booking_id, self.contract_id) {
            (Some(id), None) => (InvoiceKind::Booking, id),
            (None, Some(id)) => (InvoiceKind::Contract, id),
            (None, None) => {
                return Err(AppError::InvalidInput(
                    "either booking_id or contract_id is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(AppError::InvalidInput(
                    "only one of booking_id or contract_id may be given".to_string(),
                ))
            }
        };

        match self.kind {
            Some(requested) if requested != kind => Err(AppError::InvalidInput(format!(
                "invoice type '{}' does not match the supplied {} id",
                requested, kind
            ))),
            _ => Ok((kind, id)),
        }
    }
}

/// Result of issuing an invoice
#[derive(Debug, Clone, Serialize)]
pub struct IssuedInvoice {
    pub invoice: Invoice,
    pub email: ChannelReport,
}

/// Invoice listing query
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    pub payment_status: Option<PaymentStatus>,
    pub kind: Option<InvoiceKind>,
    pub expiring_within_hours: Option<i64>,
}

/// Invoice listing counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    pub total_pending_bookings: usize,
    pub total_pending_contracts: usize,
    pub expiring_soon: usize,
}

/// Invoiced records with summary
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceOverview {
    pub bookings: Vec<Booking>,
    pub contracts: Vec<Contract>,
    pub summary: InvoiceSummary,
}

/// Invoice issuing and listing
pub struct InvoiceService {
    bookings: Arc<dyn BookingRepository>,
    contracts: Arc<dyn ContractRepository>,
    calculator: InvoiceCalculator,
    notifications: Arc<NotificationService>,
}

impl InvoiceService {
    /// Create a new invoice service
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        contracts: Arc<dyn ContractRepository>,
        calculator: InvoiceCalculator,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            bookings,
            contracts,
            calculator,
            notifications,
        }
    }

    /// Issue a new invoice for a booking or contract
    ///
    /// The invoice metadata is stored on the source and its payment status
    /// reset to pending. E-mail delivery failures are reported in the result.
    #[instrument(skip(self))]
    pub async fn issue(&self, request: InvoiceRequest) -> AppResult<IssuedInvoice> {
        let (kind, id) = request.target()?;
        let now = Utc::now();

        let invoice = match kind {
            InvoiceKind::Booking => {
                let booking = self
                    .bookings
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

                let invoice = self
                    .calculator
                    .build_invoice(InvoiceSource::Booking(&booking), now);
                self.bookings.record_invoice(id, &invoice.metadata()).await?;
                invoice
            }
            InvoiceKind::Contract => {
                let contract = self
                    .contracts
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))?;

                let invoice = self
                    .calculator
                    .build_invoice(InvoiceSource::Contract(&contract), now);
                self.contracts
                    .record_invoice(id, &invoice.metadata())
                    .await?;
                invoice
            }
        };

        info!(
            "Issued invoice {} for {} {} (total {} {})",
            invoice.invoice_number, kind, id, invoice.currency, invoice.total
        );

        let email = self
            .notifications
            .email(&invoice.customer.email, &invoice.subject(), &invoice.summary_text())
            .await;
        if !email.success {
            warn!(
                "Invoice {} issued but not e-mailed: {}",
                invoice.invoice_number,
                email.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(IssuedInvoice { invoice, email })
    }

    /// List invoiced bookings and contracts with a summary
    #[instrument(skip(self))]
    pub async fn overview(&self, query: InvoiceQuery) -> AppResult<InvoiceOverview> {
        let now = Utc::now();

        if query.expiring_within_hours.is_some_and(|h| h <= 0) {
            return Err(AppError::InvalidInput(
                "expiring window must be a positive number of hours".to_string(),
            ));
        }

        let expires_between = match query.expiring_within_hours {
            Some(hours) => Some((now, window_end(now, hours)?)),
            None => None,
        };
        let filter = InvoiceFilter {
            payment_status: query.payment_status,
            expires_between,
        };

        let bookings = match query.kind {
            None | Some(InvoiceKind::Booking) => self.bookings.list_invoiced(&filter).await?,
            Some(InvoiceKind::Contract) => Vec::new(),
        };
        let contracts = match query.kind {
            None | Some(InvoiceKind::Contract) => self.contracts.list_invoiced(&filter).await?,
            Some(InvoiceKind::Booking) => Vec::new(),
        };

        let soon = now + Duration::hours(EXPIRING_SOON_HOURS);
        let expiring = |expires_at: DateTime<Utc>| expires_at >= now && expires_at <= soon;

        let summary = InvoiceSummary {
            total_pending_bookings: bookings
                .iter()
                .filter(|b| b.payment.status == PaymentStatus::Pending)
                .count(),
            total_pending_contracts: contracts
                .iter()
                .filter(|c| c.payment.status == PaymentStatus::Pending)
                .count(),
            expiring_soon: bookings
                .iter()
                .filter_map(|b| b.invoice.as_ref())
                .chain(contracts.iter().filter_map(|c| c.invoice.as_ref()))
                .filter(|meta| expiring(meta.expires_at))
                .count(),
        };

        debug!(
            "Invoice overview: {} bookings, {} contracts",
            bookings.len(),
            contracts.len()
        );

        Ok(InvoiceOverview {
            bookings,
            contracts,
            summary,
        })
    }
}
