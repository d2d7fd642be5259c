//! Payment intents, gateway webhooks and manual confirmation

use carwash_core::{
    models::{
        Booking, BookingStatus, ContractStatus, InvoiceKind, NewPayment, PaymentIntent,
        PaymentIntentRequest, PaymentOutcome, PaymentOutcomeKind, PaymentState, PaymentStatus,
    },
    traits::{BookingRepository, ContractRepository, PaymentGateway, PaymentRepository},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::constants::{CARD_PAYMENT_METHOD, MINOR_UNITS};
use crate::notifications::{ChannelReport, NotificationService};

/// Card payment request
#[derive(Debug, Clone, Deserialize)]
pub struct IntentRequest {
    pub amount: Decimal,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub customer_email: Option<String>,
}

/// Payment recorded by an administrator (EFT, cash)
#[derive(Debug, Clone, Deserialize)]
pub struct ManualPayment {
    pub kind: InvoiceKind,
    pub id: Uuid,
    pub method: String,
    pub paid_amount: Decimal,
    pub admin_notes: Option<String>,
}

/// Result of a manual confirmation
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub kind: InvoiceKind,
    pub id: Uuid,
    pub payment: PaymentState,
    pub receipt: ChannelReport,
}

/// Payment service
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    payments: Arc<dyn PaymentRepository>,
    bookings: Arc<dyn BookingRepository>,
    contracts: Arc<dyn ContractRepository>,
    notifications: Arc<NotificationService>,
    currency: String,
}

impl PaymentService {
    /// Create a new payment service
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        payments: Arc<dyn PaymentRepository>,
        bookings: Arc<dyn BookingRepository>,
        contracts: Arc<dyn ContractRepository>,
        notifications: Arc<NotificationService>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            payments,
            bookings,
            contracts,
            notifications,
            currency: currency.into(),
        }
    }

    /// Convert an amount to minor currency units
    pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(format!(
                "amount {} must be positive",
                amount
            )));
        }
        (amount * Decimal::from(MINOR_UNITS))
            .round()
            .to_i64()
            .ok_or_else(|| AppError::InvalidInput(format!("amount {} is too large", amount)))
    }

    /// Open a card payment and record it as pending
    #[instrument(skip(self))]
    pub async fn create_intent(&self, request: IntentRequest) -> AppResult<PaymentIntent> {
        let amount_minor = Self::to_minor_units(request.amount)?;

        let mut metadata = HashMap::new();
        if let Some(id) = request.booking_id {
            metadata.insert("bookingId".to_string(), id.to_string());
        }
        if let Some(id) = request.contract_id {
            metadata.insert("contractId".to_string(), id.to_string());
        }
        if let Some(email) = &request.customer_email {
            metadata.insert("customerEmail".to_string(), email.clone());
        }

        let intent = self
            .gateway
            .create_intent(PaymentIntentRequest {
                amount_minor,
                currency: self.currency.to_lowercase(),
                receipt_email: request.customer_email.clone(),
                metadata,
            })
            .await?;

        self.payments
            .create(NewPayment {
                booking_id: request.booking_id,
                contract_id: request.contract_id,
                amount: request.amount,
                currency: self.currency.clone(),
                method: CARD_PAYMENT_METHOD.to_string(),
                transaction_id: intent.id.clone(),
            })
            .await?;

        info!(
            "Payment intent {} created for {} {}",
            intent.id, self.currency, request.amount
        );

        Ok(intent)
    }

    /// Authenticate a gateway webhook and apply its outcome
    ///
    /// Returns `None` for events that carry no payment outcome.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> AppResult<Option<PaymentOutcome>> {
        let Some(outcome) = self.gateway.parse_webhook(payload, signature)? else {
            debug!("Webhook event carries no payment outcome");
            return Ok(None);
        };

        match outcome.kind {
            PaymentOutcomeKind::Succeeded => self.apply_success(&outcome, Utc::now()).await?,
            PaymentOutcomeKind::Failed => {
                let updated = self
                    .payments
                    .update_status_by_transaction(&outcome.transaction_id, PaymentStatus::Failed)
                    .await?;
                if updated.is_none() {
                    warn!("Failed payment {} has no local record", outcome.transaction_id);
                }
                info!("Payment {} failed", outcome.transaction_id);
            }
        }

        Ok(Some(outcome))
    }

    async fn apply_success(&self, outcome: &PaymentOutcome, now: DateTime<Utc>) -> AppResult<()> {
        let payment = self
            .payments
            .update_status_by_transaction(&outcome.transaction_id, PaymentStatus::Paid)
            .await?;

        let booking_id = outcome
            .booking_id
            .or_else(|| payment.as_ref().and_then(|p| p.booking_id));
        let contract_id = outcome
            .contract_id
            .or_else(|| payment.as_ref().and_then(|p| p.contract_id));
        let amount = payment.as_ref().map(|p| p.amount);

        let state = PaymentState {
            status: PaymentStatus::Paid,
            method: Some(CARD_PAYMENT_METHOD.to_string()),
            paid_amount: amount,
            paid_at: Some(now),
            admin_notes: None,
        };

        if let Some(id) = booking_id {
            let booking = self
                .bookings
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;
            self.settle_booking(&booking, &state).await?;
            info!("Booking {} paid via {}", id, outcome.transaction_id);
        }
        if let Some(id) = contract_id {
            self.settle_contract(id, &state).await?;
            info!("Contract {} paid via {}", id, outcome.transaction_id);
        }
        if booking_id.is_none() && contract_id.is_none() {
            error!(
                "Payment {} succeeded but references no booking or contract",
                outcome.transaction_id
            );
        }

        Ok(())
    }

    /// Confirm a pending or cancelled booking, then store its payment
    ///
    /// The status moves first, so a refused confirmation leaves the payment
    /// unrecorded. Completed bookings keep their status.
    async fn settle_booking(&self, booking: &Booking, state: &PaymentState) -> AppResult<()> {
        if matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Cancelled
        ) {
            self.bookings
                .update_status(booking.id, BookingStatus::Confirmed)
                .await?;
        }
        self.bookings.record_payment(booking.id, state).await
    }

    /// Activate a contract, then store its payment
    async fn settle_contract(&self, id: Uuid, state: &PaymentState) -> AppResult<()> {
        self.contracts
            .update_status(id, ContractStatus::Active)
            .await?;
        self.contracts.record_payment(id, state).await
    }

    /// Mark a booking or contract as paid outside the gateway
    #[instrument(skip(self))]
    pub async fn confirm_manual(&self, request: ManualPayment) -> AppResult<PaymentConfirmation> {
        if request.method.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "payment method is required".to_string(),
            ));
        }
        if request.paid_amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "paid amount must be positive".to_string(),
            ));
        }

        let now = Utc::now();
        let state = PaymentState::paid(
            request.method.trim(),
            request.paid_amount.round_dp(2),
            now,
            request.admin_notes.clone(),
        );

        let (email, subject, body) = match request.kind {
            InvoiceKind::Booking => {
                let booking = self
                    .bookings
                    .find_by_id(request.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", request.id)))?;

                self.settle_booking(&booking, &state).await?;

                let closing = format!(
                    "Your booking is now confirmed. We'll see you on {} at {}.",
                    booking.date.format("%Y/%m/%d"),
                    booking.start_time.format("%H:%M")
                );
                let number = booking.invoice.as_ref().map(|i| i.invoice_number.as_str());
                (
                    booking.customer.email.clone(),
                    receipt_subject(number),
                    receipt_text(booking.customer.display_name(), number, &state, &closing),
                )
            }
            InvoiceKind::Contract => {
                let contract = self
                    .contracts
                    .find_by_id(request.id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Contract {} not found", request.id))
                    })?;

                self.settle_contract(contract.id, &state).await?;

                let closing = format!(
                    "Your contract is now active. You have {} washes available.",
                    contract.remaining_washes()
                );
                let number = contract.invoice.as_ref().map(|i| i.invoice_number.as_str());
                (
                    contract.customer.email.clone(),
                    receipt_subject(number),
                    receipt_text(contract.customer.display_name(), number, &state, &closing),
                )
            }
        };

        info!(
            "{} {} marked paid ({} {})",
            request.kind, request.id, request.method, request.paid_amount
        );

        let receipt = self.notifications.email(&email, &subject, &body).await;

        Ok(PaymentConfirmation {
            kind: request.kind,
            id: request.id,
            payment: state,
            receipt,
        })
    }
}

fn receipt_subject(invoice_number: Option<&str>) -> String {
    match invoice_number {
        Some(number) => format!("Payment Confirmed - {}", number),
        None => "Payment Confirmed".to_string(),
    }
}

fn receipt_text(
    name: &str,
    invoice_number: Option<&str>,
    state: &PaymentState,
    closing: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dear {},", name);
    let _ = writeln!(out);
    let _ = writeln!(out, "Thank you for your payment!");
    let _ = writeln!(out);
    let _ = writeln!(out, "Payment Details:");
    if let Some(number) = invoice_number {
        let _ = writeln!(out, "- Invoice Number: {}", number);
    }
    if let Some(amount) = state.paid_amount {
        let _ = writeln!(out, "- Amount Paid: R{:.2}", amount);
    }
    if let Some(method) = &state.method {
        let _ = writeln!(out, "- Payment Method: {}", method);
    }
    if let Some(paid_at) = state.paid_at {
        let _ = writeln!(out, "- Payment Date: {}", paid_at.format("%Y/%m/%d"));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", closing);
    let _ = writeln!(out);
    let _ = write!(out, "Thank you for choosing K2025 Mobile Carwash!");
    out
}
