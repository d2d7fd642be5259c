//! Payment DTOs

use carwash_core::models::{InvoiceKind, PaymentIntent};
use carwash_services::{IntentRequest, ManualPayment};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Card payment request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IntentCreateRequest {
    /// Amount in currency units, e.g. 287.50
    pub amount: Decimal,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,

    #[validate(email)]
    pub customer_email: Option<String>,
}

impl From<IntentCreateRequest> for IntentRequest {
    fn from(req: IntentCreateRequest) -> Self {
        Self {
            amount: req.amount,
            booking_id: req.booking_id,
            contract_id: req.contract_id,
            customer_email: req.customer_email,
        }
    }
}

/// Values the browser needs to complete a card payment
#[derive(Debug, Clone, Serialize)]
pub struct IntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
}

impl From<PaymentIntent> for IntentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
        }
    }
}

/// Manual (EFT or cash) payment confirmation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentConfirmRequest {
    #[serde(rename = "type")]
    pub kind: InvoiceKind,
    pub id: Uuid,

    #[validate(length(min = 1, max = 50, message = "Payment method is required"))]
    pub method: String,

    pub paid_amount: Decimal,

    #[validate(length(max = 500))]
    pub admin_notes: Option<String>,
}

impl From<PaymentConfirmRequest> for ManualPayment {
    fn from(req: PaymentConfirmRequest) -> Self {
        Self {
            kind: req.kind,
            id: req.id,
            method: req.method,
            paid_amount: req.paid_amount,
            admin_notes: req.admin_notes,
        }
    }
}

/// Webhook acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
