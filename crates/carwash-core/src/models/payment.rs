//! Payment models
//!
//! `PaymentState` is the payment side of a booking or contract; `Payment`
//! is one gateway transaction recorded against either of them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting payment
    #[default]
    Pending,
    /// Funds received
    Paid,
    /// Gateway reported a failed charge
    Failed,
    /// Payment returned to the customer
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl PaymentStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "paid" | "completed" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Payment side of a booking or contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentState {
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub paid_amount: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

impl PaymentState {
    /// State after funds were received
    pub fn paid(
        method: impl Into<String>,
        amount: Decimal,
        paid_at: DateTime<Utc>,
        admin_notes: Option<String>,
    ) -> Self {
        Self {
            status: PaymentStatus::Paid,
            method: Some(method.into()),
            paid_amount: Some(amount),
            paid_at: Some(paid_at),
            admin_notes,
        }
    }
}

/// Gateway transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub method: String,

    /// Gateway-side identifier (e.g. a Stripe payment intent id)
    pub transaction_id: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to record a new gateway transaction
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub transaction_id: String,
}

impl NewPayment {
    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            booking_id: self.booking_id,
            contract_id: self.contract_id,
            amount: self.amount,
            currency: self.currency,
            status: PaymentStatus::Pending,
            method: self.method,
            transaction_id: self.transaction_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Charge request handed to the payment gateway
#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Amount in minor currency units (cents)
    pub amount_minor: i64,

    /// Lowercase ISO 4217 code
    pub currency: String,

    pub receipt_email: Option<String>,

    /// Correlation data echoed back by the gateway webhook
    pub metadata: HashMap<String, String>,
}

/// Gateway answer to a charge request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Server-side payment identifier
    pub id: String,

    /// Token the browser uses to confirm the payment
    pub client_secret: String,
}

/// Outcome delivered by a gateway webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcomeKind {
    Succeeded,
    Failed,
}

/// Asynchronous payment result keyed by the gateway identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub transaction_id: String,
    pub kind: PaymentOutcomeKind,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
}
