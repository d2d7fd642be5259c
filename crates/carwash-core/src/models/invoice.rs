//! Invoice models
//!
//! An invoice is generated fresh on every request and never amended: a
//! second request for the same booking yields a new number and expiry.

use super::customer::CustomerContact;
use super::payment::PaymentStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use uuid::Uuid;

/// What an invoice bills for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// A single scheduled appointment
    Booking,
    /// A prepaid multi-wash package
    Contract,
}

impl fmt::Display for InvoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceKind::Booking => write!(f, "booking"),
            InvoiceKind::Contract => write!(f, "contract"),
        }
    }
}

impl InvoiceKind {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "booking" => Some(InvoiceKind::Booking),
            "contract" => Some(InvoiceKind::Contract),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            InvoiceKind::Booking => "Service Booking",
            InvoiceKind::Contract => "Contract Package",
        }
    }
}

/// Single billed line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_rate: Decimal,
    /// Always `quantity * unit_rate`
    pub line_total: Decimal,
}

impl InvoiceLineItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_rate: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_rate,
            line_total: Decimal::from(quantity) * unit_rate,
        }
    }
}

/// Bank-transfer instructions printed on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub reference: String,
}

/// Generated demand for payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub invoice_number: String,
    pub kind: InvoiceKind,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub customer: CustomerContact,
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub payment_reference: String,
    pub payment: PaymentInstructions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<Uuid>,
}

impl Invoice {
    /// Metadata recorded on the billed booking or contract
    pub fn metadata(&self) -> InvoiceMetadata {
        InvoiceMetadata {
            invoice_number: self.invoice_number.clone(),
            sent_at: self.issued_at,
            expires_at: self.due_at,
        }
    }

    /// Email subject line
    pub fn subject(&self) -> String {
        format!("Invoice {} - K2025 Mobile Carwash", self.invoice_number)
    }

    /// Plain-text rendering used for the email body
    pub fn summary_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dear {},", self.customer.name);
        let _ = writeln!(out);
        let _ = writeln!(out, "Invoice Number: {}", self.invoice_number);
        let _ = writeln!(out, "Type: {}", self.kind.title());
        let _ = writeln!(out, "Issue Date: {}", self.issued_at.format("%Y/%m/%d %H:%M"));
        let _ = writeln!(out, "Due Date: {}", self.due_at.format("%Y/%m/%d %H:%M"));
        let _ = writeln!(out);
        for item in &self.line_items {
            let _ = writeln!(
                out,
                "{} x{} @ {} {:.2} = {} {:.2}",
                item.description, item.quantity, self.currency, item.unit_rate, self.currency,
                item.line_total
            );
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Subtotal: {} {:.2}", self.currency, self.subtotal);
        let _ = writeln!(
            out,
            "Tax ({}% VAT): {} {:.2}",
            (self.tax_rate * Decimal::ONE_HUNDRED).normalize(),
            self.currency,
            self.tax_amount
        );
        let _ = writeln!(out, "Total Amount Due: {} {:.2}", self.currency, self.total);
        let _ = writeln!(out);
        let _ = writeln!(out, "Bank: {}", self.payment.bank_name);
        let _ = writeln!(out, "Account Name: {}", self.payment.account_name);
        let _ = writeln!(out, "Account Number: {}", self.payment.account_number);
        let _ = writeln!(out, "Reference: {}", self.payment.reference);
        let _ = writeln!(out);
        let _ = write!(
            out,
            "Please use the invoice number as your payment reference. \
             This invoice expires on {}.",
            self.due_at.format("%Y/%m/%d %H:%M")
        );
        out
    }
}

/// Invoice details stored on the billed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    pub invoice_number: String,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl InvoiceMetadata {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Filter for listing invoiced bookings and contracts
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub payment_status: Option<PaymentStatus>,

    /// Only invoices whose expiry lies within `[from, to]`
    pub expires_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl InvoiceFilter {
    /// Whether a record with this payment status and invoice matches
    pub fn matches(&self, status: PaymentStatus, invoice: Option<&InvoiceMetadata>) -> bool {
        let Some(invoice) = invoice else {
            return false;
        };

        if self.payment_status.is_some_and(|s| s != status) {
            return false;
        }

        match self.expires_between {
            Some((from, to)) => invoice.expires_at >= from && invoice.expires_at <= to,
            None => true,
        }
    }
}
