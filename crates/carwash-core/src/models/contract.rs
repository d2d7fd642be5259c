//! Contract (prepaid wash package) model

use super::customer::Customer;
use super::invoice::InvoiceMetadata;
use super::payment::PaymentState;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Contract status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    /// Sold, awaiting payment
    #[default]
    Pending,
    /// Paid; washes may be booked against it
    Active,
    /// Past its end date
    Expired,
    Cancelled,
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractStatus::Pending => write!(f, "pending"),
            ContractStatus::Active => write!(f, "active"),
            ContractStatus::Expired => write!(f, "expired"),
            ContractStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl ContractStatus {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ContractStatus::Pending),
            "active" => Some(ContractStatus::Active),
            "expired" => Some(ContractStatus::Expired),
            "cancelled" => Some(ContractStatus::Cancelled),
            _ => None,
        }
    }
}

/// Prepaid multi-wash package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub customer: Customer,

    /// Package name (e.g. "10 Wash Premium")
    pub contract_type: String,

    pub total_washes: u32,
    pub used_washes: u32,
    pub total_price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ContractStatus,
    pub invoice: Option<InvoiceMetadata>,
    pub payment: PaymentState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Washes still available on the package
    pub fn remaining_washes(&self) -> u32 {
        self.total_washes.saturating_sub(self.used_washes)
    }
}

/// Prepaid package on sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPackage {
    pub slug: String,

    /// Name stored as the contract type (e.g. "10 Wash Premium")
    pub name: String,

    pub description: String,
    pub washes: u32,
    pub price: Decimal,
    pub validity_months: u32,
}

impl ContractPackage {
    fn new(
        slug: &str,
        name: &str,
        description: &str,
        washes: u32,
        price: Decimal,
        validity_months: u32,
    ) -> Self {
        Self {
            slug: slug.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            washes,
            price,
            validity_months,
        }
    }

    /// Packages currently on sale
    pub fn catalog() -> Vec<ContractPackage> {
        vec![
            Self::new(
                "10-wash-basic",
                "10 Wash Basic",
                "Perfect for regular car maintenance",
                10,
                Decimal::new(2392, 0),
                12,
            ),
            Self::new(
                "10-wash-premium",
                "10 Wash Premium",
                "Complete care inside and out",
                10,
                Decimal::new(3992, 0),
                12,
            ),
            Self::new(
                "20-wash-ultimate",
                "20 Wash Ultimate",
                "Best value for frequent users",
                20,
                Decimal::new(7184, 0),
                18,
            ),
        ]
    }

    pub fn find(slug: &str) -> Option<ContractPackage> {
        Self::catalog().into_iter().find(|p| p.slug == slug)
    }
}

/// Data needed to persist a new contract
#[derive(Debug, Clone)]
pub struct NewContract {
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub contract_type: String,
    pub total_washes: u32,
    pub total_price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewContract {
    /// Materialize into a stored, pending contract
    pub fn into_contract(self, customer: Customer, now: DateTime<Utc>) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            customer,
            contract_type: self.contract_type,
            total_washes: self.total_washes,
            used_washes: 0,
            total_price: self.total_price,
            start_date: self.start_date,
            end_date: self.end_date,
            status: ContractStatus::Pending,
            invoice: None,
            payment: PaymentState::default(),
            created_at: now,
            updated_at: now,
        }
    }
}
