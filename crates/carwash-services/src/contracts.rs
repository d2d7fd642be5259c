//! Prepaid package sales

use carwash_core::{
    models::{Contract, ContractPackage, NewContract},
    traits::ContractRepository,
    AppError, AppResult,
};
use chrono::{Months, NaiveDate, Utc};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::notifications::NotificationService;

/// Package purchase request
#[derive(Debug, Clone, Deserialize)]
pub struct ContractRequest {
    /// Package slug (e.g. "10-wash-premium")
    pub package: String,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,

    /// Defaults to today
    pub start_date: Option<NaiveDate>,
}

/// Contract service
pub struct ContractService {
    contracts: Arc<dyn ContractRepository>,
    notifications: Arc<NotificationService>,
}

impl ContractService {
    /// Create a new contract service
    pub fn new(
        contracts: Arc<dyn ContractRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            contracts,
            notifications,
        }
    }

    /// Packages on sale
    pub fn packages(&self) -> Vec<ContractPackage> {
        ContractPackage::catalog()
    }

    /// Sell a package; the contract stays pending until paid
    #[instrument(skip(self, request), fields(package = %request.package))]
    pub async fn purchase(&self, request: ContractRequest) -> AppResult<Contract> {
        let package = ContractPackage::find(&request.package)
            .ok_or_else(|| AppError::NotFound(format!("Package {} not found", request.package)))?;

        let start_date = request
            .start_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let end_date = start_date
            .checked_add_months(Months::new(package.validity_months))
            .ok_or_else(|| {
                AppError::InvalidInput(format!("start date {} is out of range", start_date))
            })?;

        let contract = self
            .contracts
            .create(NewContract {
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                customer_phone: request.customer_phone,
                contract_type: package.name.clone(),
                total_washes: package.washes,
                total_price: package.price,
                start_date,
                end_date,
            })
            .await?;

        info!(
            "Contract {} ({}) created for {}",
            contract.id, contract.contract_type, contract.customer.email
        );

        let mut body = String::new();
        let _ = writeln!(body, "Dear {},", contract.customer.display_name());
        let _ = writeln!(body);
        let _ = writeln!(
            body,
            "Thank you for choosing the {} package ({} washes).",
            contract.contract_type, contract.total_washes
        );
        let _ = writeln!(
            body,
            "Valid from {} to {}.",
            contract.start_date.format("%Y/%m/%d"),
            contract.end_date.format("%Y/%m/%d")
        );
        let _ = writeln!(body, "Amount: R{:.2}", contract.total_price);
        let _ = writeln!(body);
        let _ = write!(
            body,
            "Your contract becomes active once payment has been received."
        );

        let report = self
            .notifications
            .email(
                &contract.customer.email,
                "Contract - K2025 Mobile Carwash",
                &body,
            )
            .await;
        if !report.success {
            warn!("Contract e-mail for {} not delivered", contract.id);
        }

        Ok(contract)
    }

    /// Find a contract
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Contract> {
        self.contracts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))
    }
}
