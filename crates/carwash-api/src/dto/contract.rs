//! Contract DTOs

use carwash_services::ContractRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contract purchase request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContractCreateRequest {
    /// Package slug, e.g. "10-wash-basic"
    #[validate(length(min = 1, max = 50, message = "Package is required"))]
    pub package: String,

    #[validate(length(max = 100))]
    pub customer_name: Option<String>,

    #[validate(email(message = "A valid e-mail address is required"))]
    pub customer_email: String,

    #[validate(length(min = 7, max = 20))]
    pub customer_phone: Option<String>,

    /// Defaults to today
    pub start_date: Option<NaiveDate>,
}

impl From<ContractCreateRequest> for ContractRequest {
    fn from(req: ContractCreateRequest) -> Self {
        Self {
            package: req.package,
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            start_date: req.start_date,
        }
    }
}
