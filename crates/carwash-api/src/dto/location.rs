//! Address quote DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Travel surcharge quote request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(length(min = 1, max = 300, message = "Address is required"))]
    pub address: String,
}
