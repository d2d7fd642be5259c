//! Invoice DTOs

use carwash_core::{
    models::{InvoiceKind, PaymentStatus},
    AppError, AppResult,
};
use carwash_services::{InvoiceQuery, InvoiceRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice issue request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceCreateRequest {
    /// "booking" or "contract"; inferred from the id when omitted
    #[serde(rename = "type")]
    pub kind: Option<InvoiceKind>,
    pub booking_id: Option<Uuid>,
    pub contract_id: Option<Uuid>,
}

impl From<InvoiceCreateRequest> for InvoiceRequest {
    fn from(req: InvoiceCreateRequest) -> Self {
        Self {
            kind: req.kind,
            booking_id: req.booking_id,
            contract_id: req.contract_id,
        }
    }
}

/// Invoice listing filters
///
/// All values arrive as strings: `status=pending`, `type=contract`,
/// `expiring=6h`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceListParams {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub expiring: Option<String>,
}

impl InvoiceListParams {
    /// Parse into a service query
    pub fn to_query(&self) -> AppResult<InvoiceQuery> {
        let payment_status = match non_empty(&self.status) {
            Some(s) => Some(PaymentStatus::from_str(s).ok_or_else(|| {
                AppError::InvalidInput(format!("Unknown payment status: {}", s))
            })?),
            None => None,
        };

        let kind = match non_empty(&self.kind) {
            Some(s) => Some(
                InvoiceKind::from_str(s)
                    .ok_or_else(|| AppError::InvalidInput(format!("Unknown invoice type: {}", s)))?,
            ),
            None => None,
        };

        let expiring_within_hours = non_empty(&self.expiring).map(parse_hours).transpose()?;

        Ok(InvoiceQuery {
            payment_status,
            kind,
            expiring_within_hours,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Widest accepted expiry window: one year
const MAX_EXPIRING_HOURS: i64 = 8760;

/// "6h" or "6" to 6
fn parse_hours(value: &str) -> AppResult<i64> {
    let digits = value.strip_suffix('h').unwrap_or(value);
    match digits.parse::<i64>() {
        Ok(hours) if (1..=MAX_EXPIRING_HOURS).contains(&hours) => Ok(hours),
        _ => Err(AppError::InvalidInput(format!(
            "expiring must be between 1 and {} hours, got {}",
            MAX_EXPIRING_HOURS, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(status: &str, kind: &str, expiring: &str) -> InvoiceListParams {
        let opt = |v: &str| (!v.is_empty()).then(|| v.to_string());
        InvoiceListParams {
            status: opt(status),
            kind: opt(kind),
            expiring: opt(expiring),
        }
    }

    #[test]
    fn test_to_query() {
        let query = params("PENDING", "Contract", "12h").to_query().unwrap();
        assert_eq!(query.payment_status, Some(PaymentStatus::Pending));
        assert_eq!(query.kind, Some(InvoiceKind::Contract));
        assert_eq!(query.expiring_within_hours, Some(12));

        let query = params("", "", "").to_query().unwrap();
        assert!(query.payment_status.is_none());
        assert!(query.kind.is_none());
        assert!(query.expiring_within_hours.is_none());
    }

    #[test]
    fn test_rejects_bad_filters() {
        assert!(params("overdue", "", "").to_query().is_err());
        assert!(params("", "quote", "").to_query().is_err());
        assert!(params("", "", "soon").to_query().is_err());
        assert!(params("", "", "0h").to_query().is_err());
        assert_eq!(parse_hours("24").unwrap(), 24);
    }

    #[test]
    fn test_expiring_window_is_capped() {
        assert_eq!(parse_hours("8760h").unwrap(), 8760);
        assert!(parse_hours("8761h").is_err());
        assert!(params("", "", "99999999999h").to_query().is_err());
    }

    #[test]
    fn test_create_request_type_field() {
        let req: InvoiceCreateRequest = serde_json::from_str(
            r#"{"type":"booking","booking_id":"6f1c2a4e-0b1d-4c59-9a53-1e0f5a7d2c01"}"#,
        )
        .unwrap();
        assert_eq!(req.kind, Some(InvoiceKind::Booking));
        assert!(req.contract_id.is_none());
    }
}
