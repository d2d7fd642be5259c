//! Booking DTOs

use carwash_core::{
    models::{BookingChanges, BookingFilter, BookingStatus, VehicleType},
    AppError, AppResult,
};
use carwash_services::BookingRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Booking creation request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookingCreateRequest {
    #[validate(length(max = 100))]
    pub customer_name: Option<String>,

    #[validate(email(message = "A valid e-mail address is required"))]
    pub customer_email: String,

    #[validate(length(min = 7, max = 20))]
    pub customer_phone: Option<String>,

    pub date: NaiveDate,

    /// Start time as "HH:MM"
    #[validate(length(min = 4, max = 5, message = "Start time must be HH:MM"))]
    pub start_time: String,

    /// Service address
    #[validate(length(min = 1, max = 300, message = "Location is required"))]
    pub location: String,

    pub vehicle_type: VehicleType,

    #[serde(default = "default_number_of_cars")]
    #[validate(range(min = 1, max = 20))]
    pub number_of_cars: u32,

    #[validate(length(min = 1, message = "At least one service is required"))]
    pub service_ids: Vec<Uuid>,

    /// Distance from the base from an earlier address quote
    #[validate(range(min = 0.0, max = 1000.0))]
    pub distance_km: Option<f64>,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn default_number_of_cars() -> u32 {
    1
}

impl From<BookingCreateRequest> for BookingRequest {
    fn from(req: BookingCreateRequest) -> Self {
        Self {
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            date: req.date,
            start_time: req.start_time,
            location: req.location,
            vehicle_type: req.vehicle_type,
            number_of_cars: req.number_of_cars,
            service_ids: req.service_ids,
            distance_km: req.distance_km,
            notes: req.notes,
        }
    }
}

/// Admin booking listing filters
///
/// `status=all` or an empty value lists every status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListParams {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl BookingListParams {
    pub fn to_filter(&self) -> AppResult<BookingFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(parse_status(s)?),
        };
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(BookingFilter { status, search })
    }
}

/// Admin booking update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BookingUpdateRequest {
    /// "pending", "confirmed", "completed" or "cancelled"
    pub status: Option<String>,

    #[validate(length(min = 1, max = 300, message = "Location must not be empty"))]
    pub location: Option<String>,

    /// Empty string clears the notes
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl BookingUpdateRequest {
    pub fn into_changes(self) -> AppResult<BookingChanges> {
        Ok(BookingChanges {
            status: self.status.as_deref().map(parse_status).transpose()?,
            location: self.location,
            notes: self.notes,
        })
    }
}

fn parse_status(value: &str) -> AppResult<BookingStatus> {
    BookingStatus::from_str(value.trim())
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown booking status: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> serde_json::Value {
        json!({
            "customer_name": "Sipho Dlamini",
            "customer_email": "sipho@example.com",
            "date": "2025-06-02",
            "start_time": "09:00",
            "location": "12 Main Road, Danoon",
            "vehicle_type": "suv",
            "service_ids": ["6f1c2a4e-0b1d-4c59-9a53-1e0f5a7d2c01"]
        })
    }

    #[test]
    fn test_defaults_to_one_car() {
        let req: BookingCreateRequest = serde_json::from_value(request()).unwrap();
        assert_eq!(req.number_of_cars, 1);
        assert_eq!(req.vehicle_type, VehicleType::Suv);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut body = request();
        body["customer_email"] = json!("not-an-email");
        let req: BookingCreateRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());

        let mut body = request();
        body["service_ids"] = json!([]);
        body["number_of_cars"] = json!(0);
        let req: BookingCreateRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("service_ids"));
        assert!(fields.contains_key("number_of_cars"));
    }

    #[test]
    fn test_distance_is_bounded() {
        let mut body = request();
        body["distance_km"] = json!(5e27);
        let req: BookingCreateRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().unwrap_err().field_errors().contains_key("distance_km"));

        let mut body = request();
        body["distance_km"] = json!(42.5);
        let req: BookingCreateRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_params_to_filter() {
        let params = BookingListParams {
            status: Some("Cancelled".to_string()),
            search: Some("  danoon ".to_string()),
        };
        let filter = params.to_filter().unwrap();
        assert_eq!(filter.status, Some(BookingStatus::Cancelled));
        assert_eq!(filter.search.as_deref(), Some("danoon"));

        let all = BookingListParams {
            status: Some("all".to_string()),
            search: Some("   ".to_string()),
        };
        assert_eq!(all.to_filter().unwrap(), BookingFilter::default());

        let bad = BookingListParams {
            status: Some("archived".to_string()),
            search: None,
        };
        assert!(matches!(bad.to_filter(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_update_request() {
        let req: BookingUpdateRequest =
            serde_json::from_value(json!({ "status": "completed", "notes": "" })).unwrap();
        assert!(req.validate().is_ok());
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.status, Some(BookingStatus::Completed));
        assert_eq!(changes.notes.as_deref(), Some(""));
        assert!(changes.location.is_none());

        let req: BookingUpdateRequest = serde_json::from_value(json!({ "location": "" })).unwrap();
        assert!(req.validate().is_err());

        let req: BookingUpdateRequest = serde_json::from_value(json!({ "status": "lost" })).unwrap();
        assert!(req.into_changes().is_err());
    }
}
