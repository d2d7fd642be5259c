//! Availability handlers

use crate::dto::{ApiResponse, SlotQuery, SlotsResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Slot grid for a day
///
/// GET /api/v1/slots?date=2025-06-02&duration_minutes=60
#[instrument(skip(data))]
pub async fn list_slots(
    data: web::Data<AppState>,
    query: web::Query<SlotQuery>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Slot query validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let slots = data
        .availability
        .slots_for(query.date, query.duration_minutes)
        .await?;

    debug!(date = %query.date, count = slots.len(), "Slots generated");

    Ok(HttpResponse::Ok().json(ApiResponse::success(SlotsResponse::new(
        query.date,
        query.duration_minutes,
        slots,
    ))))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/slots", web::get().to(list_slots));
}
