//! Notification handlers

use crate::dto::{ApiResponse, NotificationRequest};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Send a message over the requested channels
///
/// Always answers 200 with a per-channel report; delivery failures are in
/// the report, not the status code.
///
/// POST /api/v1/notifications
#[instrument(skip(data, req))]
pub async fn send_notification(
    data: web::Data<AppState>,
    req: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Notification validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let report = data
        .notifications
        .dispatch(&req.channels, &req.recipient(), &req.subject, &req.message)
        .await;

    info!(delivered = report.any_delivered(), "Notification dispatched");

    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/notifications", web::post().to(send_notification));
}
