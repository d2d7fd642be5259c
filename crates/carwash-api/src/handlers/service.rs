//! Service catalog handlers

use crate::dto::ApiResponse;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::instrument;

/// All wash services, cheapest first
///
/// GET /api/v1/services
#[instrument(skip(data))]
pub async fn list_services(data: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let services = data.catalog.list().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(services)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/services", web::get().to(list_services));
}
