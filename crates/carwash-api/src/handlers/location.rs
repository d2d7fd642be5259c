//! Address quote handlers

use crate::dto::{ApiResponse, QuoteRequest};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{instrument, warn};
use validator::Validate;

/// Distance and travel surcharge for a service address
///
/// POST /api/v1/locations/quote
#[instrument(skip(data))]
pub async fn quote_location(
    data: web::Data<AppState>,
    req: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Quote validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let quote = data.locations.quote_address(&req.address).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(quote)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/locations").route("/quote", web::post().to(quote_location)));
}
