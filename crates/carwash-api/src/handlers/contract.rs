//! Contract handlers

use crate::dto::{ApiResponse, ContractCreateRequest};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Packages on sale
///
/// GET /api/v1/contracts/packages
pub async fn list_packages(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data.contracts.packages()))
}

/// Buy a package
///
/// POST /api/v1/contracts
#[instrument(skip(data, req))]
pub async fn create_contract(
    data: web::Data<AppState>,
    req: web::Json<ContractCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Contract validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let contract = data.contracts.purchase(req.into_inner().into()).await?;

    info!(id = %contract.id, package = %contract.contract_type, "Contract created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        contract,
        "Contract created, awaiting payment",
    )))
}

/// GET /api/v1/contracts/{id}
#[instrument(skip(data))]
pub async fn get_contract(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let contract = data.contracts.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(contract)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contracts")
            .route("", web::post().to(create_contract))
            .route("/packages", web::get().to(list_packages))
            .route("/{id}", web::get().to(get_contract)),
    );
}
