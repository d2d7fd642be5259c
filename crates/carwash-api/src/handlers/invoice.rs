//! Invoice handlers

use crate::dto::{ApiResponse, InvoiceCreateRequest, InvoiceListParams};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use carwash_core::AppError;
use tracing::{debug, info, instrument, warn};

/// Issue an invoice for a booking or contract
///
/// POST /api/v1/invoices
#[instrument(skip(data))]
pub async fn create_invoice(
    data: web::Data<AppState>,
    req: web::Json<InvoiceCreateRequest>,
) -> Result<HttpResponse, AppError> {
    let issued = data.invoices.issue(req.into_inner().into()).await?;

    info!(
        invoice = %issued.invoice.invoice_number,
        total = %issued.invoice.total,
        emailed = issued.email.success,
        "Invoice issued"
    );

    let message = if issued.email.success {
        "Invoice issued and e-mailed"
    } else {
        warn!("Invoice {} was not e-mailed", issued.invoice.invoice_number);
        "Invoice issued, e-mail delivery failed"
    };

    Ok(HttpResponse::Created().json(ApiResponse::with_message(issued, message)))
}

/// Invoiced bookings and contracts
///
/// GET /api/v1/invoices?status=pending&type=booking&expiring=6h
#[instrument(skip(data))]
pub async fn list_invoices(
    data: web::Data<AppState>,
    query: web::Query<InvoiceListParams>,
) -> Result<HttpResponse, AppError> {
    let overview = data.invoices.overview(query.to_query()?).await?;

    debug!(
        bookings = overview.bookings.len(),
        contracts = overview.contracts.len(),
        "Invoices listed"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success(overview)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .route("", web::post().to(create_invoice))
            .route("", web::get().to(list_invoices)),
    );
}
