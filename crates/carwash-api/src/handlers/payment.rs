//! Payment handlers

use crate::dto::{ApiResponse, IntentCreateRequest, IntentResponse, PaymentConfirmRequest, WebhookAck};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use carwash_core::AppError;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Header carrying the gateway's webhook signature
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Open a card payment
///
/// POST /api/v1/payments/intent
#[instrument(skip(data, req))]
pub async fn create_intent(
    data: web::Data<AppState>,
    req: web::Json<IntentCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment intent validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let intent = data.payments.create_intent(req.into_inner().into()).await?;
    info!(intent = %intent.id, "Payment intent created");

    Ok(HttpResponse::Created().json(ApiResponse::success(IntentResponse::from(intent))))
}

/// Gateway webhook
///
/// The signature covers the raw body, so the payload is read as bytes.
///
/// POST /api/v1/payments/webhook
#[instrument(skip(data, req, body))]
pub async fn webhook(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("Webhook without {} header", SIGNATURE_HEADER);
            AppError::InvalidSignature(format!("missing {} header", SIGNATURE_HEADER))
        })?;

    match data.payments.handle_webhook(&body, signature).await? {
        Some(outcome) => info!(
            transaction = %outcome.transaction_id,
            kind = ?outcome.kind,
            "Webhook applied"
        ),
        None => debug!("Webhook ignored"),
    }

    Ok(HttpResponse::Ok().json(WebhookAck { received: true }))
}

/// Record an EFT or cash payment
///
/// POST /api/v1/payments/confirm
#[instrument(skip(data, req))]
pub async fn confirm_payment(
    data: web::Data<AppState>,
    req: web::Json<PaymentConfirmRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment confirmation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let confirmation = data.payments.confirm_manual(req.into_inner().into()).await?;

    info!(
        kind = %confirmation.kind,
        id = %confirmation.id,
        "Payment confirmed manually"
    );

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        confirmation,
        "Payment confirmed successfully",
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .route("/intent", web::post().to(create_intent))
            .route("/webhook", web::post().to(webhook))
            .route("/confirm", web::post().to(confirm_payment)),
    );
}
