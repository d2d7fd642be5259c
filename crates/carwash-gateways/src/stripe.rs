//! Stripe payment gateway
//!
//! Payment intents are created with the form-encoded REST API. Webhook
//! deliveries are authenticated with the `Stripe-Signature` header: an
//! HMAC-SHA256 over `"{t}.{payload}"` keyed with the endpoint secret, hex
//! encoded in one or more `v1=` entries.

use async_trait::async_trait;
use carwash_core::{
    models::{PaymentIntent, PaymentIntentRequest, PaymentOutcome, PaymentOutcomeKind},
    traits::PaymentGateway,
    AppError, AppResult,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::constants::WEBHOOK_TOLERANCE_SECS;
use crate::events::{PAYMENT_FAILED, PAYMENT_SUCCEEDED};
use crate::{http_client, transport_error};

type HmacSha256 = Hmac<Sha256>;

/// Stripe REST client
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
    webhook_secret: Option<String>,
}

impl StripeGateway {
    /// Create a gateway
    ///
    /// Webhooks are rejected with `UpstreamUnavailable` while no
    /// `webhook_secret` is configured.
    pub fn new(api_base: &str, secret_key: &str, webhook_secret: Option<String>) -> AppResult<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            webhook_secret,
        })
    }

    /// Form fields for a payment intent
    fn intent_form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.clone()),
        ];
        if let Some(email) = &request.receipt_email {
            form.push(("receipt_email".to_string(), email.clone()));
        }

        let mut keys: Vec<&String> = request.metadata.keys().collect();
        keys.sort();
        for key in keys {
            form.push((format!("metadata[{}]", key), request.metadata[key].clone()));
        }
        form
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Config(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a `Stripe-Signature` header against the payload
///
/// `now` is the current unix time in seconds.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::InvalidSignature("missing timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(AppError::InvalidSignature("missing v1 signature".to_string()));
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(AppError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    let matched = candidates
        .iter()
        .any(|c| bool::from(expected.as_bytes().ct_eq(c.as_bytes())));
    if !matched {
        return Err(AppError::InvalidSignature("signature mismatch".to_string()));
    }
    Ok(())
}

/// Payment outcome carried by an event, if any
fn outcome_from_event(event: StripeEvent) -> Option<PaymentOutcome> {
    let kind = match event.event_type.as_str() {
        PAYMENT_SUCCEEDED => PaymentOutcomeKind::Succeeded,
        PAYMENT_FAILED => PaymentOutcomeKind::Failed,
        other => {
            debug!("Ignoring Stripe event {}", other);
            return None;
        }
    };

    let object = event.data.object;
    let id_from = |key: &str| {
        object
            .metadata
            .get(key)
            .filter(|v| !v.is_empty())
            .and_then(|v| Uuid::parse_str(v).ok())
    };

    Some(PaymentOutcome {
        booking_id: id_from("bookingId"),
        contract_id: id_from("contractId"),
        transaction_id: object.id,
        kind,
    })
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(amount = request.amount_minor))]
    async fn create_intent(&self, request: PaymentIntentRequest) -> AppResult<PaymentIntent> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::intent_form(&request))
            .send()
            .await
            .map_err(|e| transport_error("stripe", e))?;

        let status = response.status();
        if !status.is_success() {
            let body: StripeErrorBody = response.json().await.unwrap_or_default();
            let message = body.error.message.unwrap_or_default();
            error!("Stripe rejected payment intent: status={} {}", status, message);
            return Err(AppError::Upstream(format!(
                "stripe returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("unreadable stripe response: {}", e)))?;

        info!("Created payment intent {}", intent.id);
        Ok(intent)
    }

    fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> AppResult<Option<PaymentOutcome>> {
        let secret = self.webhook_secret.as_deref().ok_or_else(|| {
            AppError::UpstreamUnavailable("webhook secret is not configured".to_string())
        })?;

        if let Err(e) = verify_signature(
            payload,
            signature_header,
            secret,
            Utc::now().timestamp(),
            WEBHOOK_TOLERANCE_SECS,
        ) {
            warn!("Rejected webhook: {}", e);
            return Err(e);
        }

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(outcome_from_event(event))
    }
}

/// Stand-in used when no secret key is configured
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_intent(&self, _request: PaymentIntentRequest) -> AppResult<PaymentIntent> {
        Err(AppError::UpstreamUnavailable(
            "card payments are not configured".to_string(),
        ))
    }

    fn parse_webhook(
        &self,
        _payload: &[u8],
        _signature_header: &str,
    ) -> AppResult<Option<PaymentOutcome>> {
        Err(AppError::UpstreamUnavailable(
            "card payments are not configured".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeObject,
}

#[derive(Debug, Deserialize)]
struct StripeObject {
    id: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    error: StripeErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}
