//! External provider clients for the K2025 mobile carwash
//!
//! This crate implements the collaborator traits from carwash-core against
//! the real providers over HTTP:
//!
//! - `GoogleGeocoder` - address to coordinates (Google Geocoding API)
//! - `StripeGateway` - payment intents and signed webhooks (Stripe)
//! - `WhatsAppChannel` - text messages (WhatsApp Cloud API)
//! - `HttpEmailChannel` - e-mail through an HTTP mail relay
//!
//! A provider without credentials is replaced by an explicit unconfigured
//! implementation (or, for notification channels, simply not registered), so
//! the service starts without any provider keys.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use carwash_core::AppConfig;
//! use carwash_gateways::{build_channels, build_geocoder, build_payment_gateway};
//!
//! let config = AppConfig::load()?;
//! let geocoder = build_geocoder(&config.geocoding)?;
//! let gateway = build_payment_gateway(&config.payments)?;
//! let channels = build_channels(&config.notifications)?;
//! ```

pub mod email;
pub mod geocoding;
pub mod stripe;
pub mod whatsapp;

pub use email::HttpEmailChannel;
pub use geocoding::{GoogleGeocoder, UnconfiguredGeocoder};
pub use stripe::{StripeGateway, UnconfiguredGateway};
pub use whatsapp::WhatsAppChannel;

use carwash_core::{
    config::{GeocodingConfig, NotificationsConfig, PaymentsConfig},
    traits::{Geocoder, NotificationChannel, PaymentGateway},
    AppError, AppResult,
};
use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Provider constants
pub mod constants {
    /// Request timeout for provider calls in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 15;

    /// Idle pooled connections kept per provider host
    pub const POOL_MAX_IDLE_PER_HOST: usize = 8;

    /// Accepted clock skew for signed webhooks in seconds
    pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

    /// Stripe signature header name
    pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
}

/// Stripe webhook event types we act on
pub mod events {
    /// Charge completed
    pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

    /// Charge declined or errored
    pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";
}

/// HTTP client shared by the provider clients
pub(crate) fn http_client() -> AppResult<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(constants::REQUEST_TIMEOUT_SECS))
        .pool_max_idle_per_host(constants::POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport failure to the error the services expect
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::UpstreamUnavailable(format!("{} timed out", provider))
    } else {
        AppError::UpstreamUnavailable(format!("{} unreachable: {}", provider, err))
    }
}

/// Geocoder for the configuration, unconfigured when no API key is set
pub fn build_geocoder(config: &GeocodingConfig) -> AppResult<Arc<dyn Geocoder>> {
    match config.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            info!("Geocoding enabled");
            Ok(Arc::new(GoogleGeocoder::new(&config.endpoint, key)?))
        }
        None => {
            warn!("No geocoding API key configured, address quotes are disabled");
            Ok(Arc::new(UnconfiguredGeocoder))
        }
    }
}

/// Payment gateway for the configuration, unconfigured without a secret key
pub fn build_payment_gateway(config: &PaymentsConfig) -> AppResult<Arc<dyn PaymentGateway>> {
    match config.stripe_secret_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => {
            if config.stripe_webhook_secret.is_none() {
                warn!("No Stripe webhook secret configured, webhooks will be rejected");
            }
            info!("Stripe payments enabled");
            Ok(Arc::new(StripeGateway::new(
                &config.api_base,
                key,
                config.stripe_webhook_secret.clone(),
            )?))
        }
        None => {
            warn!("No Stripe secret key configured, card payments are disabled");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

/// Notification channels with complete credentials
pub fn build_channels(config: &NotificationsConfig) -> AppResult<Vec<Arc<dyn NotificationChannel>>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    match config.email_endpoint.as_deref().filter(|e| !e.is_empty()) {
        Some(endpoint) => {
            channels.push(Arc::new(HttpEmailChannel::new(
                endpoint,
                config.email_api_key.clone(),
                &config.email_from,
            )?));
            info!("E-mail channel enabled");
        }
        None => warn!("No e-mail relay configured, e-mail notifications are disabled"),
    }

    match (
        config.whatsapp_token.as_deref().filter(|t| !t.is_empty()),
        config.whatsapp_phone_number_id.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(token), Some(phone_number_id)) => {
            channels.push(Arc::new(WhatsAppChannel::new(
                &config.whatsapp_api_base,
                phone_number_id,
                token,
            )?));
            info!("WhatsApp channel enabled");
        }
        _ => warn!("WhatsApp credentials not configured, WhatsApp notifications are disabled"),
    }

    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carwash_core::models::Channel;

    #[test]
    fn test_constants() {
        assert_eq!(constants::WEBHOOK_TOLERANCE_SECS, 300);
        assert_ne!(events::PAYMENT_SUCCEEDED, events::PAYMENT_FAILED);
    }

    #[test]
    fn test_build_channels_skips_incomplete_credentials() {
        let mut config = NotificationsConfig::default();
        assert!(build_channels(&config).unwrap().is_empty());

        config.whatsapp_token = Some("token".to_string());
        assert!(build_channels(&config).unwrap().is_empty());

        config.whatsapp_phone_number_id = Some("1234567890".to_string());
        config.email_endpoint = Some("https://mail.example.com/send".to_string());
        let channels = build_channels(&config).unwrap();
        let kinds: Vec<Channel> = channels.iter().map(|c| c.channel()).collect();
        assert_eq!(kinds, vec![Channel::Email, Channel::Whatsapp]);
    }

    #[tokio::test]
    async fn test_unconfigured_providers() {
        let geocoder = build_geocoder(&GeocodingConfig::default()).unwrap();
        assert!(matches!(
            geocoder.geocode("Danoon").await,
            Err(AppError::UpstreamUnavailable(_))
        ));

        let gateway = build_payment_gateway(&PaymentsConfig::default()).unwrap();
        assert!(matches!(
            gateway.parse_webhook(b"{}", "t=1,v1=00"),
            Err(AppError::UpstreamUnavailable(_))
        ));
    }
}
