//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.
//! Provider credentials are optional: a missing key selects the unconfigured
//! collaborator instead of failing start-up.

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub service_area: ServiceAreaConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub payments: PaymentsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; the in-memory store is used when absent
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Invoice and payment-instruction settings
#[derive(Debug, Deserialize, Clone)]
pub struct BillingConfig {
    /// VAT applied to every invoice subtotal
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,

    /// Hours an issued invoice stays payable
    #[serde(default = "default_invoice_validity")]
    pub invoice_validity_hours: i64,

    /// ISO 4217 currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Bank name printed on invoices
    #[serde(default = "default_bank_name")]
    pub bank_name: String,

    /// Account holder printed on invoices
    #[serde(default = "default_account_name")]
    pub account_name: String,

    /// Account number printed on invoices
    #[serde(default = "default_account_number")]
    pub account_number: String,
}

fn default_tax_rate() -> Decimal {
    dec!(0.15)
}

fn default_invoice_validity() -> i64 {
    24
}

fn default_currency() -> String {
    "ZAR".to_string()
}

fn default_bank_name() -> String {
    "Standard Bank".to_string()
}

fn default_account_name() -> String {
    "K2025 Mobile Carwash".to_string()
}

fn default_account_number() -> String {
    "1234567890".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            invoice_validity_hours: default_invoice_validity(),
            currency: default_currency(),
            bank_name: default_bank_name(),
            account_name: default_account_name(),
            account_number: default_account_number(),
        }
    }
}

/// Daily booking window
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    /// First bookable start time ("HH:MM")
    #[serde(default = "default_opening_time")]
    pub opening_time: String,

    /// Closing time ("HH:MM"), exclusive
    #[serde(default = "default_closing_time")]
    pub closing_time: String,

    /// Slot granularity in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

fn default_opening_time() -> String {
    "08:00".to_string()
}

fn default_closing_time() -> String {
    "17:00".to_string()
}

fn default_slot_minutes() -> u32 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            opening_time: default_opening_time(),
            closing_time: default_closing_time(),
            slot_minutes: default_slot_minutes(),
        }
    }
}

/// Base location and travel surcharge
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceAreaConfig {
    /// Latitude of the base location (Danoon)
    #[serde(default = "default_base_latitude")]
    pub base_latitude: f64,

    /// Longitude of the base location (Danoon)
    #[serde(default = "default_base_longitude")]
    pub base_longitude: f64,

    /// Radius served without surcharge
    #[serde(default = "default_free_radius")]
    pub free_radius_km: f64,

    /// Surcharge per kilometre beyond the free radius
    #[serde(default = "default_surcharge_per_km")]
    pub surcharge_per_km: Decimal,
}

fn default_base_latitude() -> f64 {
    -26.5375
}

fn default_base_longitude() -> f64 {
    31.0989
}

fn default_free_radius() -> f64 {
    20.0
}

fn default_surcharge_per_km() -> Decimal {
    dec!(20)
}

impl Default for ServiceAreaConfig {
    fn default() -> Self {
        Self {
            base_latitude: default_base_latitude(),
            base_longitude: default_base_longitude(),
            free_radius_km: default_free_radius(),
            surcharge_per_km: default_surcharge_per_km(),
        }
    }
}

/// Geocoding provider
#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Google Maps API key
    pub api_key: Option<String>,

    /// Geocoding endpoint
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
}

fn default_geocoding_endpoint() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_geocoding_endpoint(),
        }
    }
}

/// Payment gateway (Stripe)
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Stripe secret API key
    pub stripe_secret_key: Option<String>,

    /// Signing secret for webhook events
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            api_base: default_stripe_api_base(),
        }
    }
}

/// Notification channels
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsConfig {
    /// WhatsApp Cloud API token
    pub whatsapp_token: Option<String>,

    /// WhatsApp sender phone-number id
    pub whatsapp_phone_number_id: Option<String>,

    /// WhatsApp Graph API base URL
    #[serde(default = "default_whatsapp_api_base")]
    pub whatsapp_api_base: String,

    /// HTTP mail relay endpoint
    pub email_endpoint: Option<String>,

    /// Bearer token for the mail relay
    pub email_api_key: Option<String>,

    /// Sender address for outgoing mail
    #[serde(default = "default_email_from")]
    pub email_from: String,
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_email_from() -> String {
    "K2025 Mobile Carwash <bookings@k2025carwash.co.za>".to_string()
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            whatsapp_token: None,
            whatsapp_phone_number_id: None,
            whatsapp_api_base: default_whatsapp_api_base(),
            email_endpoint: None,
            email_api_key: None,
            email_from: default_email_from(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("billing.invoice_validity_hours", 24)?
            .set_default("schedule.opening_time", "08:00")?
            .set_default("schedule.closing_time", "17:00")?
            .set_default("schedule.slot_minutes", 30)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CARWASH_ prefix
            .add_source(
                Environment::with_prefix("CARWASH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app: AppConfig = config.try_deserialize()?;

        // Support the conventional DATABASE_URL variable
        if app.database.url.is_none() {
            app.database.url = env::var("DATABASE_URL").ok();
        }

        Ok(app)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CARWASH").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_billing_config() {
        let config = BillingConfig::default();
        assert_eq!(config.tax_rate, dec!(0.15));
        assert_eq!(config.invoice_validity_hours, 24);
        assert_eq!(config.currency, "ZAR");
    }

    #[test]
    fn test_default_schedule_and_area() {
        let config = AppConfig::default();
        assert_eq!(config.schedule.opening_time, "08:00");
        assert_eq!(config.schedule.closing_time, "17:00");
        assert_eq!(config.schedule.slot_minutes, 30);
        assert_eq!(config.service_area.free_radius_km, 20.0);
        assert_eq!(config.service_area.surcharge_per_km, dec!(20));
        assert!(config.geocoding.api_key.is_none());
    }

    #[test]
    fn test_server_addr() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9001;
        assert_eq!(config.server_addr(), "127.0.0.1:9001");
    }
}
