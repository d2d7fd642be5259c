//! K2025 Mobile Carwash backend server
//!
//! Booking, invoicing and payment API for the mobile carwash. Runs against
//! PostgreSQL when a database URL is configured and against an in-memory
//! store otherwise.

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use carwash_api::{AppState, Providers, Repositories};
use carwash_core::AppConfig;
use carwash_db::{create_pool, run_migrations, MemoryStore};
use carwash_gateways::{build_channels, build_geocoder, build_payment_gateway};
use std::env;
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "k2025_carwash={0},carwash_api={0},carwash_services={0},carwash_db={0},\
             carwash_gateways={0},actix_web=info,sqlx=warn",
            log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// Store selected by the configuration
async fn repositories(config: &AppConfig) -> io::Result<Repositories> {
    match config.database.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            info!("Connecting to database...");
            let pool = create_pool(url, Some(config.database.max_connections))
                .await
                .map_err(|e| startup_error("Failed to create database pool", e))?;
            run_migrations(&pool)
                .await
                .map_err(|e| startup_error("Failed to run migrations", e))?;
            info!(
                "Database ready with {} max connections",
                config.database.max_connections
            );
            Ok(Repositories::postgres(pool))
        }
        None => {
            warn!("No database configured, using the in-memory store (data is lost on restart)");
            Ok(Repositories::in_memory(Arc::new(MemoryStore::new())))
        }
    }
}

fn providers(config: &AppConfig) -> io::Result<Providers> {
    Ok(Providers {
        geocoder: build_geocoder(&config.geocoding)
            .map_err(|e| startup_error("Failed to build geocoder", e))?,
        gateway: build_payment_gateway(&config.payments)
            .map_err(|e| startup_error("Failed to build payment gateway", e))?,
        channels: build_channels(&config.notifications)
            .map_err(|e| startup_error("Failed to build notification channels", e))?,
    })
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!(
        "Starting K2025 Mobile Carwash backend v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = AppConfig::load().map_err(|e| startup_error("Invalid configuration", e))?;

    let repos = repositories(&config).await?;
    let providers = providers(&config)?;
    let state = AppState::new(&config, repos, providers)
        .map_err(|e| startup_error("Failed to wire services", e))?;
    let state = web::Data::new(state);

    let bind_addr = config.server_addr();
    let workers = config.server.workers.max(1);
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let cors_origins_inner = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origins: Vec<&str> = cors_origins_inner.split(',').collect();
                if let Ok(origin_str) = origin.to_str() {
                    origins.iter().any(|o| o.trim() == origin_str)
                } else {
                    false
                }
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::HeaderName::from_static("stripe-signature"),
            ])
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(256 * 1024))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let error_message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": "invalid_query",
                        "message": error_message,
                        "status": 400
                    })),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .service(web::scope("/api/v1").configure(carwash_api::configure))
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
