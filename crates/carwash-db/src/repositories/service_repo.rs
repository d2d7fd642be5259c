//! Service catalog backed by `services` and `service_prices`

use carwash_core::{
    models::{ServiceTier, WashService},
    traits::ServiceCatalog,
    AppError, AppResult,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

const SERVICE_SELECT: &str = r#"
    SELECT
        s.id, s.slug, s.name, s.description, s.tier, s.category, s.duration_minutes,
        MAX(p.price) FILTER (WHERE p.vehicle_type = 'small') AS small_price,
        MAX(p.price) FILTER (WHERE p.vehicle_type = 'suv') AS suv_price
    FROM services s
    LEFT JOIN service_prices p ON p.service_id = s.id
    WHERE s.is_active
"#;

/// PostgreSQL implementation of ServiceCatalog
pub struct PgServiceCatalog {
    pool: PgPool,
}

impl PgServiceCatalog {
    /// Create a new service catalog
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Services missing a price for either vehicle category cannot be booked
    fn priced(rows: Vec<ServiceRow>) -> Vec<WashService> {
        rows.into_iter()
            .filter_map(|row| {
                let service = row.into_service();
                if service.is_none() {
                    warn!("Skipping service without complete pricing");
                }
                service
            })
            .collect()
    }
}

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<WashService>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<sqlx::Postgres, ServiceRow>(&format!(
            "{} AND s.id = ANY($1) GROUP BY s.id",
            SERVICE_SELECT
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding services: {}", e);
            AppError::Database(format!("Failed to find services: {}", e))
        })?;

        Ok(Self::priced(rows))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> AppResult<Vec<WashService>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ServiceRow>(&format!(
            "{} GROUP BY s.id ORDER BY small_price NULLS LAST, s.name",
            SERVICE_SELECT
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing services: {}", e);
            AppError::Database(format!("Failed to list services: {}", e))
        })?;

        let services = Self::priced(rows);
        debug!("Loaded {} services", services.len());
        Ok(services)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: Uuid,
    slug: String,
    name: String,
    description: String,
    tier: String,
    category: String,
    duration_minutes: i32,
    small_price: Option<Decimal>,
    suv_price: Option<Decimal>,
}

impl ServiceRow {
    fn into_service(self) -> Option<WashService> {
        Some(WashService {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            tier: ServiceTier::from_str(&self.tier).unwrap_or_default(),
            category: self.category,
            duration_minutes: self.duration_minutes.max(0) as u32,
            small_price: self.small_price?,
            suv_price: self.suv_price?,
        })
    }
}
