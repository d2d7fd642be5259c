//! Shared application state
//!
//! Services are built once at start-up from the configuration, the chosen
//! store and the provider clients, then handed to every worker.

use carwash_core::{
    traits::{
        BookingRepository, ContractRepository, Geocoder, NotificationChannel, PaymentGateway,
        PaymentRepository, ServiceCatalog,
    },
    AppConfig, AppResult,
};
use carwash_db::{
    MemoryStore, PgBookingRepository, PgContractRepository, PgPaymentRepository, PgPool,
    PgServiceCatalog,
};
use carwash_services::{
    AvailabilityService, BookingService, BusinessHours, ContractService, InvoiceCalculator,
    InvoiceService, LocationService, NotificationService, PaymentService, SlotCalculator,
};
use std::sync::Arc;

/// Persistence collaborators
#[derive(Clone)]
pub struct Repositories {
    pub bookings: Arc<dyn BookingRepository>,
    pub contracts: Arc<dyn ContractRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub catalog: Arc<dyn ServiceCatalog>,
}

impl Repositories {
    /// PostgreSQL repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            bookings: Arc::new(PgBookingRepository::new(pool.clone())),
            contracts: Arc::new(PgContractRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            catalog: Arc::new(PgServiceCatalog::new(pool)),
        }
    }

    /// Every repository backed by the same in-memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            bookings: store.clone(),
            contracts: store.clone(),
            payments: store.clone(),
            catalog: store,
        }
    }
}

/// External provider collaborators
#[derive(Clone)]
pub struct Providers {
    pub geocoder: Arc<dyn Geocoder>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub channels: Vec<Arc<dyn NotificationChannel>>,
}

/// Services available to the handlers
pub struct AppState {
    pub availability: Arc<AvailabilityService>,
    pub bookings: Arc<BookingService>,
    pub contracts: Arc<ContractService>,
    pub invoices: Arc<InvoiceService>,
    pub locations: Arc<LocationService>,
    pub payments: Arc<PaymentService>,
    pub notifications: Arc<NotificationService>,
    pub catalog: Arc<dyn ServiceCatalog>,
}

impl AppState {
    /// Wire the services
    ///
    /// Fails with `InvalidInput` when the business hours cannot be parsed.
    pub fn new(config: &AppConfig, repos: Repositories, providers: Providers) -> AppResult<Self> {
        let calculator = SlotCalculator::new(BusinessHours::from_config(&config.schedule)?);

        let notifications = Arc::new(NotificationService::new(providers.channels));
        let locations = Arc::new(LocationService::new(
            providers.geocoder,
            config.service_area.clone(),
        ));

        Ok(Self {
            availability: Arc::new(AvailabilityService::new(
                repos.bookings.clone(),
                calculator.clone(),
            )),
            bookings: Arc::new(BookingService::new(
                repos.bookings.clone(),
                repos.catalog.clone(),
                calculator,
                locations.clone(),
                notifications.clone(),
            )),
            contracts: Arc::new(ContractService::new(
                repos.contracts.clone(),
                notifications.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                repos.bookings.clone(),
                repos.contracts.clone(),
                InvoiceCalculator::new(config.billing.clone()),
                notifications.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                providers.gateway,
                repos.payments,
                repos.bookings,
                repos.contracts,
                notifications.clone(),
                config.billing.currency.clone(),
            )),
            locations,
            notifications,
            catalog: repos.catalog,
        })
    }
}
