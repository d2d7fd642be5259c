//! Booking creation, lookup and admin management

use carwash_core::{
    models::{
        BookedService, Booking, BookingChanges, BookingFilter, BookingStatus, NewBooking,
        VehicleType,
    },
    traits::{BookingRepository, ServiceCatalog},
    AppError, AppResult,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::distance::LocationService;
use crate::notifications::NotificationService;
use crate::scheduling::{parse_clock_time, SlotCalculator};

/// Booking request
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub date: NaiveDate,

    /// Start time as "HH:MM"
    pub start_time: String,

    pub location: String,
    pub vehicle_type: VehicleType,
    pub number_of_cars: u32,
    pub service_ids: Vec<Uuid>,

    /// Distance from the base, when the address was checked
    pub distance_km: Option<f64>,

    pub notes: Option<String>,
}

/// Booking service
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    catalog: Arc<dyn ServiceCatalog>,
    calculator: SlotCalculator,
    locations: Arc<LocationService>,
    notifications: Arc<NotificationService>,
}

impl BookingService {
    /// Create a new booking service
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        catalog: Arc<dyn ServiceCatalog>,
        calculator: SlotCalculator,
        locations: Arc<LocationService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            bookings,
            catalog,
            calculator,
            locations,
            notifications,
        }
    }

    /// Price, check and store a booking
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed start time, zero cars or no services
    /// - `NotFound` when a service id is not in the catalog
    /// - `Conflict` when the slot is blocked by an existing booking
    #[instrument(skip(self, request), fields(date = %request.date, time = %request.start_time))]
    pub async fn create(&self, request: BookingRequest) -> AppResult<Booking> {
        if request.number_of_cars == 0 {
            return Err(AppError::InvalidInput(
                "number_of_cars must be at least 1".to_string(),
            ));
        }
        if request.service_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one service must be selected".to_string(),
            ));
        }
        let start_time = parse_clock_time(&request.start_time)?;

        let services = self.resolve_services(&request).await?;
        let duration: u32 = services.iter().map(|s| s.duration_minutes).sum();

        let intervals = self.bookings.intervals_on(request.date).await?;
        if !self
            .calculator
            .is_available_at(request.date.and_time(start_time), duration, &intervals)
        {
            warn!(
                "Requested slot {} {} is blocked",
                request.date, request.start_time
            );
            return Err(AppError::Conflict(format!(
                "{} at {} is not available",
                request.date, request.start_time
            )));
        }

        let cars = Decimal::from(request.number_of_cars);
        let base_price: Decimal = services.iter().map(|s| s.price * cars).sum();
        let service_charge = match request.distance_km {
            Some(km) => self.locations.surcharge(km)?,
            None => Decimal::ZERO,
        };
        let within_radius = request
            .distance_km
            .map(|km| km <= self.locations.free_radius_km());

        let booking = self
            .bookings
            .create(NewBooking {
                customer_name: request.customer_name,
                customer_email: request.customer_email,
                customer_phone: request.customer_phone,
                date: request.date,
                start_time,
                location: request.location,
                vehicle_type: request.vehicle_type,
                number_of_cars: request.number_of_cars,
                services,
                base_price,
                service_charge,
                total_price: base_price + service_charge,
                distance_km: request.distance_km,
                within_radius,
                notes: request.notes,
                status: BookingStatus::Confirmed,
            })
            .await?;

        info!(
            "Booking {} created for {} ({} min, total {})",
            booking.id,
            booking.customer.email,
            booking.duration_minutes(),
            booking.total_price
        );

        let report = self
            .notifications
            .email(
                &booking.customer.email,
                "Booking Confirmation - K2025 Mobile Carwash",
                &confirmation_text(&booking),
            )
            .await;
        if !report.success {
            warn!("Confirmation for booking {} not delivered", booking.id);
        }

        Ok(booking)
    }

    /// Find a booking
    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Booking> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// One page of bookings, newest first, with the total match count
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        if limit < 1 || offset < 0 {
            return Err(AppError::InvalidInput(format!(
                "invalid page window: limit {}, offset {}",
                limit, offset
            )));
        }
        self.bookings.list(filter, limit, offset).await
    }

    /// Apply admin edits and return the updated booking
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when nothing changes or the new location is blank
    /// - `NotFound` for an unknown booking
    /// - `Conflict` when reinstating a cancelled booking whose slot was taken
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: Uuid, changes: BookingChanges) -> AppResult<Booking> {
        if changes.is_empty() {
            return Err(AppError::InvalidInput("no booking fields to update".to_string()));
        }
        let location = match changes.location.as_deref().map(str::trim) {
            Some("") => {
                return Err(AppError::InvalidInput("location must not be blank".to_string()))
            }
            other => other.map(str::to_string),
        };

        let current = self.get(id).await?;

        if let Some(status) = changes.status.filter(|s| *s != current.status) {
            if status.holds_slot() && !current.status.holds_slot() {
                self.ensure_slot_free(&current).await?;
            }
            self.bookings.update_status(id, status).await?;
            info!("Booking {} moved from {} to {}", id, current.status, status);
        }

        if changes.touches_details() {
            let location = location.unwrap_or_else(|| current.location.clone());
            let notes = match changes.notes {
                Some(notes) => Some(notes).filter(|n| !n.trim().is_empty()),
                None => current.notes.clone(),
            };
            self.bookings
                .update_details(id, &location, notes.as_deref())
                .await?;
        }

        self.get(id).await
    }

    /// Cancel a booking, releasing its slot
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> AppResult<Booking> {
        self.update(
            id,
            BookingChanges {
                status: Some(BookingStatus::Cancelled),
                ..BookingChanges::default()
            },
        )
        .await
    }

    /// Fail with `Conflict` when a live booking overlaps `booking`'s interval
    async fn ensure_slot_free(&self, booking: &Booking) -> AppResult<()> {
        let intervals = self.bookings.intervals_on(booking.date).await?;
        if self.calculator.is_available_at(
            booking.starts_at(),
            booking.duration_minutes(),
            &intervals,
        ) {
            return Ok(());
        }

        warn!(
            "Cannot reinstate booking {}: {} {} is taken",
            booking.id,
            booking.date,
            booking.start_time.format("%H:%M")
        );
        Err(AppError::Conflict(format!(
            "{} at {} is no longer available",
            booking.date,
            booking.start_time.format("%H:%M")
        )))
    }

    /// Catalog entries in request order, priced for the vehicle type
    async fn resolve_services(&self, request: &BookingRequest) -> AppResult<Vec<BookedService>> {
        let found = self.catalog.find_by_ids(&request.service_ids).await?;

        request
            .service_ids
            .iter()
            .map(|id| {
                found
                    .iter()
                    .find(|s| s.id == *id)
                    .map(|s| BookedService {
                        service_id: s.id,
                        name: s.name.clone(),
                        price: s.price_for(request.vehicle_type),
                        duration_minutes: s.duration_minutes,
                    })
                    .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
            })
            .collect()
    }
}

fn confirmation_text(booking: &Booking) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Dear {},", booking.customer.display_name());
    let _ = writeln!(out);
    let _ = writeln!(out, "Your booking has been confirmed.");
    let _ = writeln!(out);
    let _ = writeln!(out, "Date: {}", booking.date.format("%Y/%m/%d"));
    let _ = writeln!(out, "Time: {}", booking.start_time.format("%H:%M"));
    let _ = writeln!(out, "Location: {}", booking.location);
    let _ = writeln!(out, "Services: {}", booking.label());
    let _ = writeln!(
        out,
        "Vehicles: {} x {}",
        booking.number_of_cars,
        booking.vehicle_type.label()
    );
    if booking.service_charge > Decimal::ZERO {
        let _ = writeln!(out, "Service Charge: R{:.2}", booking.service_charge);
    }
    let _ = writeln!(out, "Total: R{:.2}", booking.total_price);
    let _ = writeln!(out);
    let _ = write!(out, "Thank you for choosing K2025 Mobile Carwash!");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::testing::RecordingChannel;
    use async_trait::async_trait;
    use carwash_core::{
        config::ServiceAreaConfig,
        models::{Channel, Coordinates, WashService},
        traits::Geocoder,
    };
    use carwash_db::MemoryStore;
    use rust_decimal_macros::dec;

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn geocode(&self, _address: &str) -> AppResult<Coordinates> {
            Err(AppError::UpstreamUnavailable("not configured".to_string()))
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        email: Arc<RecordingChannel>,
        service: BookingService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let email = RecordingChannel::new(Channel::Email);
        let service = BookingService::new(
            store.clone(),
            store.clone(),
            SlotCalculator::default(),
            Arc::new(LocationService::new(
                Arc::new(NoGeocoder),
                ServiceAreaConfig::default(),
            )),
            Arc::new(NotificationService::new(vec![email.clone()])),
        );
        Fixture {
            store,
            email,
            service,
        }
    }

    async fn catalog_entry(store: &MemoryStore, name: &str) -> WashService {
        ServiceCatalog::list(store)
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap()
    }

    fn request(start_time: &str, service_ids: Vec<Uuid>) -> BookingRequest {
        BookingRequest {
            customer_name: Some("Bongani".to_string()),
            customer_email: "bongani@example.com".to_string(),
            customer_phone: None,
            date: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
            start_time: start_time.to_string(),
            location: "7 Hill Street, Danoon".to_string(),
            vehicle_type: VehicleType::Suv,
            number_of_cars: 2,
            service_ids,
            distance_km: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_prices_and_confirms() {
        let f = fixture();
        let full = catalog_entry(&f.store, "Standard Full Package").await;
        let interior = catalog_entry(&f.store, "Interior Wash").await;

        let mut req = request("09:00", vec![full.id, interior.id]);
        req.distance_km = Some(25.0);
        let booking = f.service.create(req).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.duration_minutes(), 85);
        assert_eq!(booking.base_price, dec!(840));
        assert_eq!(booking.service_charge, dec!(100));
        assert_eq!(booking.total_price, dec!(940));
        assert_eq!(booking.within_radius, Some(false));
        assert_eq!(booking.services[0].name, "Standard Full Package");

        let sent = f.email.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("Total: R940.00"));
    }

    #[tokio::test]
    async fn test_create_rejects_blocked_slot() {
        let f = fixture();
        let full = catalog_entry(&f.store, "Standard Full Package").await;

        f.service
            .create(request("13:00", vec![full.id]))
            .await
            .unwrap();

        let err = f
            .service
            .create(request("13:30", vec![full.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Ends exactly when the existing booking starts.
        assert!(f
            .service
            .create(request("12:00", vec![full.id]))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_input_errors() {
        let f = fixture();
        let exterior = catalog_entry(&f.store, "Exterior Wash").await;

        let mut no_cars = request("10:00", vec![exterior.id]);
        no_cars.number_of_cars = 0;
        assert!(matches!(
            f.service.create(no_cars).await,
            Err(AppError::InvalidInput(_))
        ));

        assert!(matches!(
            f.service.create(request("10h00", vec![exterior.id])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service.create(request("10:00", vec![])).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service
                .create(request("10:00", vec![exterior.id, Uuid::new_v4()]))
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get() {
        let f = fixture();
        let exterior = catalog_entry(&f.store, "Exterior Wash").await;
        let created = f
            .service
            .create(request("08:00", vec![exterior.id]))
            .await
            .unwrap();

        let found = f.service.get(created.id).await.unwrap();
        assert_eq!(found.total_price, dec!(300));
        assert!(matches!(
            f.service.get(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let f = fixture();
        let exterior = catalog_entry(&f.store, "Exterior Wash").await;

        let mut ids = Vec::new();
        for start in ["08:00", "10:00", "12:00"] {
            let booking = f
                .service
                .create(request(start, vec![exterior.id]))
                .await
                .unwrap();
            ids.push(booking.id);
        }
        f.service.cancel(ids[0]).await.unwrap();

        let (page, total) = f
            .service
            .list(&BookingFilter::default(), 2, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);

        let confirmed = BookingFilter {
            status: Some(BookingStatus::Confirmed),
            search: Some("hill street".to_string()),
        };
        let (page, total) = f.service.list(&confirmed, 10, 0).await.unwrap();
        assert_eq!(total, 2);
        assert!(page.iter().all(|b| b.id != ids[0]));

        assert!(matches!(
            f.service.list(&BookingFilter::default(), 0, 0).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_update_fields_and_status() {
        let f = fixture();
        let exterior = catalog_entry(&f.store, "Exterior Wash").await;
        let booking = f
            .service
            .create(request("09:00", vec![exterior.id]))
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                booking.id,
                BookingChanges {
                    status: Some(BookingStatus::Completed),
                    location: Some("  22 Pine Avenue ".to_string()),
                    notes: Some("Customer tipped".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
        assert_eq!(updated.location, "22 Pine Avenue");
        assert_eq!(updated.notes.as_deref(), Some("Customer tipped"));
        assert_eq!(updated.total_price, booking.total_price);

        let notes_only = f
            .service
            .update(
                booking.id,
                BookingChanges {
                    notes: Some(String::new()),
                    ..BookingChanges::default()
                },
            )
            .await
            .unwrap();
        assert!(notes_only.notes.is_none());
        assert_eq!(notes_only.location, "22 Pine Avenue");
    }

    #[tokio::test]
    async fn test_update_errors() {
        let f = fixture();
        let exterior = catalog_entry(&f.store, "Exterior Wash").await;
        let booking = f
            .service
            .create(request("09:00", vec![exterior.id]))
            .await
            .unwrap();

        assert!(matches!(
            f.service.update(booking.id, BookingChanges::default()).await,
            Err(AppError::InvalidInput(_))
        ));
        let blank = BookingChanges {
            location: Some("   ".to_string()),
            ..BookingChanges::default()
        };
        assert!(matches!(
            f.service.update(booking.id, blank).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            f.service.cancel(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_reinstate_checks_overlap() {
        let f = fixture();
        let full = catalog_entry(&f.store, "Standard Full Package").await;

        let first = f
            .service
            .create(request("13:00", vec![full.id]))
            .await
            .unwrap();
        let cancelled = f.service.cancel(first.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Overlaps the cancelled booking without sharing its start.
        f.service
            .create(request("13:30", vec![full.id]))
            .await
            .unwrap();

        let reinstate = BookingChanges {
            status: Some(BookingStatus::Confirmed),
            ..BookingChanges::default()
        };
        let err = f.service.update(first.id, reinstate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            f.service.get(first.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
    }
}
