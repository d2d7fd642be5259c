//! In-process store
//!
//! Implements every repository trait over plain maps behind a single lock.
//! Used when no database URL is configured and by the service tests. The
//! catalog is seeded with the same four services as the database seed
//! migration, under the same ids.

use crate::repositories::normalize_email;
use async_trait::async_trait;
use carwash_core::{
    models::{
        Booking, BookingFilter, BookingInterval, BookingStatus, Contract, ContractStatus, Customer,
        InvoiceFilter, InvoiceMetadata, NewBooking, NewContract, NewPayment, Payment,
        PaymentState, PaymentStatus, ServiceTier, WashService,
    },
    traits::{BookingRepository, ContractRepository, PaymentRepository, ServiceCatalog},
    AppError, AppResult,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Default)]
struct State {
    /// Keyed by normalized e-mail
    customers: HashMap<String, Customer>,
    services: Vec<WashService>,
    bookings: HashMap<Uuid, Booking>,
    contracts: HashMap<Uuid, Contract>,
    /// Keyed by gateway transaction id
    payments: HashMap<String, Payment>,
}

impl State {
    fn upsert_customer(
        &mut self,
        name: Option<String>,
        email: &str,
        phone: Option<String>,
    ) -> Customer {
        let key = normalize_email(email);
        let customer = self
            .customers
            .entry(key.clone())
            .or_insert_with(|| Customer {
                id: Uuid::new_v4(),
                name: None,
                email: key,
                phone: None,
            });
        if name.is_some() {
            customer.name = name;
        }
        if phone.is_some() {
            customer.phone = phone;
        }
        customer.clone()
    }

    /// Whether a live booking other than `except` starts at `date` `start_time`
    fn slot_taken(&self, date: NaiveDate, start_time: NaiveTime, except: Option<Uuid>) -> bool {
        self.bookings.values().any(|b| {
            Some(b.id) != except
                && b.status.holds_slot()
                && b.date == date
                && b.start_time == start_time
        })
    }

    fn booking_mut(&mut self, id: Uuid) -> AppResult<&mut Booking> {
        self.bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    fn contract_mut(&mut self, id: Uuid) -> AppResult<&mut Contract> {
        self.contracts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Contract {} not found", id)))
    }
}

/// Store holding everything in memory
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Store seeded with the standard service catalog
    pub fn new() -> Self {
        let store = Self::empty();
        store.state.write().services = seed_services();
        store
    }

    /// Store with an empty catalog
    pub fn empty() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Add or replace a catalog entry
    pub fn add_service(&self, service: WashService) {
        let mut state = self.state.write();
        state.services.retain(|s| s.id != service.id);
        state.services.push(service);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_service(
    id: u128,
    slug: &str,
    name: &str,
    description: &str,
    tier: ServiceTier,
    category: &str,
    duration_minutes: u32,
    small_price: i64,
    suv_price: i64,
) -> WashService {
    WashService {
        id: Uuid::from_u128(id),
        slug: slug.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        tier,
        category: category.to_string(),
        duration_minutes,
        small_price: Decimal::new(small_price, 0),
        suv_price: Decimal::new(suv_price, 0),
    }
}

fn seed_services() -> Vec<WashService> {
    vec![
        seed_service(
            0x6f1c2a4e_0b1d_4c59_9a53_1e0f5a7d2c01,
            "exterior-wash",
            "Exterior Wash",
            "Pre-rinse hand wash, tyre and rim clean, windows quick dry, light wax spray",
            ServiceTier::Basic,
            "exterior",
            30,
            120,
            150,
        ),
        seed_service(
            0x6f1c2a4e_0b1d_4c59_9a53_1e0f5a7d2c02,
            "interior-wash",
            "Interior Wash",
            "Vacuuming, wipe down of surfaces, windows, door panels",
            ServiceTier::Basic,
            "interior",
            25,
            100,
            120,
        ),
        seed_service(
            0x6f1c2a4e_0b1d_4c59_9a53_1e0f5a7d2c03,
            "standard-full",
            "Standard Full Package",
            "Full exterior wash, tyre shine, full vacuum, dashboard and panel clean, \
             windows inside and out",
            ServiceTier::Standard,
            "full",
            60,
            250,
            300,
        ),
        seed_service(
            0x6f1c2a4e_0b1d_4c59_9a53_1e0f5a7d2c04,
            "premium-detail",
            "Premium Detail",
            "Everything in Standard plus clay bar treatment, premium wax application, \
             leather conditioning, engine bay cleaning",
            ServiceTier::Premium,
            "detailing",
            120,
            500,
            600,
        ),
    ]
}

/// Most recently invoiced first
fn by_invoice_desc(a: Option<&InvoiceMetadata>, b: Option<&InvoiceMetadata>) -> Ordering {
    let a = a.map(|i| i.sent_at);
    let b = b.map(|i| i.sent_at);
    b.cmp(&a)
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.state.read().bookings.get(&id).cloned())
    }

    async fn create(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut state = self.state.write();

        if booking.status.holds_slot() && state.slot_taken(booking.date, booking.start_time, None)
        {
            warn!(
                "Slot {} {} already taken",
                booking.date,
                booking.start_time.format("%H:%M")
            );
            return Err(AppError::Conflict(format!(
                "Time slot {} {} is already booked",
                booking.date,
                booking.start_time.format("%H:%M")
            )));
        }

        let customer = state.upsert_customer(
            booking.customer_name.clone(),
            &booking.customer_email,
            booking.customer_phone.clone(),
        );
        let booking = booking.into_booking(customer, Utc::now());

        debug!("Created booking {}", booking.id);
        state.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn intervals_on(&self, date: NaiveDate) -> AppResult<Vec<BookingInterval>> {
        let state = self.state.read();
        let mut bookings: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| b.date == date && b.status.holds_slot())
            .collect();
        bookings.sort_by_key(|b| b.start_time);

        Ok(bookings.into_iter().map(Booking::interval).collect())
    }

    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> AppResult<()> {
        let mut state = self.state.write();
        let booking = state.booking_mut(id)?;
        booking.invoice = Some(invoice.clone());
        booking.payment.status = PaymentStatus::Pending;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> AppResult<()> {
        let mut state = self.state.write();
        let current = state
            .bookings
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;
        if status.holds_slot()
            && !current.status.holds_slot()
            && state.slot_taken(current.date, current.start_time, Some(id))
        {
            return Err(AppError::Conflict(format!(
                "Booking {} slot is already taken",
                id
            )));
        }

        let booking = state.booking_mut(id)?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> AppResult<()> {
        let mut state = self.state.write();
        let booking = state.booking_mut(id)?;
        booking.payment = payment.clone();
        booking.updated_at = Utc::now();
        Ok(())
    }

    async fn list_invoiced(&self, filter: &InvoiceFilter) -> AppResult<Vec<Booking>> {
        let state = self.state.read();
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| filter.matches(b.payment.status, b.invoice.as_ref()))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| by_invoice_desc(a.invoice.as_ref(), b.invoice.as_ref()));
        Ok(bookings)
    }

    async fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Booking>, i64)> {
        let state = self.state.read();
        let mut matching: Vec<&Booking> = state
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_details(&self, id: Uuid, location: &str, notes: Option<&str>) -> AppResult<()> {
        let mut state = self.state.write();
        let booking = state.booking_mut(id)?;
        booking.location = location.to_string();
        booking.notes = notes.map(str::to_string);
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ContractRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>> {
        Ok(self.state.read().contracts.get(&id).cloned())
    }

    async fn create(&self, contract: NewContract) -> AppResult<Contract> {
        let mut state = self.state.write();

        let customer = state.upsert_customer(
            contract.customer_name.clone(),
            &contract.customer_email,
            contract.customer_phone.clone(),
        );
        let contract = contract.into_contract(customer, Utc::now());

        debug!("Created contract {}", contract.id);
        state.contracts.insert(contract.id, contract.clone());
        Ok(contract)
    }

    async fn record_invoice(&self, id: Uuid, invoice: &InvoiceMetadata) -> AppResult<()> {
        let mut state = self.state.write();
        let contract = state.contract_mut(id)?;
        contract.invoice = Some(invoice.clone());
        contract.payment.status = PaymentStatus::Pending;
        contract.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: ContractStatus) -> AppResult<()> {
        let mut state = self.state.write();
        let contract = state.contract_mut(id)?;
        contract.status = status;
        contract.updated_at = Utc::now();
        Ok(())
    }

    async fn record_payment(&self, id: Uuid, payment: &PaymentState) -> AppResult<()> {
        let mut state = self.state.write();
        let contract = state.contract_mut(id)?;
        contract.payment = payment.clone();
        contract.updated_at = Utc::now();
        Ok(())
    }

    async fn list_invoiced(&self, filter: &InvoiceFilter) -> AppResult<Vec<Contract>> {
        let state = self.state.read();
        let mut contracts: Vec<Contract> = state
            .contracts
            .values()
            .filter(|c| filter.matches(c.payment.status, c.invoice.as_ref()))
            .cloned()
            .collect();
        contracts.sort_by(|a, b| by_invoice_desc(a.invoice.as_ref(), b.invoice.as_ref()));
        Ok(contracts)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn create(&self, payment: NewPayment) -> AppResult<Payment> {
        let mut state = self.state.write();
        if state.payments.contains_key(&payment.transaction_id) {
            return Err(AppError::Conflict(format!(
                "Transaction {} already recorded",
                payment.transaction_id
            )));
        }

        let payment = payment.into_payment(Utc::now());
        state
            .payments
            .insert(payment.transaction_id.clone(), payment.clone());
        Ok(payment)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        Ok(self.state.read().payments.get(transaction_id).cloned())
    }

    async fn update_status_by_transaction(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
    ) -> AppResult<Option<Payment>> {
        let mut state = self.state.write();
        Ok(state.payments.get_mut(transaction_id).map(|payment| {
            payment.status = status;
            payment.updated_at = Utc::now();
            payment.clone()
        }))
    }
}

#[async_trait]
impl ServiceCatalog for MemoryStore {
    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<WashService>> {
        let state = self.state.read();
        Ok(state
            .services
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> AppResult<Vec<WashService>> {
        let mut services = self.state.read().services.clone();
        services.sort_by(|a, b| {
            a.small_price
                .cmp(&b.small_price)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(services)
    }
}
