//! Integration tests for the HTTP API
//!
//! The app runs against the in-memory store with fake providers, so no
//! database or network is needed.

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use carwash_api::{configure, AppState, Providers, Repositories};
use carwash_core::{
    models::{
        Channel, Coordinates, DeliveryReceipt, OutboundMessage, PaymentIntent,
        PaymentIntentRequest, PaymentOutcome, PaymentOutcomeKind,
    },
    traits::{Geocoder, NotificationChannel, PaymentGateway},
    AppConfig, AppError, AppResult,
};
use carwash_db::MemoryStore;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const STANDARD_FULL: &str = "6f1c2a4e-0b1d-4c59-9a53-1e0f5a7d2c03";
const VALID_SIGNATURE: &str = "t=1,v1=valid";

// ============================================================================
// Fakes
// ============================================================================

/// Geocoder that always answers with the same point
struct FixedGeocoder(Coordinates);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _address: &str) -> AppResult<Coordinates> {
        Ok(self.0)
    }
}

/// Gateway that numbers intents and trusts one signature
struct FakeGateway {
    issued: Mutex<u32>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_intent(&self, _request: PaymentIntentRequest) -> AppResult<PaymentIntent> {
        let mut issued = self.issued.lock();
        *issued += 1;
        Ok(PaymentIntent {
            id: format!("pi_test_{}", issued),
            client_secret: format!("pi_test_{}_secret", issued),
        })
    }

    fn parse_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> AppResult<Option<PaymentOutcome>> {
        if signature_header != VALID_SIGNATURE {
            return Err(AppError::InvalidSignature("signature mismatch".to_string()));
        }
        let event: Value = serde_json::from_slice(payload)?;
        let booking_id = event["booking_id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok());
        Ok(Some(PaymentOutcome {
            transaction_id: event["id"].as_str().unwrap_or_default().to_string(),
            kind: PaymentOutcomeKind::Succeeded,
            booking_id,
            contract_id: None,
        }))
    }
}

/// E-mail channel that keeps what it sends
struct Outbox {
    sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl NotificationChannel for Outbox {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, message: &OutboundMessage) -> AppResult<DeliveryReceipt> {
        let mut sent = self.sent.lock();
        sent.push(message.clone());
        Ok(DeliveryReceipt {
            message_id: Some(format!("mail-{}", sent.len())),
        })
    }
}

// ============================================================================
// Test Setup
// ============================================================================

fn setup() -> (web::Data<AppState>, Arc<Outbox>) {
    let config = AppConfig::default();
    let outbox = Arc::new(Outbox {
        sent: Mutex::new(Vec::new()),
    });
    let providers = Providers {
        // Base location, so every quote is inside the free radius
        geocoder: Arc::new(FixedGeocoder(Coordinates::new(
            config.service_area.base_latitude,
            config.service_area.base_longitude,
        ))),
        gateway: Arc::new(FakeGateway {
            issued: Mutex::new(0),
        }),
        channels: vec![outbox.clone() as Arc<dyn NotificationChannel>],
    };
    let repos = Repositories::in_memory(Arc::new(MemoryStore::new()));
    let state = AppState::new(&config, repos, providers).unwrap();
    (web::Data::new(state), outbox)
}

macro_rules! test_app {
    ($data:expr) => {
        test::init_service(
            App::new()
                .app_data($data.clone())
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await
    };
}

fn booking_body(start_time: &str) -> Value {
    json!({
        "customer_name": "Nomsa Khumalo",
        "customer_email": "Nomsa@Example.com",
        "customer_phone": "+27 82 555 0101",
        "date": "2030-06-03",
        "start_time": start_time,
        "location": "14 Church Street, Danoon",
        "vehicle_type": "suv",
        "service_ids": [STANDARD_FULL],
        "distance_km": 25.0
    })
}

fn money(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

// ============================================================================
// Health and catalog
// ============================================================================

#[actix_web::test]
async fn test_health_check() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_services_cheapest_first() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::get().uri("/api/v1/services").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "Interior Wash",
            "Exterior Wash",
            "Standard Full Package",
            "Premium Detail"
        ]
    );
}

// ============================================================================
// Slots and bookings
// ============================================================================

#[actix_web::test]
async fn test_slots_reflect_bookings() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::get()
        .uri("/api/v1/slots?date=2030-06-03&duration_minutes=60")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["slots"].as_array().unwrap().len(), 18);
    assert_eq!(body["data"]["available_count"], 18);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("09:00"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/slots?date=2030-06-03&duration_minutes=60")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let slots = body["data"]["slots"].as_array().unwrap();
    let nine = slots.iter().find(|s| s["time"] == "09:00").unwrap();
    assert_eq!(nine["available"], false);
    assert_eq!(nine["reason"], "Blocked by existing booking");
    let eleven = slots.iter().find(|s| s["time"] == "11:00").unwrap();
    assert_eq!(eleven["available"], true);
}

#[actix_web::test]
async fn test_slots_reject_zero_duration() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::get()
        .uri("/api/v1/slots?date=2030-06-03&duration_minutes=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_create_and_get_booking() {
    let (data, outbox) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("09:00"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    let booking = &body["data"];
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["customer"]["email"], "nomsa@example.com");
    assert_eq!(money(&booking["base_price"]), dec!(300));
    assert_eq!(money(&booking["service_charge"]), dec!(100));
    assert_eq!(money(&booking["total_price"]), dec!(400));
    assert_eq!(booking["within_radius"], false);
    assert_eq!(outbox.sent.lock().len(), 1);

    let id = booking["id"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bookings/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["id"], id);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bookings/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_double_booking_conflicts() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("10:00"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    // Starts inside the first appointment
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("10:30"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "conflict");
}

#[actix_web::test]
async fn test_booking_validation() {
    let (data, _) = setup();
    let app = test_app!(data);

    let mut body = booking_body("09:00");
    body["customer_email"] = json!("nomsa");
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("9am"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let mut body = booking_body("09:00");
    body["service_ids"] = json!([Uuid::new_v4()]);
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_oversized_inputs_are_rejected() {
    let (data, _) = setup();
    let app = test_app!(data);

    let mut body = booking_body("09:00");
    body["distance_km"] = json!(5e27);
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::get()
        .uri("/api/v1/invoices?expiring=99999999999h")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_input");
}

// ============================================================================
// Booking management
// ============================================================================

/// POST a booking and return its id
macro_rules! create_booking {
    ($app:expr, $start:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/v1/bookings")
            .set_json(booking_body($start))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["data"]["id"].as_str().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn test_list_bookings_paginated() {
    let (data, _) = setup();
    let app = test_app!(data);

    let first = create_booking!(app, "09:00");
    let second = create_booking!(app, "11:00");

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?page=1&limit=1")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert_eq!(body["data"]["pagination"]["total_pages"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?status=all&search=church")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body["data"]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.as_str()) && ids.contains(&second.as_str()));

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?search=Manzini")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 0);

    for uri in ["/api/v1/bookings?status=archived", "/api/v1/bookings?limit=0"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST,
            "{}",
            uri
        );
    }
}

#[actix_web::test]
async fn test_update_and_cancel_booking() {
    let (data, _) = setup();
    let app = test_app!(data);

    let first = create_booking!(app, "09:00");
    let second = create_booking!(app, "11:00");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/bookings/{}", first))
        .set_json(json!({ "status": "completed", "notes": "Washed two SUVs" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["notes"], "Washed two SUVs");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bookings/{}", second))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "cancelled");

    let req = test::TestRequest::get()
        .uri("/api/v1/bookings?status=cancelled")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["id"], second.as_str());

    // The cancelled slot can be booked again
    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("11:00"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    // ...and the cancelled booking can no longer be reinstated
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/bookings/{}", second))
        .set_json(json!({ "status": "confirmed" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/bookings/{}", first))
        .set_json(json!({ "status": "lost" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/bookings/{}", Uuid::new_v4()))
        .set_json(json!({ "notes": "nobody home" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/bookings/{}", Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Contracts
// ============================================================================

#[actix_web::test]
async fn test_contract_purchase_and_manual_payment() {
    let (data, outbox) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::get()
        .uri("/api/v1/contracts/packages")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let req = test::TestRequest::post()
        .uri("/api/v1/contracts")
        .set_json(json!({
            "package": "10-wash-premium",
            "customer_name": "Themba Nkosi",
            "customer_email": "themba@example.com",
            "start_date": "2030-01-15"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let contract = &body["data"];
    assert_eq!(contract["status"], "pending");
    assert_eq!(contract["end_date"], "2031-01-15");
    let id = contract["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/confirm")
        .set_json(json!({
            "type": "contract",
            "id": id,
            "method": "eft",
            "paid_amount": "3992.00",
            "admin_notes": "Reference checked"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["payment"]["status"], "paid");
    assert_eq!(body["data"]["receipt"]["success"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/contracts/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["payment"]["method"], "eft");

    // Purchase confirmation and receipt
    assert_eq!(outbox.sent.lock().len(), 2);
}

#[actix_web::test]
async fn test_unknown_package() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/contracts")
        .set_json(json!({
            "package": "50-wash-platinum",
            "customer_email": "themba@example.com"
        }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Invoices
// ============================================================================

#[actix_web::test]
async fn test_issue_and_list_invoices() {
    let (data, outbox) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("13:00"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/invoices")
        .set_json(json!({ "type": "booking", "booking_id": booking_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;

    let invoice = &body["data"]["invoice"];
    let number = invoice["invoice_number"].as_str().unwrap();
    assert!(number.starts_with("INV-"));
    assert_eq!(invoice["payment_reference"], number);
    assert_eq!(money(&invoice["subtotal"]), dec!(400));
    assert_eq!(money(&invoice["tax_amount"]), dec!(60));
    assert_eq!(money(&invoice["total"]), dec!(460));
    assert_eq!(body["data"]["email"]["success"], true);
    assert_eq!(outbox.sent.lock().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/invoices?status=pending&type=booking&expiring=48h")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["bookings"].as_array().unwrap().len(), 1);
    assert!(body["data"]["contracts"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["summary"]["total_pending_bookings"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/invoices?status=paid")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["bookings"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_invoice_requires_one_source() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/invoices")
        .set_json(json!({ "type": "booking" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/invoices?expiring=soon")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

// ============================================================================
// Locations
// ============================================================================

#[actix_web::test]
async fn test_quote_at_base() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/locations/quote")
        .set_json(json!({ "address": "Danoon" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["within_free_radius"], true);
    assert_eq!(body["data"]["origin_address"], "Danoon");
    assert_eq!(money(&body["data"]["surcharge"]), Decimal::ZERO);

    let req = test::TestRequest::post()
        .uri("/api/v1/locations/quote")
        .set_json(json!({ "address": "" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

// ============================================================================
// Card payments
// ============================================================================

#[actix_web::test]
async fn test_intent_then_webhook_marks_booking_paid() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/bookings")
        .set_json(booking_body("15:00"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/intent")
        .set_json(json!({
            "amount": "400.00",
            "booking_id": booking_id,
            "customer_email": "nomsa@example.com"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["payment_intent_id"], "pi_test_1");
    assert_eq!(body["data"]["client_secret"], "pi_test_1_secret");

    let event = json!({ "id": "pi_test_1", "booking_id": booking_id }).to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .set_payload(event.clone())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .insert_header(("Stripe-Signature", "t=1,v1=forged"))
        .set_payload(event.clone())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/webhook")
        .insert_header(("Stripe-Signature", VALID_SIGNATURE))
        .set_payload(event)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["received"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/bookings/{}", booking_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["payment"]["status"], "paid");
    assert_eq!(body["data"]["payment"]["method"], "stripe");
}

#[actix_web::test]
async fn test_intent_rejects_non_positive_amount() {
    let (data, _) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/payments/intent")
        .set_json(json!({ "amount": "0" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

// ============================================================================
// Notifications
// ============================================================================

#[actix_web::test]
async fn test_notification_reports_per_channel() {
    let (data, outbox) = setup();
    let app = test_app!(data);

    let req = test::TestRequest::post()
        .uri("/api/v1/notifications")
        .set_json(json!({
            "channels": ["email", "whatsapp"],
            "email": "lindiwe@example.com",
            "phone": "+27 82 555 0101",
            "subject": "Reminder",
            "message": "Your wash is tomorrow at 09:00."
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;

    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["channel"], "email");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["message_id"], "mail-1");
    assert_eq!(results[1]["channel"], "whatsapp");
    assert_eq!(results[1]["success"], false);

    let sent = outbox.sent.lock();
    assert_eq!(sent[0].to, "lindiwe@example.com");
    assert_eq!(sent[0].subject, "Reminder");
}
