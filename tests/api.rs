use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use staybook::booking::PricingPolicy;
use staybook::session::{USER_ID_HEADER, USER_ROLE_HEADER};
use staybook::store::MemoryStore;
use staybook::{app, AppState};

fn test_app() -> Router {
    app(AppState::new(
        Arc::new(MemoryStore::new()),
        PricingPolicy::default(),
        "USD",
    ))
}

fn days_from_now(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<(Uuid, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = user {
        builder = builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_property(app: &Router, host: Uuid, location: &str, price: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/properties",
        Some((host, "host")),
        Some(json!({
            "title": "Sea view apartment",
            "location": location,
            "price_per_night": price,
            "max_guests": 4,
            "bedrooms": 2,
            "bathrooms": 1,
            "amenities": ["wifi", "kitchen"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn booking_body(check_in: NaiveDate, check_out: NaiveDate) -> Value {
    json!({
        "check_in": check_in,
        "check_out": check_out,
        "guests": 2,
        "payment": {
            "method": "credit_card",
            "card_number": "4111 1111 1111 1111",
            "cardholder_name": "Sam Okafor",
            "expiry_month": 12,
            "expiry_year": 2099,
            "cvv": "321"
        }
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn listing_requires_host_session() {
    let app = test_app();
    let payload = json!({
        "title": "Loft",
        "location": "Oslo",
        "price_per_night": "90",
        "max_guests": 2
    });

    let (status, body) =
        send(&app, Method::POST, "/api/properties", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_type"], "unauthorized");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/properties",
        Some((Uuid::new_v4(), "guest")),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_rejects_out_of_range_prices() {
    let app = test_app();
    let host = Some((Uuid::new_v4(), "host"));

    for price in ["10000000000000000000000000000", "33.3333", "0"] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/properties",
            host,
            Some(json!({
                "title": "Penthouse",
                "location": "Monaco",
                "price_per_night": price,
                "max_guests": 2
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "price {}", price);
        assert_eq!(body["error_type"], "validation_error");
    }
}

#[tokio::test]
async fn search_filters_properties() {
    let app = test_app();
    let host = Uuid::new_v4();
    create_property(&app, host, "Lisbon, Portugal", "120").await;
    create_property(&app, host, "Porto, Portugal", "60").await;

    let (status, body) = send(&app, Method::GET, "/api/properties", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/properties?location=lisbon", None, None).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["location"], "Lisbon, Portugal");
    assert_eq!(items[0]["review_count"], 0);

    let (_, body) = send(&app, Method::GET, "/api/properties?max_price=100", None, None).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["price_per_night"], "60");

    let (_, body) = send(&app, Method::GET, "/api/properties?guests=5", None, None).await;
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn booking_flow_prices_and_prevents_double_booking() {
    let app = test_app();
    let host = Uuid::new_v4();
    let guest = Uuid::new_v4();
    let other_guest = Uuid::new_v4();
    let property_id = create_property(&app, host, "Lisbon", "100").await;

    let check_in = days_from_now(30);
    let check_out = days_from_now(35);

    // Quote
    let (status, quote) = send(
        &app,
        Method::POST,
        &format!("/api/properties/{}/quote", property_id),
        None,
        Some(json!({ "check_in": check_in, "check_out": check_out, "guests": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["nights"], 5);
    assert_eq!(quote["base"]["amount"], "500");
    assert_eq!(quote["service_fee"]["amount"], "50.00");
    assert_eq!(quote["total"]["amount"], "550.00");
    assert_eq!(quote["total"]["currency"], "USD");
    assert_eq!(quote["available"], true);

    // Book
    let (status, created) = send(
        &app,
        Method::POST,
        &format!("/api/properties/{}/bookings", property_id),
        Some((guest, "guest")),
        Some(booking_body(check_in, check_out)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["booking"]["status"], "pending");
    assert_eq!(created["payment"]["status"], "completed");
    assert_eq!(created["payment"]["method"], "credit_card");
    assert!(!created.to_string().contains("4111 1111"));
    assert!(!created.to_string().contains("4111111111111111"));
    let booking_id = created["booking"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/dashboard", Some((guest, "guest")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "guest");
    assert_eq!(body["bookings"]["total"], 1);
    assert_eq!(body["bookings"]["pending"], 1);

    // Overlapping stay is rejected
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/properties/{}/bookings", property_id),
        Some((other_guest, "guest")),
        Some(booking_body(days_from_now(33), days_from_now(40))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_type"], "conflict_error");

    // Search by those dates hides the property
    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/properties?check_in={}&check_out={}", days_from_now(31), days_from_now(32)),
        None,
        None,
    )
    .await;
    assert!(body["items"].as_array().unwrap().is_empty());

    // Host sees and confirms it
    let (status, body) = send(&app, Method::GET, "/api/host/bookings", Some((host, "host")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/dashboard", Some((host, "host")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "host");
    assert_eq!(body["property_count"], 1);
    assert_eq!(body["recent_bookings"][0]["id"], booking_id.as_str());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/confirm", booking_id),
        Some((host, "host")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");

    // Completion waits for check-out
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/complete", booking_id),
        Some((host, "host")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Guest cancels, dates open up again
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/bookings/{}/cancel", booking_id),
        Some((guest, "guest")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/properties/{}/bookings", property_id),
        Some((other_guest, "guest")),
        Some(booking_body(days_from_now(33), days_from_now(40))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn booking_rejects_invalid_dates() {
    let app = test_app();
    let property_id = create_property(&app, Uuid::new_v4(), "Lisbon", "100").await;
    let guest = Some((Uuid::new_v4(), "guest"));
    let uri = format!("/api/properties/{}/bookings", property_id);

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        guest,
        Some(booking_body(days_from_now(10), days_from_now(10))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "validation_error");

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        guest,
        Some(booking_body(days_from_now(-2), days_from_now(3))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        guest,
        Some(booking_body(days_from_now(10), days_from_now(410))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn property_detail_and_owner_only_updates() {
    let app = test_app();
    let host = Uuid::new_v4();
    let property_id = create_property(&app, host, "Lisbon", "100").await;
    let uri = format!("/api/properties/{}", property_id);

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["property"]["price_per_night"], "100");
    assert!(body["average_rating"].is_null());
    assert!(body["reviews"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some((Uuid::new_v4(), "host")),
        Some(json!({ "price_per_night": "80" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some((host, "host")),
        Some(json!({ "price_per_night": "80" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price_per_night"], "80");

    // Detail reflects the edit, not a stale cache entry
    let (_, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(body["property"]["price_per_night"], "80");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/properties/{}", Uuid::new_v4()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
