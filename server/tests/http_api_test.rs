//! HTTP API tests.
//!
//! Drive the full router in memory with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use expert_booking_core::{BookingId, Expert, ExpertId, SlotKey, SlotStatus};
use expert_booking_server::{BookingApp, Config};
use expert_booking_testing::{expert_with_slots, one_hour};
use serde_json::{Value, json};
use tower::ServiceExt;

const DATE: &str = "2024-06-01";

async fn app_with(experts: Vec<Expert>) -> (BookingApp, Router) {
    let app = BookingApp::new(Config::default()).await.unwrap();
    for expert in experts {
        app.storage().provision(expert).await.unwrap();
    }
    let router = app.router();
    (app, router)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn booking_body(expert: ExpertId, start: &str, email: &str) -> Value {
    let range = one_hour(start);
    json!({
        "expert": expert.to_string(),
        "name": "Ada Lovelace",
        "email": email,
        "phone": "+44 20 7946 0000",
        "date": DATE,
        "timeSlot": { "startTime": range.start_time, "endTime": range.end_time },
        "notes": "First consultation"
    })
}

async fn slot_status(app: &BookingApp, expert: ExpertId, start: &str) -> (SlotStatus, Option<BookingId>) {
    let key = SlotKey::new(expert, DATE, one_hour(start));
    let slot = app
        .coordinator()
        .environment()
        .calendar
        .find_slot(&key)
        .await
        .unwrap()
        .expect("slot exists");
    (slot.status(), slot.booking_id())
}

#[tokio::test]
async fn test_reserve_conflict_cancel_rebook() {
    let expert = expert_with_slots("Dr. E1", "Medical", DATE, &["09:00"]);
    let expert_id = expert.id;
    let (app, router) = app_with(vec![expert]).await;

    let (status, body) = send(&router, Method::POST, "/api/bookings", Some(booking_body(expert_id, "09:00", "a@x.io"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Booking created successfully");
    assert_eq!(body["data"]["status"], "Pending");
    assert_eq!(body["data"]["timeSlot"]["startTime"], "09:00");
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(slot_status(&app, expert_id, "09:00").await.0, SlotStatus::Pending);

    let (status, body) = send(&router, Method::POST, "/api/bookings", Some(booking_body(expert_id, "09:00", "b@x.io"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(body["message"], "This time slot is already booked");

    let uri = format!("/api/bookings/{booking_id}/status");
    let (status, body) = send(&router, Method::PATCH, &uri, Some(json!({ "status": "Cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Booking status updated to Cancelled");
    assert_eq!(body["data"]["status"], "Cancelled");
    assert_eq!(slot_status(&app, expert_id, "09:00").await, (SlotStatus::Available, None));

    let (status, _) = send(&router, Method::POST, "/api/bookings", Some(booking_body(expert_id, "09:00", "c@x.io"))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_confirm_mirrors_onto_expert_calendar() {
    let expert = expert_with_slots("Dr. E1", "Medical", DATE, &["09:00", "10:00"]);
    let expert_id = expert.id;
    let (_app, router) = app_with(vec![expert]).await;

    let (_, body) = send(&router, Method::POST, "/api/bookings", Some(booking_body(expert_id, "10:00", "a@x.io"))).await;
    let booking_id = body["data"]["id"].as_str().unwrap().to_string();
    send(&router, Method::PATCH, &format!("/api/bookings/{booking_id}/status"), Some(json!({ "status": "Confirmed" }))).await;

    let (status, body) = send(&router, Method::GET, &format!("/api/experts/{expert_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["data"]["availableSlots"][0]["timeSlots"].as_array().unwrap().clone();
    assert_eq!(slots[0]["isAvailable"], true);
    assert_eq!(slots[1]["status"], "Confirmed");
    assert_eq!(slots[1]["isAvailable"], false);
    assert_eq!(slots[1]["bookingId"], booking_id.as_str());
}

#[tokio::test]
async fn test_create_booking_validation() {
    let expert = expert_with_slots("Dr. E1", "Medical", DATE, &["09:00"]);
    let expert_id = expert.id;
    let (_app, router) = app_with(vec![expert]).await;

    let (status, body) = send(&router, Method::POST, "/api/bookings", Some(json!({ "expert": expert_id.to_string(), "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "All fields are required");
    let fields: Vec<&str> = body["details"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"timeSlot.startTime"));

    let (status, body) = send(&router, Method::POST, "/api/bookings", Some(booking_body(expert_id, "09:00", "not-an-email"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["fields"][0]["field"], "email");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/bookings")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_expert_is_not_found() {
    let (_app, router) = app_with(Vec::new()).await;

    let (status, body) = send(&router, Method::POST, "/api/bookings", Some(booking_body(ExpertId::new(), "09:00", "a@x.io"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Expert not found");

    let mut malformed = booking_body(ExpertId::new(), "09:00", "a@x.io");
    malformed["expert"] = json!("12345");
    let (status, _) = send(&router, Method::POST, "/api/bookings", Some(malformed)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_update_errors() {
    let (_app, router) = app_with(Vec::new()).await;
    let uri = format!("/api/bookings/{}/status", BookingId::new());

    let (status, body) = send(&router, Method::PATCH, &uri, Some(json!({ "status": "Archived" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status");

    let (status, body) = send(&router, Method::PATCH, &uri, Some(json!({ "status": "Confirmed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Booking not found");

    let (status, _) = send(&router, Method::PATCH, "/api/bookings/nope/status", Some(json!({ "status": "Confirmed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_bookings_by_email() {
    let first = expert_with_slots("Dr. E1", "Medical", DATE, &["09:00", "10:00", "11:00"]);
    let (first_id, first_name) = (first.id, first.name.clone());
    let (_app, router) = app_with(vec![first]).await;

    send(&router, Method::POST, "/api/bookings", Some(booking_body(first_id, "09:00", "Ada@X.io"))).await;
    send(&router, Method::POST, "/api/bookings", Some(booking_body(first_id, "10:00", "ada@x.io"))).await;
    send(&router, Method::POST, "/api/bookings", Some(booking_body(first_id, "11:00", "other@x.io"))).await;

    let (status, body) = send(&router, Method::GET, "/api/bookings?email=ADA%40X.IO", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["timeSlot"]["startTime"], "10:00");
    assert_eq!(data[0]["expert"]["name"], first_name.as_str());
    assert_eq!(data[1]["email"], "ada@x.io");

    let (status, body) = send(&router, Method::GET, "/api/bookings", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email parameter is required");
}

#[tokio::test]
async fn test_expert_listing() {
    let experts = vec![
        expert_with_slots("Dr. Alice", "Medical", DATE, &["09:00"]),
        expert_with_slots("Bob Law", "Legal", DATE, &["09:00"]),
        expert_with_slots("Dr. Carol", "Medical", DATE, &["09:00"]),
    ];
    let (_app, router) = app_with(experts).await;

    let (status, body) = send(&router, Method::GET, "/api/experts?search=DR&category=Medical&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({ "page": 1, "limit": 1, "total": 2, "pages": 2 }));

    let (_, body) = send(&router, Method::GET, "/api/experts/categories", None).await;
    assert_eq!(body["data"], json!(["Legal", "Medical"]));

    let (status, body) = send(&router, Method::GET, &format!("/api/experts/{}", ExpertId::new()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Expert not found");
}

#[tokio::test]
async fn test_operational_endpoints() {
    let (_app, router) = app_with(Vec::new()).await;

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-correlation-id"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"API is running...");

    let (status, body) = send(&router, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    // No recorder installed in tests
    let (status, body) = send(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_cors_allows_local_origins_in_development() {
    let (_app, router) = app_with(Vec::new()).await;

    let preflight = |origin: &'static str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/bookings")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let response = router.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:3000"
    );

    let response = router.clone().oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
