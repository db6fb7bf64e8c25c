//! End-to-end tests: REST writes observed over the WebSocket channel.
//!
//! Binds a real listener, talks HTTP with `reqwest` and WebSocket with
//! `tokio-tungstenite`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use expert_booking_core::{ExpertId, ExpertRooms};
use expert_booking_server::{BookingApp, Config};
use expert_booking_testing::expert_with_slots;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const DATE: &str = "2024-06-01";

async fn spawn_app(app: &BookingApp) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Next JSON text frame, skipping keep-alives.
async fn next_json<S>(ws: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn wait_for_room(rooms: &ExpertRooms, expert: ExpertId, size: usize) {
    for _ in 0..50 {
        if rooms.room_size(expert).await == size {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("room never reached size {size}");
}

fn booking_body(expert: ExpertId, email: &str) -> Value {
    json!({
        "expert": expert.to_string(),
        "name": "Ada Lovelace",
        "email": email,
        "phone": "+44 20 7946 0000",
        "date": DATE,
        "timeSlot": { "startTime": "09:00", "endTime": "10:00" }
    })
}

#[tokio::test]
async fn test_slot_events_follow_booking_lifecycle() {
    let app = BookingApp::new(Config::default()).await.unwrap();
    let expert = expert_with_slots("Dr. E1", "Medical", DATE, &["09:00"]);
    let expert_id = expert.id;
    app.storage().provision(expert).await.unwrap();
    let addr = spawn_app(&app).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text(
        json!({ "type": "joinExpertRoom", "expertId": expert_id.to_string() }).to_string(),
    ))
    .await
    .unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "joined");
    wait_for_room(app.rooms(), expert_id, 1).await;

    let http = reqwest::Client::new();
    let created: Value = http
        .post(format!("http://{addr}/api/bookings"))
        .json(&booking_body(expert_id, "a@x.io"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let booking_id = created["data"]["id"].as_str().unwrap().to_string();

    let booked = next_json(&mut ws).await;
    assert_eq!(booked["type"], "slotBooked");
    assert_eq!(booked["expertId"], expert_id.to_string());
    assert_eq!(booked["date"], DATE);
    assert_eq!(booked["timeSlot"]["startTime"], "09:00");

    let status_uri = format!("http://{addr}/api/bookings/{booking_id}/status");
    let response = http
        .patch(&status_uri)
        .json(&json!({ "status": "Confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let updated = next_json(&mut ws).await;
    assert_eq!(updated["type"], "slotStatusUpdated");
    assert_eq!(updated["status"], "Confirmed");

    http.patch(&status_uri)
        .json(&json!({ "status": "Cancelled" }))
        .send()
        .await
        .unwrap();
    let freed = next_json(&mut ws).await;
    assert_eq!(freed["type"], "slotAvailable");
    assert!(freed.get("status").is_none());
}

#[tokio::test]
async fn test_events_scoped_to_joined_expert() {
    let app = BookingApp::new(Config::default()).await.unwrap();
    let watched = expert_with_slots("Dr. Watched", "Medical", DATE, &["09:00"]);
    let other = expert_with_slots("Dr. Other", "Legal", DATE, &["09:00"]);
    let (watched_id, other_id) = (watched.id, other.id);
    app.storage().provision(watched).await.unwrap();
    app.storage().provision(other).await.unwrap();
    let addr = spawn_app(&app).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text(
        json!({ "type": "joinExpertRoom", "expertId": watched_id.to_string() }).to_string(),
    ))
    .await
    .unwrap();
    next_json(&mut ws).await;
    wait_for_room(app.rooms(), watched_id, 1).await;

    let http = reqwest::Client::new();
    for expert in [other_id, watched_id] {
        let response = http
            .post(format!("http://{addr}/api/bookings"))
            .json(&booking_body(expert, "a@x.io"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    // The first event seen belongs to the watched expert
    let event = next_json(&mut ws).await;
    assert_eq!(event["expertId"], watched_id.to_string());
}

#[tokio::test]
async fn test_connection_cap_from_config() {
    let config = Config::from_source(|key| (key == "WS_MAX_CONNECTIONS").then(|| "1".to_string()));
    let app = BookingApp::new(config).await.unwrap();
    let addr = spawn_app(&app).await;

    let (_first, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let Err(tokio_tungstenite::tungstenite::Error::Http(response)) =
        connect_async(format!("ws://{addr}/ws")).await
    else {
        panic!("second connection should be refused");
    };
    assert_eq!(response.status().as_u16(), 503);
}
