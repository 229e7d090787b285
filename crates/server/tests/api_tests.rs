use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use chrono::{DateTime, Utc};
use tower::ServiceExt;

use slotguard_coordinator::CoordinatorBuilder;
use slotguard_core::{SlotGranularity, SlotKey};
use slotguard_reservations_memory::MemoryReservationStore;
use slotguard_server::api::AppState;
use slotguard_state_memory::MemoryLockStore;

// -- Helpers --------------------------------------------------------------

fn build_test_state() -> AppState {
    let coordinator = CoordinatorBuilder::new()
        .lock_store(Arc::new(MemoryLockStore::new()))
        .reservations(Arc::new(MemoryReservationStore::new()))
        .lock_ttl(Duration::from_secs(10))
        .store_timeout(Duration::from_secs(2))
        .build()
        .expect("coordinator should build");
    AppState::new(coordinator)
}

fn build_app(state: AppState) -> axum::Router {
    slotguard_server::api::router(state)
}

fn book_body(user: &str, analyst: &str, slot_time: &str) -> String {
    serde_json::json!({
        "user_id": user,
        "analyst_id": analyst,
        "slot_time": slot_time,
    })
    .to_string()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post_book(body: String) -> Request<Body> {
    Request::builder()
        .method(http::Method::POST)
        .uri("/api/booking/book")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(http::Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_service_name() {
    let app = build_app(build_test_state());
    let (status, json) = send(&app, get("/api/booking/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "booking-service");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = build_app(build_test_state());
    let (status, json) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["endpoints"]["health"], "/api/booking/health");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = build_app(build_test_state());
    let response = app.oneshot(get("/api/booking/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert!(headers.contains_key("strict-transport-security"));
}

#[tokio::test]
async fn book_free_slot_returns_reservation() {
    let app = build_app(build_test_state());
    let (status, json) = send(
        &app,
        post_book(book_body("test-user-123", "analyst-456", "2025-12-30T10:00:00Z")),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["user_id"], "test-user-123");
    assert_eq!(json["analyst_id"], "analyst-456");
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["duration_minutes"], 30);
    assert!(json["id"].is_string());
}

#[tokio::test]
async fn second_booking_of_same_slot_conflicts() {
    let app = build_app(build_test_state());
    let (first, _) = send(
        &app,
        post_book(book_body("user-a", "A1", "2025-12-30T10:00:00Z")),
    )
    .await;
    assert_eq!(first, StatusCode::OK);

    // Sub-second difference addresses the same slot.
    let (status, json) = send(
        &app,
        post_book(book_body("user-b", "A1", "2025-12-30T10:00:00.400Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["reason"], "already_booked");
    assert_eq!(json["retryable"], false);
    assert_eq!(json["error"], "slot already booked or locked by another user");
}

#[tokio::test]
async fn held_lock_is_reported_as_retryable_conflict() {
    let state = build_test_state();
    let app = build_app(state.clone());

    let at: DateTime<Utc> = "2025-12-30T11:00:00Z".parse().unwrap();
    let slot = SlotKey::new("A2", at, SlotGranularity::Second);
    let lease = state
        .coordinator
        .lock_manager()
        .lease(&slot)
        .await
        .unwrap()
        .expect("lock should be free");

    let (status, json) = send(
        &app,
        post_book(book_body("user-c", "A2", "2025-12-30T11:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["reason"], "contended");
    assert_eq!(json["retryable"], true);

    lease.release().await.unwrap();
    let (status, _) = send(
        &app,
        post_book(book_body("user-c", "A2", "2025-12-30T11:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "retry after release should succeed");
}

#[tokio::test]
async fn invalid_duration_is_bad_request() {
    let app = build_app(build_test_state());
    let body = serde_json::json!({
        "user_id": "u1",
        "analyst_id": "A1",
        "slot_time": "2025-12-30T10:00:00Z",
        "duration_minutes": 0,
    })
    .to_string();
    let (status, json) = send(&app, post_book(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("duration_minutes"));
}

#[tokio::test]
async fn my_bookings_lists_only_callers_reservations() {
    let app = build_app(build_test_state());
    for (user, at) in [
        ("u1", "2025-12-30T09:00:00Z"),
        ("u1", "2025-12-30T12:00:00Z"),
        ("u2", "2025-12-30T13:00:00Z"),
    ] {
        let (status, _) = send(&app, post_book(book_body(user, "A1", at))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(&app, get("/api/booking/my-bookings?user_id=u1")).await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["slot_time"], "2025-12-30T12:00:00Z");
    assert!(list.iter().all(|r| r["user_id"] == "u1"));

    let (_, json) = send(&app, get("/api/booking/my-bookings?user_id=nobody")).await;
    assert_eq!(json, serde_json::json!([]));
}

#[tokio::test]
async fn cancel_frees_the_slot() {
    let app = build_app(build_test_state());
    let (_, booked) = send(
        &app,
        post_book(book_body("u1", "A3", "2025-12-30T15:00:00Z")),
    )
    .await;
    let id = booked["id"].as_str().unwrap().to_owned();

    // Someone else cannot cancel it.
    let (status, json) = send(&app, delete(&format!("/api/booking/{id}?user_id=u2"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Booking not found");

    let (status, json) = send(&app, delete(&format!("/api/booking/{id}?user_id=u1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking cancelled successfully");

    let (status, _) = send(&app, delete(&format!("/api/booking/{id}?user_id=u1"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "second cancel finds nothing");

    let (status, json) = send(&app, get(&format!("/api/booking/{id}?user_id=u1"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");

    let (status, _) = send(
        &app,
        post_book(book_body("u2", "A3", "2025-12-30T15:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "cancelled slot can be rebooked");
}

#[tokio::test]
async fn get_booking_hides_other_users_rows() {
    let app = build_app(build_test_state());
    let (_, booked) = send(
        &app,
        post_book(book_body("owner", "A4", "2025-12-30T16:00:00Z")),
    )
    .await;
    let id = booked["id"].as_str().unwrap();

    let (status, _) = send(&app, get(&format!("/api/booking/{id}?user_id=intruder"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/api/booking/does-not-exist?user_id=owner")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_posts_confirm_exactly_one() {
    let app = build_app(build_test_state());
    let mut handles = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(
                &app,
                post_book(book_body(&format!("user-{i}"), "A5", "2025-12-30T17:00:00Z")),
            )
            .await
            .0
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 1);
}

#[tokio::test]
async fn metrics_track_outcomes() {
    let app = build_app(build_test_state());
    let body = || book_body("u1", "A6", "2025-12-30T18:00:00Z");
    send(&app, post_book(body())).await;
    send(&app, post_book(body())).await;

    let (status, json) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["attempts"], 2);
    assert_eq!(json["confirmed"], 1);
    assert_eq!(json["already_booked"], 1);
    assert_eq!(json["lock_acquired"], json["lock_released"]);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_app(build_test_state());
    let (status, json) = send(&app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/booking/book"].is_object());
}
