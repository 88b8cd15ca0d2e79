use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use dispatch_coordinator::api::rest::router;
use dispatch_coordinator::config::Config;
use dispatch_coordinator::engine::queue::BackgroundTask;
use dispatch_coordinator::engine::worker::run_task_worker;
use dispatch_coordinator::notify::{NotificationDispatcher, NotifyError, PushPayload};
use dispatch_coordinator::state::AppState;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha512;
use tokio::sync::mpsc;
use tower::ServiceExt;

const SECRET: &str = "sk_test_secret";

fn test_config() -> Config {
    Config {
        payment_webhook_secret: SECRET.to_string(),
        ..Config::default()
    }
}

fn open_all_day(state: &AppState) {
    state.catalog.update_settings(|settings| {
        settings.is_open = true;
        settings.opening_time = chrono::NaiveTime::MIN;
        settings.closing_time = chrono::NaiveTime::MIN;
    });
}

fn setup_state() -> (Arc<AppState>, mpsc::Receiver<BackgroundTask>) {
    let (state, rx) = AppState::new(&test_config());
    open_all_day(&state);
    (Arc::new(state), rx)
}

fn setup() -> (axum::Router, mpsc::Receiver<BackgroundTask>) {
    let (state, rx) = setup_state();
    (router(state), rx)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    empty_request("GET", uri)
}

fn webhook_request(body: &Value, signature: Option<String>) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri("/payment/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-paystack-signature", signature);
    }
    builder.body(Body::from(raw)).unwrap()
}

fn sign(body: &Value) -> String {
    let raw = serde_json::to_vec(body).unwrap();
    let mut mac = Hmac::<Sha512>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(&raw);
    hex::encode(mac.finalize().into_bytes())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn order_payload(order_id: &str) -> Value {
    json!({
        "orderId": order_id,
        "items": [
            { "productId": "margherita", "quantity": 2, "size": "M" },
            { "productId": "cola", "quantity": 1 }
        ],
        "user": { "email": "ada@example.com", "phone": "0801", "address": "1 Marina" },
        "total": 31.5,
        "status": "Delivered"
    })
}

async fn create_rider(app: &axum::Router, name: &str) -> String {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/riders",
            json!({ "name": name, "phone": "0800", "email": format!("{name}@riders.example.com") }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

async fn patch_status(app: &axum::Router, order_id: &str, status: &str) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/orders/{order_id}/status"),
            json!({ "status": status }),
        ))
        .await
        .unwrap()
}

async fn paid_order(app: &axum::Router, state: &AppState, order_id: &str) {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/orders", order_payload(order_id)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    state.coordinator.confirm_payment(order_id).unwrap();
}

#[derive(Default)]
struct RecordingDispatcher {
    sent: Mutex<Vec<(String, PushPayload)>>,
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify(&self, recipient: &str, payload: &PushPayload) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), payload.clone()));
        Ok(())
    }
}

struct FailingDispatcher;

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn notify(&self, recipient: &str, _payload: &PushPayload) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery(format!("endpoint for {recipient} gone")))
    }
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _rx) = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 0);
    assert_eq!(body["riders"], 0);
    assert_eq!(body["accepting_orders"], true);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _rx) = setup();
    app.clone()
        .oneshot(json_request("POST", "/orders", order_payload("M-1")))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("orders_created_total"));
    assert!(body.contains("tasks_in_queue"));
}

#[tokio::test]
async fn create_order_is_idempotent() {
    let (app, _rx) = setup();

    let first = app
        .clone()
        .oneshot(json_request("POST", "/orders", order_payload("X")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["status"], "PendingPayment");
    assert!(first["assignedRider"].is_null());

    let second = app
        .clone()
        .oneshot(json_request("POST", "/orders", order_payload("X")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(first["id"], second["id"]);

    let list = body_json(app.oneshot(get_request("/orders")).await.unwrap()).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_order_when_closed_returns_403_and_persists_nothing() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());

    let res = app
        .clone()
        .oneshot(json_request("PATCH", "/settings", json!({ "isOpen": false })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(json_request("POST", "/orders", order_payload("X")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(state.orders.is_empty());
}

#[tokio::test]
async fn create_order_with_empty_items_returns_400() {
    let (app, _rx) = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({ "orderId": "E", "items": [], "user": { "email": "ada@example.com" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_status_of_unknown_order_returns_404() {
    let (app, _rx) = setup();
    let response = patch_status(&app, "00000000-0000-0000-0000-000000000000", "Pending").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn illegal_status_transition_returns_403() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    paid_order(&app, &state, "J").await;

    let response = patch_status(&app, "J", "Delivered").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn full_delivery_flow_couples_rider_status() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    let rider_id = create_rider(&app, "dan").await;
    paid_order(&app, &state, "FLOW").await;

    let res = patch_status(&app, "FLOW", "ReadyForDelivery").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/orders/FLOW/assign-rider",
            json!({ "riderId": rider_id }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order = body_json(res).await;
    assert_eq!(order["assignedRider"], rider_id.as_str());
    assert_eq!(order["rider"]["status"], "Available");

    let res = patch_status(&app, "FLOW", "OutForDelivery").await;
    let order = body_json(res).await;
    assert_eq!(order["status"], "OutForDelivery");
    assert_eq!(order["rider"]["status"], "Busy");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/orders/FLOW/status",
            json!({ "status": "Delivered", "source": "Rider" }),
        ))
        .await
        .unwrap();
    let order = body_json(res).await;
    assert_eq!(order["status"], "Delivered");
    assert_eq!(order["deliveredBy"], "Rider");
    assert!(order["deliveredAt"].is_string());
    assert_eq!(order["rider"]["status"], "Available");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/orders/FLOW/assign-rider",
            json!({ "riderId": null }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn assign_unknown_order_returns_404() {
    let (app, _rx) = setup();
    let res = app
        .oneshot(json_request("PATCH", "/orders/ghost/assign-rider", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_ping_within_cooldown_returns_429() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    paid_order(&app, &state, "PING").await;

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/orders/PING/ping"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order = body_json(res).await;
    assert_eq!(order["pings"].as_array().unwrap().len(), 1);

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/orders/PING/ping"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key("retry-after"));

    let res = app
        .clone()
        .oneshot(empty_request("POST", "/orders/PING/acknowledge-ping"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order = body_json(res).await;
    assert_eq!(order["pings"][0]["acknowledged"], true);

    let res = app
        .oneshot(empty_request("POST", "/orders/ghost/acknowledge-ping"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_orders_are_listed_newest_first() {
    let (app, _rx) = setup();
    for order_id in ["U-1", "U-2"] {
        app.clone()
            .oneshot(json_request("POST", "/orders", order_payload(order_id)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let mut other = order_payload("U-3");
    other["user"]["email"] = json!("bob@example.com");
    app.clone()
        .oneshot(json_request("POST", "/orders", other))
        .await
        .unwrap();

    let res = app
        .oneshot(get_request("/orders/user/ada@example.com"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list = body_json(res).await;
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|order| order["orderId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["U-2", "U-1"]);
}

#[tokio::test]
async fn webhook_with_bad_signature_returns_400() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    let event = json!({
        "event": "charge.success",
        "data": { "reference": "ref-1", "metadata": { "orderData": order_payload("W-1") } }
    });

    let res = app
        .clone()
        .oneshot(webhook_request(&event, Some("deadbeef".to_string())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app.oneshot(webhook_request(&event, None)).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(state.orders.is_empty());
}

#[tokio::test]
async fn webhook_charge_success_creates_and_confirms_order() {
    let (state, _rx) = setup_state();
    state.catalog.update_settings(|settings| settings.is_open = false);
    let app = router(state.clone());
    let event = json!({
        "event": "charge.success",
        "data": { "reference": "ref-2", "metadata": { "orderData": order_payload("W-2") } }
    });

    for _ in 0..2 {
        let res = app
            .clone()
            .oneshot(webhook_request(&event, Some(sign(&event))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    assert_eq!(state.orders.len(), 1);
    let order = state.coordinator.find_order("W-2").unwrap();
    assert_eq!(order.status.as_str(), "Pending");
}

#[tokio::test]
async fn verified_webhook_is_acknowledged_even_when_unhandled() {
    let (app, _rx) = setup();

    let unknown_order = json!({
        "event": "charge.success",
        "data": { "reference": "ref-3", "metadata": { "orderId": "missing" } }
    });
    let res = app
        .clone()
        .oneshot(webhook_request(&unknown_order, Some(sign(&unknown_order))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let other_event = json!({ "event": "transfer.success", "data": {} });
    let res = app
        .oneshot(webhook_request(&other_event, Some(sign(&other_event))))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn background_worker_ranks_best_sellers_and_sends_push() {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let (state, rx) = AppState::with_notifier(&test_config(), dispatcher.clone());
    open_all_day(&state);
    let state = Arc::new(state);
    tokio::spawn(run_task_worker(state.clone(), rx));
    let app = router(state.clone());

    for (id, category) in [("margherita", "Pizza"), ("pepperoni", "Pizza"), ("cola", "Drinks")] {
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/products",
                json!({ "id": id, "name": id, "category": category }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    paid_order(&app, &state, "BS-1").await;
    patch_status(&app, "BS-1", "ReadyForDelivery").await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let products = body_json(app.oneshot(get_request("/products")).await.unwrap()).await;
    let flags: Vec<(String, bool, u64)> = products
        .as_array()
        .unwrap()
        .iter()
        .map(|product| {
            (
                product["id"].as_str().unwrap().to_string(),
                product["isAutomatedBestSeller"].as_bool().unwrap(),
                product["salesCount"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        flags,
        vec![
            ("margherita".to_string(), true, 2),
            ("pepperoni".to_string(), false, 0),
            ("cola".to_string(), true, 1),
        ]
    );

    let sent = dispatcher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "ada@example.com");
    assert_eq!(sent[0].1.data.order_id, "BS-1");
}

#[tokio::test]
async fn notification_failure_does_not_affect_status_change() {
    let (state, rx) = AppState::with_notifier(&test_config(), Arc::new(FailingDispatcher));
    open_all_day(&state);
    let state = Arc::new(state);
    tokio::spawn(run_task_worker(state.clone(), rx));
    let app = router(state.clone());
    paid_order(&app, &state, "NF").await;

    let res = patch_status(&app, "NF", "ReadyForDelivery").await;
    assert_eq!(res.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let metrics = state.metrics.encode().unwrap();
    assert!(metrics.contains(r#"background_tasks_total{kind="push",outcome="error"} 1"#));
    assert_eq!(
        state.coordinator.find_order("NF").unwrap().status.as_str(),
        "ReadyForDelivery"
    );
}

#[tokio::test]
async fn admin_can_suspend_and_locate_riders() {
    let (app, _rx) = setup();
    let rider_id = create_rider(&app, "eve").await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/riders/{rider_id}"),
            json!({ "status": "Suspended" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "Suspended");

    let res = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/riders/{rider_id}/location"),
            json!({ "location": { "lat": 6.45, "lng": 3.39 } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rider = body_json(res).await;
    assert_eq!(rider["location"]["lat"], 6.45);
    assert!(rider["location"]["updatedAt"].is_string());

    let res = app
        .oneshot(json_request(
            "POST",
            "/riders",
            json!({ "name": "Eve 2", "phone": "0801", "email": "EVE@riders.example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn promo_usage_is_counted_on_order_creation() {
    let (app, _rx) = setup();
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/promos",
            json!({ "code": "welcome", "discountPercent": 20, "usageLimit": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["isValid"], true);

    let mut payload = order_payload("PROMO-1");
    payload["promoCode"] = json!("WELCOME");
    app.clone()
        .oneshot(json_request("POST", "/orders", payload))
        .await
        .unwrap();

    let promos = body_json(app.oneshot(get_request("/promos")).await.unwrap()).await;
    assert_eq!(promos[0]["code"], "WELCOME");
    assert_eq!(promos[0]["usedCount"], 1);
    assert_eq!(promos[0]["isValid"], false);
}

#[tokio::test]
async fn malformed_bodies_return_400_with_error_body() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    paid_order(&app, &state, "BAD").await;

    let mut negative_quantity = order_payload("NEG");
    negative_quantity["items"][0]["quantity"] = json!(-1);
    let mut missing_order_id = order_payload("MISSING");
    missing_order_id.as_object_mut().unwrap().remove("orderId");

    let requests = [
        json_request("POST", "/orders", negative_quantity),
        json_request("POST", "/orders", missing_order_id),
        json_request("PATCH", "/orders/BAD/status", json!({ "status": "Shipped" })),
        json_request("PATCH", "/orders/BAD/assign-rider", json!({ "riderId": "not-a-uuid" })),
        json_request("PATCH", "/riders/not-a-uuid", json!({ "status": "Offline" })),
    ];

    for request in requests {
        let uri = request.uri().to_string();
        let res = app.clone().oneshot(request).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(res).await;
        assert!(body["error"].is_string(), "{uri}");
    }

    assert_eq!(state.orders.len(), 1);
}

#[tokio::test]
async fn ratings_require_a_known_order() {
    let (state, _rx) = setup_state();
    let app = router(state.clone());
    let mut events = state.events.receiver();
    paid_order(&app, &state, "RATE").await;

    let res = app
        .clone()
        .oneshot(json_request("POST", "/ratings", json!({ "orderId": "ghost", "rating": 4 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .clone()
        .oneshot(json_request("POST", "/ratings", json!({ "orderId": "RATE", "rating": 9 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/ratings",
            json!({ "orderId": "RATE", "rating": 5, "comment": "hot and fast" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let rating = body_json(res).await;
    assert_eq!(rating["sentiment"], "Positive");

    let ratings = body_json(app.oneshot(get_request("/ratings")).await.unwrap()).await;
    assert_eq!(ratings.as_array().unwrap().len(), 1);

    let mut published = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        published.push(envelope.event.name());
    }
    assert!(published.contains(&"ratingCreated"));
}

#[tokio::test]
async fn push_is_skipped_until_customer_subscribes() {
    let (state, rx) = AppState::new(&test_config());
    open_all_day(&state);
    let state = Arc::new(state);
    tokio::spawn(run_task_worker(state.clone(), rx));
    let app = router(state.clone());
    paid_order(&app, &state, "SUB").await;

    patch_status(&app, "SUB", "ReadyForDelivery").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let metrics = state.metrics.encode().unwrap();
    assert!(metrics.contains(r#"background_tasks_total{kind="push",outcome="skipped"} 1"#));

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/notifications/subscribe",
            json!({
                "email": "Ada@Example.com",
                "subscription": {
                    "endpoint": "https://push.example.com/ada",
                    "keys": { "p256dh": "p256", "auth": "auth" }
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    patch_status(&app, "SUB", "Pending").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let metrics = state.metrics.encode().unwrap();
    assert!(metrics.contains(r#"background_tasks_total{kind="push",outcome="success"} 1"#));

    let res = app
        .oneshot(json_request(
            "POST",
            "/notifications/subscribe",
            json!({
                "email": "ada@example.com",
                "subscription": { "endpoint": "http://insecure", "keys": { "p256dh": "a", "auth": "b" } }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customers_are_aggregated_from_orders() {
    let (app, _rx) = setup();
    let mut first = order_payload("C-1");
    first["total"] = json!(10.0);
    let mut second = order_payload("C-2");
    second["total"] = json!(12.5);
    for payload in [first, second] {
        app.clone()
            .oneshot(json_request("POST", "/orders", payload))
            .await
            .unwrap();
    }

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users/profile",
            json!({ "email": "ada@example.com", "phone": "0900" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let customers = body_json(app.clone().oneshot(get_request("/users")).await.unwrap()).await;
    assert_eq!(customers.as_array().unwrap().len(), 1);
    assert_eq!(customers[0]["email"], "ada@example.com");
    assert_eq!(customers[0]["orderCount"], 2);
    assert_eq!(customers[0]["totalSpent"], 22.5);
    assert_eq!(customers[0]["phone"], "0900");
    assert_eq!(customers[0]["address"], "1 Marina");

    let res = app
        .oneshot(get_request("/users/profile/nobody@example.com"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn promo_validation_checks_cart_categories() {
    let (app, _rx) = setup();
    app.clone()
        .oneshot(json_request(
            "POST",
            "/promos",
            json!({
                "code": "pizza20",
                "discountPercent": 20,
                "usageLimit": 10,
                "applicableCategories": ["Pizza"]
            }),
        ))
        .await
        .unwrap();

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/promos/validate",
            json!({ "code": "PIZZA20", "cartItems": [{ "category": "Pizza" }] }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["discountPercent"], 20.0);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/promos/validate",
            json!({ "code": "PIZZA20", "cartItems": [{ "category": "Drinks" }] }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(json_request("POST", "/promos/validate", json!({ "code": "NOPE" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
