//! Integration tests for the API server.
//!
//! These drive the whole pipeline the way the deployed system runs it:
//! HTTP placement, the outbox publisher cycle, the saga over the broker,
//! and the Inventory service's reservation handler.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use api::AppServices;
use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use messaging::topics;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup() -> (axum::Router, AppServices) {
    let config = Config {
        // Tight timings so timeout-path tests stay fast; the publisher is
        // driven by hand via run_once.
        reservation_timeout_ms: 2000,
        ..Config::default()
    };
    let services = api::wire_in_memory(&config).await.unwrap();
    let app = api::create_app(Arc::clone(&services.state), get_metrics_handle());
    (app, services)
}

/// Polls until the condition holds or two seconds pass.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

fn place_order_body(product_id: &str, quantity: u32) -> Body {
    Body::from(
        serde_json::to_string(&serde_json::json!({
            "customerId": uuid::Uuid::new_v4().to_string(),
            "productId": product_id,
            "quantity": quantity,
            "unitPriceCents": 1250,
            "createdBy": "alice"
        }))
        .unwrap(),
    )
}

async fn post_order(app: &axum::Router, product_id: &str, quantity: u32) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/orders")
                .header("content-type", "application/json")
                .body(place_order_body(product_id, quantity))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _services) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_place_order_creates_order_and_outbox_record() {
    let (app, services) = setup().await;
    services.ledger.register_product("SKU-001", "Widget");
    services.ledger.set_stock("SKU-001", "WH-A", 10);

    let response = post_order(&app, "SKU-001", 5).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = get_json(response).await;
    assert_eq!(json["productId"], "SKU-001");
    assert_eq!(json["quantity"], 5);
    assert_eq!(json["totalCents"], 6250);
    assert!(json["id"].as_str().is_some());

    assert_eq!(services.order_store.order_count(), 1);
    assert_eq!(services.order_store.unprocessed_count(), 1);
}

#[tokio::test]
async fn test_insufficient_stock_is_rejected_synchronously() {
    let (app, services) = setup().await;
    services.ledger.set_stock("SKU-001", "WH-A", 3);

    let response = post_order(&app, "SKU-001", 5).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json(response).await;
    assert_eq!(json["error"], "insufficient stock");

    // Nothing was created.
    assert_eq!(services.order_store.order_count(), 0);
    assert_eq!(services.order_store.outbox_count(), 0);
}

#[tokio::test]
async fn test_unknown_product_is_rejected() {
    let (app, services) = setup().await;

    let response = post_order(&app, "SKU-404", 1).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json(response).await;
    assert_eq!(json["error"], "product not found");
    assert_eq!(services.order_store.order_count(), 0);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let (app, services) = setup().await;
    services.ledger.set_stock("SKU-001", "WH-A", 10);

    let response = post_order(&app, "SKU-001", 0).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(services.order_store.order_count(), 0);
}

#[tokio::test]
async fn test_get_order_roundtrip() {
    let (app, services) = setup().await;
    services.ledger.set_stock("SKU-001", "WH-A", 10);

    let created = get_json(post_order(&app, "SKU-001", 2).await).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["id"], id);
    assert_eq!(json["quantity"], 2);
}

#[tokio::test]
async fn test_get_unknown_order_is_404() {
    let (app, _services) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_sums_across_warehouses() {
    let (app, services) = setup().await;
    services.ledger.register_product("SKU-001", "Widget");
    services.ledger.set_stock("SKU-001", "WH-A", 6);
    services.ledger.set_stock("SKU-001", "WH-B", 4);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/inventory/availability?productId=SKU-001&quantity=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_json(response).await;
    assert_eq!(json["isAvailable"], true);
    assert_eq!(json["productId"], "SKU-001");
    assert_eq!(json["productName"], "Widget");
    assert_eq!(json["availableQuantity"], 10);
    assert_eq!(json["message"], "available");
}

#[tokio::test]
async fn test_availability_reports_insufficient_stock() {
    let (app, services) = setup().await;
    services.ledger.set_stock("SKU-001", "WH-A", 3);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/inventory/availability?productId=SKU-001&quantity=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json(response).await;
    assert_eq!(json["isAvailable"], false);
    assert_eq!(json["availableQuantity"], 3);
    assert_eq!(json["message"], "insufficient stock");
}

#[tokio::test]
async fn test_availability_for_unknown_product() {
    let (app, _services) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/inventory/availability?productId=SKU-404&quantity=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_json(response).await;
    assert_eq!(json["isAvailable"], false);
    assert_eq!(json["message"], "product not found");
}

#[tokio::test]
async fn test_end_to_end_reservation_reduces_stock() {
    let (app, services) = setup().await;
    services.ledger.register_product("SKU-001", "Widget");
    services.ledger.set_stock("SKU-001", "WH-A", 10);

    let response = post_order(&app, "SKU-001", 5).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The order waits in the outbox until a publisher cycle runs.
    assert_eq!(services.ledger.total_for("SKU-001"), 10);
    assert_eq!(services.publisher.run_once().await.unwrap(), 1);

    let ledger = services.ledger.clone();
    wait_until(move || ledger.total_for("SKU-001") == 5).await;

    assert_eq!(services.broker.published_count(topics::ORDER_CANCELLED), 0);
    assert_eq!(services.order_store.unprocessed_count(), 0);
}

#[tokio::test]
async fn test_stock_drained_between_pre_check_and_reservation() {
    let (app, services) = setup().await;
    services.ledger.register_product("SKU-001", "Widget");
    services.ledger.set_stock("SKU-001", "WH-A", 10);

    let response = post_order(&app, "SKU-001", 5).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = get_json(response).await;

    // A concurrent reservation drains the product before the saga's
    // request arrives.
    services.ledger.set_stock("SKU-001", "WH-A", 0);
    services.publisher.run_once().await.unwrap();

    let broker = services.broker.clone();
    wait_until(move || broker.published_count(topics::ORDER_CANCELLED) == 1).await;

    let cancellations = services.broker.published_on(topics::ORDER_CANCELLED);
    let cancelled: messaging::OrderCancelled =
        messaging::decode_message(cancellations[0].clone()).unwrap();
    assert_eq!(cancelled.reason, "insufficient stock");
    assert_eq!(cancelled.quantity, 5);

    // The order row survives; it is just never fulfilled.
    let id = order["id"].as_str().unwrap();
    let lookup = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orders/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(lookup.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let (app, _services) = setup().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
