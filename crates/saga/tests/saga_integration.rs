//! Integration tests for the order-placement saga.
//!
//! These tests drive the coordinator through the broker the way the
//! deployed system does, including the response-vs-timeout race.

use std::sync::Arc;
use std::time::Duration;

use common::{CorrelationId, OrderId, ProductId};
use messaging::{
    InMemoryBroker, MessageBroker, OrderCancelled, OrderPlaced, ReserveStockRequest,
    ReserveStockResponse, decode_message, publish_message, topics,
};
use saga::{REASON_TIMEOUT, SagaCoordinator, SagaPhase, listener};

fn order_placed() -> OrderPlaced {
    OrderPlaced {
        correlation_id: CorrelationId::new(),
        order_id: OrderId::new(),
        product_id: ProductId::new("SKU-001"),
        quantity: 5,
    }
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

#[tokio::test]
async fn test_timeout_cancels_the_order() {
    let broker = InMemoryBroker::new();
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::new(broker.clone())).with_timeout(Duration::from_millis(50)),
    );
    let event = order_placed();

    // Nobody serves the request topic, so the timeout is the only exit.
    coordinator.handle_order_placed(event.clone()).await;

    let store = coordinator.store().clone();
    let correlation_id = event.correlation_id;
    wait_until(move || {
        store
            .get(correlation_id)
            .is_some_and(|i| i.is_finalized())
    })
    .await;

    let instance = coordinator.store().get(event.correlation_id).unwrap();
    assert_eq!(instance.phase(), SagaPhase::Cancelled);
    assert_eq!(instance.cancellation_reason(), Some(REASON_TIMEOUT));

    let cancellations = broker.published_on(topics::ORDER_CANCELLED);
    assert_eq!(cancellations.len(), 1);
    let cancelled: OrderCancelled = decode_message(cancellations[0].clone()).unwrap();
    assert_eq!(cancelled.reason, REASON_TIMEOUT);
}

#[tokio::test]
async fn test_late_response_after_timeout_is_a_no_op() {
    let broker = InMemoryBroker::new();
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::new(broker.clone())).with_timeout(Duration::from_millis(50)),
    );
    let event = order_placed();

    coordinator.handle_order_placed(event.clone()).await;

    let store = coordinator.store().clone();
    let correlation_id = event.correlation_id;
    wait_until(move || {
        store
            .get(correlation_id)
            .is_some_and(|i| i.is_finalized())
    })
    .await;

    // The success response arrives after the timeout already finalized.
    coordinator
        .handle_response(ReserveStockResponse {
            correlation_id: event.correlation_id,
            order_id: event.order_id,
            success: true,
            reason: None,
        })
        .await;

    let instance = coordinator.store().get(event.correlation_id).unwrap();
    assert_eq!(instance.phase(), SagaPhase::Cancelled);
    assert_eq!(broker.published_count(topics::ORDER_CANCELLED), 1);
}

#[tokio::test]
async fn test_timely_response_makes_the_timeout_a_no_op() {
    let broker = InMemoryBroker::new();
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::new(broker.clone())).with_timeout(Duration::from_millis(100)),
    );
    let event = order_placed();

    coordinator.handle_order_placed(event.clone()).await;
    coordinator
        .handle_response(ReserveStockResponse {
            correlation_id: event.correlation_id,
            order_id: event.order_id,
            success: true,
            reason: None,
        })
        .await;

    // Outlive the armed timeout, then confirm it changed nothing.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let instance = coordinator.store().get(event.correlation_id).unwrap();
    assert_eq!(instance.phase(), SagaPhase::Completed);
    assert_eq!(broker.published_count(topics::ORDER_CANCELLED), 0);
}

#[tokio::test]
async fn test_end_to_end_over_the_broker() {
    let inner = InMemoryBroker::new();
    let broker: Arc<dyn MessageBroker> = Arc::new(inner.clone());
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::clone(&broker)).with_timeout(Duration::from_secs(5)),
    );

    // Fake Inventory service answering every request with success.
    let responder_broker = Arc::clone(&broker);
    let mut requests = responder_broker
        .subscribe(topics::RESERVE_STOCK_REQUEST)
        .await
        .unwrap();
    tokio::spawn(async move {
        while let Ok(payload) = requests.recv().await {
            let request: ReserveStockRequest = decode_message(payload).unwrap();
            let response = ReserveStockResponse {
                correlation_id: request.correlation_id,
                order_id: request.order_id,
                success: true,
                reason: None,
            };
            publish_message(responder_broker.as_ref(), &response)
                .await
                .unwrap();
        }
    });

    // Subscriptions are opened before the listeners spawn, so nothing
    // published afterwards can slip past them.
    let placed_events = broker.subscribe(topics::ORDER_PLACED).await.unwrap();
    let responses = broker
        .subscribe(topics::RESERVE_STOCK_RESPONSE)
        .await
        .unwrap();
    tokio::spawn(listener::run_order_placed_listener(
        Arc::clone(&coordinator),
        placed_events,
    ));
    tokio::spawn(listener::run_response_listener(
        Arc::clone(&coordinator),
        responses,
    ));

    let event = order_placed();
    publish_message(broker.as_ref(), &event).await.unwrap();

    let store = coordinator.store().clone();
    let correlation_id = event.correlation_id;
    wait_until(move || {
        store
            .get(correlation_id)
            .is_some_and(|i| i.phase() == SagaPhase::Completed)
    })
    .await;

    assert_eq!(inner.published_count(topics::ORDER_CANCELLED), 0);
}

#[tokio::test]
async fn test_duplicate_deliveries_over_the_broker_start_one_saga() {
    let inner = InMemoryBroker::new();
    let broker: Arc<dyn MessageBroker> = Arc::new(inner.clone());
    let coordinator = Arc::new(
        SagaCoordinator::new(Arc::clone(&broker)).with_timeout(Duration::from_secs(5)),
    );

    let placed_events = broker.subscribe(topics::ORDER_PLACED).await.unwrap();
    tokio::spawn(listener::run_order_placed_listener(
        Arc::clone(&coordinator),
        placed_events,
    ));

    let event = order_placed();
    publish_message(broker.as_ref(), &event).await.unwrap();
    publish_message(broker.as_ref(), &event).await.unwrap();

    let store = coordinator.store().clone();
    wait_until(move || store.len() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(coordinator.store().len(), 1);
    assert_eq!(inner.published_count(topics::RESERVE_STOCK_REQUEST), 1);
}
