//! Broker listeners feeding the coordinator.
//!
//! The caller opens the subscriptions before spawning these loops, so no
//! event published during startup can slip past an unsubscribed listener.

use std::sync::Arc;

use messaging::{OrderPlaced, ReserveStockResponse, Subscription, decode_message};

use crate::coordinator::SagaCoordinator;

/// Feeds `OrderPlaced` events into the coordinator until the subscription
/// closes. Malformed payloads are logged and skipped.
pub async fn run_order_placed_listener(
    coordinator: Arc<SagaCoordinator>,
    mut events: Subscription,
) {
    loop {
        let payload = match events.recv().await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::info!(%error, "OrderPlaced subscription closed");
                return;
            }
        };
        match decode_message::<OrderPlaced>(payload) {
            Ok(event) => coordinator.handle_order_placed(event).await,
            Err(error) => {
                tracing::warn!(%error, "discarding malformed OrderPlaced payload");
            }
        }
    }
}

/// Feeds reservation responses into the coordinator until the subscription
/// closes.
pub async fn run_response_listener(
    coordinator: Arc<SagaCoordinator>,
    mut responses: Subscription,
) {
    loop {
        let payload = match responses.recv().await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::info!(%error, "reservation response subscription closed");
                return;
            }
        };
        match decode_message::<ReserveStockResponse>(payload) {
            Ok(response) => coordinator.handle_response(response).await,
            Err(error) => {
                tracing::warn!(%error, "discarding malformed reservation response");
            }
        }
    }
}
