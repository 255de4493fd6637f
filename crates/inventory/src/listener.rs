//! Broker listener for reservation requests.

use std::sync::Arc;

use messaging::{
    MessageBroker, ReserveStockRequest, Subscription, decode_message, publish_message,
};

use crate::reservation::ReservationHandler;

/// Serves reservation requests from the broker until the subscription
/// closes.
///
/// The caller opens the subscription before spawning this loop, so no
/// request published during startup can slip past it. Every decodable
/// request gets a reply, success or not. A reply that cannot be published
/// is logged and dropped; the saga covers that silence with its timeout.
pub async fn run_reservation_listener(
    handler: ReservationHandler,
    broker: Arc<dyn MessageBroker>,
    mut requests: Subscription,
) {
    loop {
        let payload = match requests.recv().await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::info!(%error, "reservation request subscription closed");
                return;
            }
        };
        let request: ReserveStockRequest = match decode_message(payload) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "discarding malformed reservation request");
                continue;
            }
        };

        let response = handler.handle(&request).await;
        if let Err(error) = publish_message(broker.as_ref(), &response).await {
            tracing::error!(
                %error,
                correlation_id = %request.correlation_id,
                "failed to publish reservation response"
            );
        }
    }
}
