//! Saga coordinator.

use std::sync::Arc;
use std::time::Duration;

use common::CorrelationId;
use messaging::{
    MessageBroker, OrderPlaced, ReserveStockRequest, ReserveStockResponse, publish_message,
};

use crate::instance::SagaInstance;
use crate::machine::{SagaSignal, SideEffect};
use crate::store::{InMemorySagaStore, SignalOutcome};

/// Default time the saga waits for a reservation response.
pub const DEFAULT_RESERVATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives order-placement saga instances.
///
/// Creation is idempotent per correlation id, so the at-least-once outbox
/// can replay `OrderPlaced` without starting a second reservation flow.
/// Responses, faults and timeouts all funnel through one store-guarded
/// apply, which fires the terminal transition exactly once per instance.
pub struct SagaCoordinator {
    store: InMemorySagaStore,
    broker: Arc<dyn MessageBroker>,
    timeout: Duration,
}

impl SagaCoordinator {
    /// Creates a coordinator with the default reservation timeout.
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            store: InMemorySagaStore::new(),
            broker,
            timeout: DEFAULT_RESERVATION_TIMEOUT,
        }
    }

    /// Overrides the reservation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Access to the instance store, for status queries.
    pub fn store(&self) -> &InMemorySagaStore {
        &self.store
    }

    /// Starts a saga for a placed order.
    ///
    /// Duplicate deliveries for an already-known correlation id are
    /// no-ops. A request that cannot even be handed to the broker faults
    /// the instance immediately; there is nothing to wait for.
    #[tracing::instrument(skip(self, event), fields(correlation_id = %event.correlation_id))]
    pub async fn handle_order_placed(self: &Arc<Self>, event: OrderPlaced) {
        if !self.store.create(SagaInstance::for_event(&event)) {
            metrics::counter!("saga_duplicate_deliveries").increment(1);
            tracing::debug!("duplicate OrderPlaced delivery ignored");
            return;
        }

        metrics::counter!("sagas_started").increment(1);
        tracing::info!(order_id = %event.order_id, "saga started, requesting reservation");

        let request = ReserveStockRequest {
            correlation_id: event.correlation_id,
            order_id: event.order_id,
            product_id: event.product_id,
            quantity: event.quantity,
        };

        if let Err(error) = publish_message(self.broker.as_ref(), &request).await {
            tracing::warn!(%error, "reservation request could not be sent");
            self.apply_signal(
                request.correlation_id,
                SagaSignal::Faulted {
                    detail: error.to_string(),
                },
            )
            .await;
            return;
        }

        self.arm_timeout(request.correlation_id);
    }

    /// Routes a reservation response to its instance.
    pub async fn handle_response(&self, response: ReserveStockResponse) {
        self.apply_signal(
            response.correlation_id,
            SagaSignal::ResponseReceived {
                success: response.success,
                reason: response.reason,
            },
        )
        .await;
    }

    /// Reports a transport or processing fault for an in-flight instance.
    pub async fn handle_fault(&self, correlation_id: CorrelationId, detail: String) {
        self.apply_signal(correlation_id, SagaSignal::Faulted { detail })
            .await;
    }

    fn arm_timeout(self: &Arc<Self>, correlation_id: CorrelationId) {
        let coordinator = Arc::clone(self);
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            coordinator
                .apply_signal(correlation_id, SagaSignal::TimedOut)
                .await;
        });
    }

    async fn apply_signal(&self, correlation_id: CorrelationId, signal: SagaSignal) {
        match self.store.apply(correlation_id, &signal) {
            SignalOutcome::Unknown => {
                tracing::warn!(%correlation_id, ?signal, "signal for unknown saga instance");
            }
            SignalOutcome::Ignored => {
                // The losing side of the response-vs-timeout race lands
                // here.
                tracing::debug!(%correlation_id, ?signal, "signal after finalization ignored");
            }
            SignalOutcome::Finalized { instance, effect } => match effect {
                None => {
                    metrics::counter!("sagas_completed").increment(1);
                    tracing::info!(
                        %correlation_id,
                        order_id = %instance.order_id(),
                        "reservation confirmed, saga completed"
                    );
                }
                Some(SideEffect::PublishCancellation { reason }) => {
                    metrics::counter!("sagas_cancelled").increment(1);
                    tracing::warn!(
                        %correlation_id,
                        order_id = %instance.order_id(),
                        %reason,
                        "saga cancelled, emitting compensation"
                    );
                    let event = instance.cancellation(reason);
                    if let Err(error) = publish_message(self.broker.as_ref(), &event).await {
                        // The instance is already finalized; the event is
                        // lost unless an operator replays it.
                        tracing::error!(
                            %correlation_id,
                            %error,
                            "failed to publish OrderCancelled"
                        );
                    }
                }
            },
        }
    }
}
