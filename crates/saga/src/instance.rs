//! Saga instance state.

use chrono::{DateTime, Utc};
use common::{CorrelationId, OrderId, ProductId};
use messaging::{OrderCancelled, OrderPlaced};
use serde::{Deserialize, Serialize};

use crate::machine::SagaPhase;

/// One in-flight (or finalized) reservation coordination.
///
/// Carries denormalized copies of the order fields so the compensation
/// event can be built without re-querying the Order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaInstance {
    correlation_id: CorrelationId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    phase: SagaPhase,
    started_at: DateTime<Utc>,
    cancellation_reason: Option<String>,
}

impl SagaInstance {
    /// Creates a pending instance from an `OrderPlaced` event.
    pub fn for_event(event: &OrderPlaced) -> Self {
        Self {
            correlation_id: event.correlation_id,
            order_id: event.order_id,
            product_id: event.product_id.clone(),
            quantity: event.quantity,
            phase: SagaPhase::ReservationPending,
            started_at: Utc::now(),
            cancellation_reason: None,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn phase(&self) -> SagaPhase {
        self.phase
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Reason of the emitted compensation, if the saga was cancelled.
    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// True once the instance has taken its terminal transition.
    pub fn is_finalized(&self) -> bool {
        self.phase.is_terminal()
    }

    pub(crate) fn set_phase(&mut self, phase: SagaPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_cancellation_reason(&mut self, reason: String) {
        self.cancellation_reason = Some(reason);
    }

    /// Builds the compensation event for this instance.
    pub fn cancellation(&self, reason: String) -> OrderCancelled {
        OrderCancelled {
            order_id: self.order_id,
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            reason,
        }
    }
}
