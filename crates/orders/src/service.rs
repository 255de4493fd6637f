//! Order placement.

use std::sync::Arc;

use common::{CorrelationId, CustomerId, ProductId};
use messaging::OrderPlaced;

use crate::availability::{AvailabilityClient, AvailabilityOutcome};
use crate::error::PlaceOrderError;
use crate::order::{Money, Order};
use crate::outbox::{OutboxPayload, OutboxRecord};
use crate::store::OrderStore;

/// Command to place a new order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
    pub created_by: String,
}

/// Places orders: pre-check, then the atomic order+outbox write.
///
/// Failures discovered here are synchronous and leave nothing behind.
/// Once the dual write commits, the order exists and any later reservation
/// failure reaches the outside world only as an `OrderCancelled` event.
#[derive(Clone)]
pub struct OrderPlacementService {
    store: Arc<dyn OrderStore>,
    availability: Arc<dyn AvailabilityClient>,
}

impl OrderPlacementService {
    /// Creates a new placement service.
    pub fn new(store: Arc<dyn OrderStore>, availability: Arc<dyn AvailabilityClient>) -> Self {
        Self {
            store,
            availability,
        }
    }

    /// Places an order.
    #[tracing::instrument(skip(self, cmd), fields(product_id = %cmd.product_id, quantity = cmd.quantity))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, PlaceOrderError> {
        // Validation happens before the remote pre-check; construction has
        // no side effects.
        let order = Order::new(
            cmd.customer_id,
            cmd.product_id,
            cmd.quantity,
            cmd.unit_price,
            cmd.created_by,
        )?;

        match self
            .availability
            .check(order.product_id(), order.quantity())
            .await
        {
            Err(error) => {
                metrics::counter!("orders_rejected", "reason" => "availability_unavailable")
                    .increment(1);
                return Err(PlaceOrderError::AvailabilityUnavailable(error.to_string()));
            }
            Ok(AvailabilityOutcome::ProductNotFound) => {
                metrics::counter!("orders_rejected", "reason" => "product_not_found").increment(1);
                return Err(PlaceOrderError::ProductNotFound(order.product_id().clone()));
            }
            Ok(AvailabilityOutcome::Insufficient {
                requested,
                available,
            }) => {
                metrics::counter!("orders_rejected", "reason" => "insufficient_stock").increment(1);
                return Err(PlaceOrderError::InsufficientStock {
                    requested,
                    available,
                });
            }
            Ok(AvailabilityOutcome::Available { .. }) => {}
        }

        let correlation_id = CorrelationId::new();
        let event = OrderPlaced {
            correlation_id,
            order_id: order.id(),
            product_id: order.product_id().clone(),
            quantity: order.quantity(),
        };
        let record = OutboxRecord::new(&OutboxPayload::OrderPlaced(event))?;

        self.store.persist_order_with_outbox(&order, &record).await?;

        metrics::counter!("orders_placed").increment(1);
        tracing::info!(
            order_id = %order.id(),
            %correlation_id,
            "order placed, outbox record created"
        );

        Ok(order)
    }
}
