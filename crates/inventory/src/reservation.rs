//! Stock reservation request handling.

use std::sync::Arc;

use messaging::{ReserveStockRequest, ReserveStockResponse};

use crate::error::InventoryError;
use crate::ledger::StockLedger;

/// Reason reported when the product has no stock lines.
pub const REASON_PRODUCT_NOT_FOUND: &str = "product not found";
/// Reason reported when demand exceeds supply.
pub const REASON_INSUFFICIENT_STOCK: &str = "insufficient stock";
/// Reason reported for a non-positive requested quantity.
pub const REASON_INVALID_QUANTITY: &str = "invalid quantity";
/// Reason reported when the ledger storage failed.
pub const REASON_STORAGE_ERROR: &str = "inventory storage error";

/// Serves `ReserveStockRequest` messages against the stock ledger.
///
/// Always produces a response, echoing the correlation and order ids, so
/// the saga's timeout only ever fires on transport-level silence.
#[derive(Clone)]
pub struct ReservationHandler {
    ledger: Arc<dyn StockLedger>,
}

impl ReservationHandler {
    /// Creates a new reservation handler over a ledger.
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self { ledger }
    }

    /// Runs the reduction algorithm and reports the outcome.
    #[tracing::instrument(skip(self, request), fields(correlation_id = %request.correlation_id))]
    pub async fn handle(&self, request: &ReserveStockRequest) -> ReserveStockResponse {
        match self
            .ledger
            .reduce_stock(&request.product_id, request.quantity)
            .await
        {
            Ok(reduction) => {
                metrics::counter!("stock_reservations_succeeded").increment(1);
                tracing::info!(
                    order_id = %request.order_id,
                    product_id = %request.product_id,
                    deducted = reduction.deducted,
                    new_total = reduction.new_total,
                    "stock reserved"
                );
                ReserveStockResponse {
                    correlation_id: request.correlation_id,
                    order_id: request.order_id,
                    success: true,
                    reason: None,
                }
            }
            Err(error) => {
                metrics::counter!("stock_reservations_failed").increment(1);
                let reason = match &error {
                    InventoryError::ProductNotFound(_) => REASON_PRODUCT_NOT_FOUND,
                    InventoryError::InsufficientStock { .. } => REASON_INSUFFICIENT_STOCK,
                    InventoryError::InvalidQuantity => REASON_INVALID_QUANTITY,
                    InventoryError::Ledger(_) => REASON_STORAGE_ERROR,
                };
                tracing::warn!(
                    order_id = %request.order_id,
                    product_id = %request.product_id,
                    quantity = request.quantity,
                    %error,
                    "stock reservation refused"
                );
                ReserveStockResponse {
                    correlation_id: request.correlation_id,
                    order_id: request.order_id,
                    success: false,
                    reason: Some(reason.to_string()),
                }
            }
        }
    }
}
