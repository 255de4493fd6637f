//! Read-only availability queries.

use std::sync::Arc;

use common::ProductId;

use crate::error::InventoryError;
use crate::ledger::StockLedger;

/// Whether total stock covers a requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Total stock across warehouses covers the request.
    Available { total: u64 },
    /// Demand exceeds supply.
    Insufficient { requested: u32, total: u64 },
}

/// Outcome of an availability check for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub product_id: ProductId,
    /// Display name from the catalog, falling back to the product id.
    pub product_name: String,
    pub availability: Availability,
}

impl AvailabilityReport {
    /// True when the requested quantity can be covered.
    pub fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Available { .. })
    }

    /// Total quantity on hand across all warehouses.
    pub fn total(&self) -> u64 {
        match self.availability {
            Availability::Available { total } => total,
            Availability::Insufficient { total, .. } => total,
        }
    }
}

/// Answers the Order service's synchronous pre-check.
///
/// Read-only: safe to call concurrently with reservations. The answer is a
/// snapshot and may be stale by the time the reservation runs; the saga's
/// compensation path covers that race.
#[derive(Clone)]
pub struct AvailabilityService {
    ledger: Arc<dyn StockLedger>,
}

impl AvailabilityService {
    /// Creates a new availability service over a ledger.
    pub fn new(ledger: Arc<dyn StockLedger>) -> Self {
        Self { ledger }
    }

    /// Checks whether `requested` units of a product are on hand.
    #[tracing::instrument(skip(self))]
    pub async fn check(
        &self,
        product_id: &ProductId,
        requested: u32,
    ) -> Result<AvailabilityReport, InventoryError> {
        if requested == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        let lines = self.ledger.lines_for_product(product_id).await?;
        if lines.is_empty() {
            return Err(InventoryError::ProductNotFound(product_id.clone()));
        }

        let total: u64 = lines.iter().map(|line| u64::from(line.quantity)).sum();
        let availability = if total >= u64::from(requested) {
            Availability::Available { total }
        } else {
            Availability::Insufficient { requested, total }
        };

        let product_name = self
            .ledger
            .product_name(product_id)
            .await?
            .unwrap_or_else(|| product_id.to_string());

        Ok(AvailabilityReport {
            product_id: product_id.clone(),
            product_name,
            availability,
        })
    }
}
