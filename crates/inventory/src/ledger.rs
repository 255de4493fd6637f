//! Stock ledger trait and record types.

use async_trait::async_trait;
use common::{ProductId, WarehouseId};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, LedgerError};

/// The quantity of one product held at one warehouse.
///
/// Quantity is non-negative by construction; the reduction algorithm never
/// deducts more than a line holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: u32,
}

impl StockLine {
    /// Creates a new stock line.
    pub fn new(
        product_id: impl Into<ProductId>,
        warehouse_id: impl Into<WarehouseId>,
        quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            warehouse_id: warehouse_id.into(),
            quantity,
        }
    }
}

/// Result of a successful stock reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockReduction {
    /// Units deducted, equal to the requested quantity.
    pub deducted: u32,
    /// Total remaining for the product across all warehouses.
    pub new_total: u64,
}

/// Record of quantity per (product, warehouse) with an atomic reduce
/// operation.
///
/// `reduce_stock` must run the whole plan-and-apply cycle inside one
/// critical section (a mutex for the in-memory ledger, a transaction with
/// row locks for Postgres) so that concurrent reservations for the same
/// product cannot interleave a read-then-write and drive a line negative.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Display name for a product, if the catalog knows it.
    async fn product_name(&self, product_id: &ProductId) -> Result<Option<String>, LedgerError>;

    /// All stock lines for a product, across warehouses.
    async fn lines_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockLine>, LedgerError>;

    /// Runs the stock-reduction algorithm for `(product_id, quantity)`.
    ///
    /// All-or-nothing: on any failure the ledger is left unchanged.
    async fn reduce_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockReduction, InventoryError>;
}
