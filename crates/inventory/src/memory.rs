//! In-memory stock ledger implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{ProductId, WarehouseId};

use crate::error::{InventoryError, LedgerError};
use crate::ledger::{StockLedger, StockLine, StockReduction};
use crate::reduction::plan_reduction;

#[derive(Debug, Default)]
struct LedgerState {
    products: HashMap<ProductId, String>,
    // BTreeMap keeps lines ordered by (product, warehouse) so snapshots are
    // deterministic.
    lines: BTreeMap<(ProductId, WarehouseId), u32>,
}

/// In-memory stock ledger for tests and single-process deployments.
///
/// The whole reduce cycle runs under one mutex, which is what upholds the
/// non-negativity invariant under concurrent reservations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryStockLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a product display name in the catalog.
    pub fn register_product(&self, product_id: impl Into<ProductId>, name: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .products
            .insert(product_id.into(), name.into());
    }

    /// Sets the stock level of one (product, warehouse) line.
    pub fn set_stock(
        &self,
        product_id: impl Into<ProductId>,
        warehouse_id: impl Into<WarehouseId>,
        quantity: u32,
    ) {
        self.state
            .lock()
            .unwrap()
            .lines
            .insert((product_id.into(), warehouse_id.into()), quantity);
    }

    /// Returns the quantity held at one warehouse, if the line exists.
    pub fn quantity_at(
        &self,
        product_id: impl Into<ProductId>,
        warehouse_id: impl Into<WarehouseId>,
    ) -> Option<u32> {
        self.state
            .lock()
            .unwrap()
            .lines
            .get(&(product_id.into(), warehouse_id.into()))
            .copied()
    }

    /// Returns the total quantity for a product across all warehouses.
    pub fn total_for(&self, product_id: impl Into<ProductId>) -> u64 {
        let product_id = product_id.into();
        self.state
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|((p, _), _)| *p == product_id)
            .map(|(_, quantity)| u64::from(*quantity))
            .sum()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn product_name(&self, product_id: &ProductId) -> Result<Option<String>, LedgerError> {
        Ok(self.state.lock().unwrap().products.get(product_id).cloned())
    }

    async fn lines_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockLine>, LedgerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lines
            .iter()
            .filter(|((p, _), _)| p == product_id)
            .map(|((p, w), quantity)| StockLine {
                product_id: p.clone(),
                warehouse_id: w.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn reduce_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockReduction, InventoryError> {
        let mut state = self.state.lock().unwrap();

        let lines: Vec<StockLine> = state
            .lines
            .iter()
            .filter(|((p, _), _)| p == product_id)
            .map(|((p, w), q)| StockLine {
                product_id: p.clone(),
                warehouse_id: w.clone(),
                quantity: *q,
            })
            .collect();

        let plan = plan_reduction(product_id, &lines, quantity)?;

        for deduction in &plan.deductions {
            let key = (product_id.clone(), deduction.warehouse_id.clone());
            if let Some(line) = state.lines.get_mut(&key) {
                *line -= deduction.amount;
            }
        }

        Ok(StockReduction {
            deducted: quantity,
            new_total: plan.new_total,
        })
    }
}
