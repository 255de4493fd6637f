//! Multi-warehouse stock-reduction planning.
//!
//! The planner is pure: it inspects a snapshot of a product's stock lines
//! and produces the per-warehouse deductions, leaving the mutation (and its
//! locking) to the ledger implementation executing the plan.

use common::{ProductId, WarehouseId};

use crate::error::InventoryError;
use crate::ledger::StockLine;

/// One planned deduction against a single warehouse line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    pub warehouse_id: WarehouseId,
    pub amount: u32,
}

/// The outcome of planning a reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReductionPlan {
    /// Deductions to apply, in the order they were planned.
    pub deductions: Vec<Deduction>,
    /// Total remaining for the product once the plan is applied.
    pub new_total: u64,
}

/// Plans a reduction of `requested` units across the given stock lines.
///
/// Lines are drained largest-first, ties broken by warehouse id ascending,
/// so a reservation touches the fewest warehouses possible and the outcome
/// is reproducible for any snapshot. Fails without planning any deduction
/// when the product has no lines or the total is short of the request.
pub fn plan_reduction(
    product_id: &ProductId,
    lines: &[StockLine],
    requested: u32,
) -> Result<ReductionPlan, InventoryError> {
    if requested == 0 {
        return Err(InventoryError::InvalidQuantity);
    }

    if lines.is_empty() {
        return Err(InventoryError::ProductNotFound(product_id.clone()));
    }

    let total: u64 = lines.iter().map(|line| u64::from(line.quantity)).sum();
    if total < u64::from(requested) {
        return Err(InventoryError::InsufficientStock {
            requested,
            available: total,
        });
    }

    let mut ordered: Vec<&StockLine> = lines.iter().collect();
    ordered.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.warehouse_id.cmp(&b.warehouse_id))
    });

    let mut deductions = Vec::new();
    let mut remaining = requested;
    for line in ordered {
        if remaining == 0 {
            break;
        }
        let take = line.quantity.min(remaining);
        if take == 0 {
            // Remaining lines hold even less; the total check above
            // guarantees we never get here with remaining > 0.
            break;
        }
        deductions.push(Deduction {
            warehouse_id: line.warehouse_id.clone(),
            amount: take,
        });
        remaining -= take;
    }

    debug_assert_eq!(remaining, 0);

    Ok(ReductionPlan {
        deductions,
        new_total: total - u64::from(requested),
    })
}
