//! Inventory error types.

use common::ProductId;
use thiserror::Error;

/// Storage-level failures of a stock ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Requested quantity was zero.
    #[error("Requested quantity must be greater than zero")]
    InvalidQuantity,

    /// No stock lines exist for the product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Demand exceeds total supply across all warehouses.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u64 },

    /// The underlying ledger storage failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}
