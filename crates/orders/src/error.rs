//! Order service error types.

use common::ProductId;
use thiserror::Error;

/// Validation errors raised while constructing an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// Quantity must be a positive integer.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// Unit price must not be negative.
    #[error("Unit price must not be negative")]
    InvalidPrice,

    /// The creator identity is required.
    #[error("Creator identity is required")]
    CreatorRequired,
}

/// Storage-level failures of the order/outbox store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while placing an order.
///
/// Every variant here is raised before anything is persisted except
/// `Store`, which reports a failed commit; in both cases no partial state
/// is left behind.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// Input validation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// The availability pre-check call itself failed. Distinct from
    /// insufficient stock: the answer is unknown, not negative.
    #[error("Availability service unavailable: {0}")]
    AvailabilityUnavailable(String),

    /// The pre-check found no stock lines for the product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The pre-check determined demand exceeds supply.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u64 },

    /// The atomic order+outbox write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Building the outbox payload failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
