//! Order aggregate and value objects.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = (self.cents / 100).abs();
        let cents = (self.cents % 100).abs();
        if self.cents < 0 {
            write!(f, "-${dollars}.{cents:02}")
        } else {
            write!(f, "${dollars}.{cents:02}")
        }
    }
}

/// A placed order.
///
/// Immutable after creation. The saga never mutates an order; it only
/// emits events referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    product_id: ProductId,
    quantity: u32,
    unit_price: Money,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order, validating quantity and price.
    pub fn new(
        customer_id: CustomerId,
        product_id: impl Into<ProductId>,
        quantity: u32,
        unit_price: Money,
        created_by: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        if unit_price.is_negative() {
            return Err(OrderError::InvalidPrice);
        }
        let created_by = created_by.into();
        if created_by.trim().is_empty() {
            return Err(OrderError::CreatorRequired);
        }

        Ok(Self {
            id: OrderId::new(),
            customer_id,
            product_id: product_id.into(),
            quantity,
            unit_price,
            created_by,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds an order from persisted fields, bypassing validation.
    pub(crate) fn from_parts(
        id: OrderId,
        customer_id: CustomerId,
        product_id: ProductId,
        quantity: u32,
        unit_price: Money,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_id,
            product_id,
            quantity,
            unit_price,
            created_by,
            created_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the total price (quantity * unit price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_valid() {
        let order = Order::new(
            CustomerId::new(),
            "SKU-001",
            3,
            Money::from_cents(1250),
            "alice",
        )
        .unwrap();

        assert_eq!(order.quantity(), 3);
        assert_eq!(order.unit_price().cents(), 1250);
        assert_eq!(order.total_price().cents(), 3750);
        assert_eq!(order.created_by(), "alice");
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let result = Order::new(CustomerId::new(), "SKU-001", 0, Money::zero(), "alice");
        assert_eq!(result.unwrap_err(), OrderError::InvalidQuantity);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let result = Order::new(
            CustomerId::new(),
            "SKU-001",
            1,
            Money::from_cents(-1),
            "alice",
        );
        assert_eq!(result.unwrap_err(), OrderError::InvalidPrice);
    }

    #[test]
    fn test_blank_creator_is_rejected() {
        let result = Order::new(CustomerId::new(), "SKU-001", 1, Money::zero(), "  ");
        assert_eq!(result.unwrap_err(), OrderError::CreatorRequired);
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let order = Order::new(CustomerId::new(), "SKU-001", 1, Money::zero(), "alice");
        assert!(order.is_ok());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = Order::new(
            CustomerId::new(),
            "SKU-001",
            2,
            Money::from_cents(999),
            "alice",
        )
        .unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
