//! Wire contracts crossing the service boundary.
//!
//! Field names serialize in camelCase and are part of the compatibility
//! surface: both services and any replayed outbox payload must agree on
//! them byte for byte.

use common::{CorrelationId, OrderId, ProductId};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A message that can be published to the broker.
///
/// The type tag is stored in outbox records and the topic routes the
/// message between the services.
pub trait BrokerMessage: Serialize + DeserializeOwned + Send {
    /// Stable type tag, e.g. `"OrderPlaced"`.
    const MESSAGE_TYPE: &'static str;

    /// Topic the message is published on.
    const TOPIC: &'static str;
}

/// Published by the Order service (via the outbox) once an order and its
/// outbox record have committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlaced {
    pub correlation_id: CorrelationId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl BrokerMessage for OrderPlaced {
    const MESSAGE_TYPE: &'static str = "OrderPlaced";
    const TOPIC: &'static str = crate::topics::ORDER_PLACED;
}

/// Sent by the saga to the Inventory service to reserve stock for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveStockRequest {
    pub correlation_id: CorrelationId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl BrokerMessage for ReserveStockRequest {
    const MESSAGE_TYPE: &'static str = "ReserveStockRequest";
    const TOPIC: &'static str = crate::topics::RESERVE_STOCK_REQUEST;
}

/// The Inventory service's reply to a [`ReserveStockRequest`].
///
/// A reply is sent even on business failure; the saga's timeout path exists
/// only for transport-level silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveStockResponse {
    pub correlation_id: CorrelationId,
    pub order_id: OrderId,
    pub success: bool,
    /// Human-readable cause, set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BrokerMessage for ReserveStockResponse {
    const MESSAGE_TYPE: &'static str = "ReserveStockResponse";
    const TOPIC: &'static str = crate::topics::RESERVE_STOCK_RESPONSE;
}

/// Compensation event published by the saga when a reservation fails,
/// faults or times out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub reason: String,
}

impl BrokerMessage for OrderCancelled {
    const MESSAGE_TYPE: &'static str = "OrderCancelled";
    const TOPIC: &'static str = crate::topics::ORDER_CANCELLED;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order_placed() -> OrderPlaced {
        OrderPlaced {
            correlation_id: CorrelationId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new("SKU-001"),
            quantity: 5,
        }
    }

    #[test]
    fn order_placed_wire_field_names() {
        let event = sample_order_placed();
        let value = serde_json::to_value(&event).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["correlationId", "orderId", "productId", "quantity"]);
    }

    #[test]
    fn order_placed_roundtrip() {
        let event = sample_order_placed();
        let json = serde_json::to_string(&event).unwrap();
        let deserialized: OrderPlaced = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn reserve_request_roundtrip() {
        let request = ReserveStockRequest {
            correlation_id: CorrelationId::new(),
            order_id: OrderId::new(),
            product_id: ProductId::new("SKU-002"),
            quantity: 3,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"correlationId\""));
        let deserialized: ReserveStockRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, deserialized);
    }

    #[test]
    fn response_reason_is_omitted_on_success() {
        let response = ReserveStockResponse {
            correlation_id: CorrelationId::new(),
            order_id: OrderId::new(),
            success: true,
            reason: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("reason").is_none());
    }

    #[test]
    fn response_reason_roundtrips_on_failure() {
        let response = ReserveStockResponse {
            correlation_id: CorrelationId::new(),
            order_id: OrderId::new(),
            success: false,
            reason: Some("insufficient stock".to_string()),
        };

        let json = serde_json::to_string(&response).unwrap();
        let deserialized: ReserveStockResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, deserialized);
    }

    #[test]
    fn order_cancelled_wire_field_names() {
        let event = OrderCancelled {
            order_id: OrderId::new(),
            product_id: ProductId::new("SKU-001"),
            quantity: 2,
            reason: "stock reservation timed out".to_string(),
        };

        let value = serde_json::to_value(&event).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["orderId", "productId", "quantity", "reason"]);
    }

    #[test]
    fn message_type_tags_are_distinct() {
        let tags = [
            OrderPlaced::MESSAGE_TYPE,
            ReserveStockRequest::MESSAGE_TYPE,
            ReserveStockResponse::MESSAGE_TYPE,
            OrderCancelled::MESSAGE_TYPE,
        ];
        for (i, tag) in tags.iter().enumerate() {
            for other in &tags[i + 1..] {
                assert_ne!(tag, other);
            }
        }
    }
}
