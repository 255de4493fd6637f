//! Outbox records and payload kinds.

use chrono::{DateTime, Utc};
use messaging::{BrokerMessage, OrderPlaced};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload kinds an outbox record can carry.
///
/// A closed sum type, matched exhaustively at publish time, so adding a new
/// outbox event is a compile-time-checked change rather than a runtime tag
/// switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboxPayload {
    /// An order was placed and awaits reservation.
    OrderPlaced(OrderPlaced),
}

impl OutboxPayload {
    /// Returns the stable type tag of the wrapped message.
    pub fn message_type(&self) -> &'static str {
        match self {
            OutboxPayload::OrderPlaced(_) => OrderPlaced::MESSAGE_TYPE,
        }
    }
}

/// One row of the transactional outbox.
///
/// Created in the same atomic unit of work as the order it describes.
/// Flipped from unprocessed to processed exactly once, by the publisher,
/// only after a successful broker acknowledgment. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub message_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    /// Creates an unprocessed record from a payload.
    pub fn new(payload: &OutboxPayload) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            message_type: payload.message_type().to_string(),
            payload: serde_json::to_value(payload)?,
            created_at: Utc::now(),
            processed_at: None,
        })
    }

    /// True once the publisher has relayed this record to the broker.
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    /// Decodes the stored payload back into its typed form.
    pub fn decode(&self) -> Result<OutboxPayload, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}
