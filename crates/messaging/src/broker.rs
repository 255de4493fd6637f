//! Message broker trait and subscription handle.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::contracts::BrokerMessage;

/// Errors that can occur while talking to the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The broker refused or failed to accept a publish.
    #[error("Publish rejected: {0}")]
    PublishRejected(String),

    /// The subscribed topic was closed.
    #[error("Subscription closed")]
    Closed,

    /// Payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Transport abstraction both services program against.
///
/// Publishing is fire-and-forget: a successful return means the broker
/// accepted the message, not that any consumer has seen it. Delivery to
/// subscribers is at-least-once from the caller's perspective because the
/// outbox publisher retries until a publish is acknowledged.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes a serialized payload on a topic.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), BrokerError>;

    /// Opens a subscription on a topic.
    ///
    /// Only messages published after the subscription is opened are
    /// delivered to it.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError>;
}

/// A live subscription to one topic.
pub struct Subscription {
    receiver: broadcast::Receiver<serde_json::Value>,
}

impl Subscription {
    /// Wraps a broadcast receiver into a subscription handle.
    pub fn new(receiver: broadcast::Receiver<serde_json::Value>) -> Self {
        Self { receiver }
    }

    /// Waits for the next message on the topic.
    ///
    /// A slow consumer that falls behind the channel capacity skips the
    /// overwritten messages and keeps receiving; the skip is logged.
    pub async fn recv(&mut self) -> Result<serde_json::Value, BrokerError> {
        loop {
            match self.receiver.recv().await {
                Ok(payload) => return Ok(payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscription lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(BrokerError::Closed),
            }
        }
    }
}

/// Serializes a typed message and publishes it on its own topic.
pub async fn publish_message<M>(broker: &dyn MessageBroker, message: &M) -> Result<(), BrokerError>
where
    M: BrokerMessage + Sync,
{
    let payload = serde_json::to_value(message)?;
    broker.publish(M::TOPIC, payload).await
}

/// Decodes a payload received from a subscription into a typed message.
pub fn decode_message<M: BrokerMessage>(payload: serde_json::Value) -> Result<M, BrokerError> {
    Ok(serde_json::from_value(payload)?)
}
