//! In-memory broker implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::broker::{BrokerError, MessageBroker, Subscription};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct BrokerState {
    senders: HashMap<String, broadcast::Sender<serde_json::Value>>,
    published: Vec<(String, serde_json::Value)>,
}

/// In-memory broker for tests and single-process deployments.
///
/// Topics are created on first use. Every accepted publish is also recorded
/// in an inspection log so tests can assert on emitted traffic without
/// racing a subscriber.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    fail_publish: Arc<AtomicBool>,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the broker to reject publishes, simulating an outage.
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Returns all payloads accepted on a topic, in publish order.
    pub fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Returns the number of payloads accepted on a topic.
    pub fn published_count(&self, topic: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), BrokerError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::PublishRejected(
                "broker unavailable".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        state.published.push((topic.to_string(), payload.clone()));

        // A send error only means no subscriber is currently listening;
        // the broker still accepts the message.
        if let Some(sender) = state.senders.get(topic) {
            let _ = sender.send(payload);
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        let mut state = self.state.lock().unwrap();
        let sender = state
            .senders
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(Subscription::new(sender.subscribe()))
    }
}
