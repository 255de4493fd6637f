//! Outbox publisher loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use messaging::{MessageBroker, publish_message};
use tokio::time::MissedTickBehavior;

use crate::error::StoreError;
use crate::outbox::OutboxPayload;
use crate::store::OrderStore;

/// Default polling interval between publisher cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
/// Default maximum number of records drained per cycle.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Drains unprocessed outbox records to the broker, oldest first.
///
/// A record is marked processed only after the broker acknowledged the
/// publish, which gives at-least-once delivery: a crash between the two
/// steps re-publishes the record on the next cycle. Consumers key their
/// work on the correlation id to absorb the duplicates.
pub struct OutboxPublisher {
    store: Arc<dyn OrderStore>,
    broker: Arc<dyn MessageBroker>,
    interval: Duration,
    batch_size: usize,
}

impl OutboxPublisher {
    /// Creates a publisher with the default interval and batch size.
    pub fn new(store: Arc<dyn OrderStore>, broker: Arc<dyn MessageBroker>) -> Self {
        Self {
            store,
            broker,
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Overrides the polling interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Overrides the per-cycle batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Runs publisher cycles on the configured interval, forever.
    ///
    /// A failed cycle is logged and retried on the next tick; the loop
    /// never gives up.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(error) = self.run_once().await {
                tracing::error!(%error, "outbox publisher cycle failed");
            }
        }
    }

    /// Runs one publisher cycle; returns the number of records published.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<usize, StoreError> {
        let records = self.store.fetch_unprocessed_outbox(self.batch_size).await?;
        if records.is_empty() {
            return Ok(0);
        }

        let mut published = 0;
        for record in records {
            let payload = match record.decode() {
                Ok(payload) => payload,
                Err(error) => {
                    // Left unprocessed so the broken record stays visible.
                    tracing::error!(
                        record_id = %record.id,
                        message_type = %record.message_type,
                        %error,
                        "undecodable outbox payload"
                    );
                    continue;
                }
            };

            let result = match &payload {
                OutboxPayload::OrderPlaced(event) => {
                    publish_message(self.broker.as_ref(), event).await
                }
            };

            match result {
                Ok(()) => {
                    self.store
                        .mark_outbox_processed(record.id, Utc::now())
                        .await?;
                    metrics::counter!("outbox_records_published").increment(1);
                    published += 1;
                }
                Err(error) => {
                    // One stuck record must not block the rest of the batch.
                    metrics::counter!("outbox_publish_failures").increment(1);
                    tracing::warn!(
                        record_id = %record.id,
                        %error,
                        "publish failed, record stays unprocessed for retry"
                    );
                }
            }
        }

        if published > 0 {
            tracing::debug!(published, "outbox cycle complete");
        }
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryOrderStore;
    use crate::order::{Money, Order};
    use crate::outbox::OutboxRecord;
    use common::{CorrelationId, CustomerId, ProductId};
    use messaging::{InMemoryBroker, OrderPlaced, topics};

    async fn store_with_one_record() -> (InMemoryOrderStore, OutboxRecord) {
        let store = InMemoryOrderStore::new();
        let order = Order::new(
            CustomerId::new(),
            "SKU-001",
            2,
            Money::from_cents(100),
            "alice",
        )
        .unwrap();
        let record = OutboxRecord::new(&OutboxPayload::OrderPlaced(OrderPlaced {
            correlation_id: CorrelationId::new(),
            order_id: order.id(),
            product_id: ProductId::new("SKU-001"),
            quantity: 2,
        }))
        .unwrap();
        store
            .persist_order_with_outbox(&order, &record)
            .await
            .unwrap();
        (store, record)
    }

    #[tokio::test]
    async fn test_run_once_publishes_and_marks_processed() {
        let (store, _) = store_with_one_record().await;
        let broker = InMemoryBroker::new();
        let publisher = OutboxPublisher::new(Arc::new(store.clone()), Arc::new(broker.clone()));

        let published = publisher.run_once().await.unwrap();

        assert_eq!(published, 1);
        assert_eq!(store.unprocessed_count(), 0);
        assert_eq!(broker.published_count(topics::ORDER_PLACED), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_record_for_retry() {
        let (store, _) = store_with_one_record().await;
        let broker = InMemoryBroker::new();
        broker.set_fail_publish(true);
        let publisher = OutboxPublisher::new(Arc::new(store.clone()), Arc::new(broker.clone()));

        let published = publisher.run_once().await.unwrap();
        assert_eq!(published, 0);
        // Never marked processed before a broker acknowledgment.
        assert_eq!(store.unprocessed_count(), 1);

        broker.set_fail_publish(false);
        let published = publisher.run_once().await.unwrap();
        assert_eq!(published, 1);
        assert_eq!(store.unprocessed_count(), 0);
        assert_eq!(broker.published_count(topics::ORDER_PLACED), 1);
    }

    #[tokio::test]
    async fn test_processed_records_are_not_republished() {
        let (store, _) = store_with_one_record().await;
        let broker = InMemoryBroker::new();
        let publisher = OutboxPublisher::new(Arc::new(store.clone()), Arc::new(broker.clone()));

        publisher.run_once().await.unwrap();
        let published = publisher.run_once().await.unwrap();

        assert_eq!(published, 0);
        assert_eq!(broker.published_count(topics::ORDER_PLACED), 1);
    }

    #[tokio::test]
    async fn test_batch_size_bounds_each_cycle() {
        let store = InMemoryOrderStore::new();
        for _ in 0..5 {
            let order = Order::new(
                CustomerId::new(),
                "SKU-001",
                1,
                Money::from_cents(100),
                "alice",
            )
            .unwrap();
            let record = OutboxRecord::new(&OutboxPayload::OrderPlaced(OrderPlaced {
                correlation_id: CorrelationId::new(),
                order_id: order.id(),
                product_id: ProductId::new("SKU-001"),
                quantity: 1,
            }))
            .unwrap();
            store
                .persist_order_with_outbox(&order, &record)
                .await
                .unwrap();
        }

        let broker = InMemoryBroker::new();
        let publisher = OutboxPublisher::new(Arc::new(store.clone()), Arc::new(broker.clone()))
            .with_batch_size(2);

        assert_eq!(publisher.run_once().await.unwrap(), 2);
        assert_eq!(store.unprocessed_count(), 3);
        assert_eq!(publisher.run_once().await.unwrap(), 2);
        assert_eq!(publisher.run_once().await.unwrap(), 1);
        assert_eq!(store.unprocessed_count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_record_does_not_block_the_batch() {
        let store = InMemoryOrderStore::new();
        let order = Order::new(
            CustomerId::new(),
            "SKU-002",
            1,
            Money::from_cents(100),
            "alice",
        )
        .unwrap();
        let broken = OutboxRecord {
            id: uuid::Uuid::new_v4(),
            message_type: "Unknown".to_string(),
            payload: serde_json::json!({"type": "Unknown", "data": {}}),
            created_at: Utc::now(),
            processed_at: None,
        };
        store
            .persist_order_with_outbox(&order, &broken)
            .await
            .unwrap();
        let good = OutboxRecord::new(&OutboxPayload::OrderPlaced(OrderPlaced {
            correlation_id: CorrelationId::new(),
            order_id: order.id(),
            product_id: ProductId::new("SKU-002"),
            quantity: 1,
        }))
        .unwrap();
        store
            .persist_order_with_outbox(&order, &good)
            .await
            .unwrap();

        let broker = InMemoryBroker::new();
        let publisher = OutboxPublisher::new(Arc::new(store.clone()), Arc::new(broker.clone()));

        let published = publisher.run_once().await.unwrap();

        assert_eq!(published, 1);
        // The broken record stays unprocessed, the good one went out.
        assert_eq!(store.unprocessed_count(), 1);
        assert_eq!(broker.published_count(topics::ORDER_PLACED), 1);
    }
}
