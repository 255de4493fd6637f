//! Order and outbox storage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::Order;
use crate::outbox::OutboxRecord;

/// Storage for orders and their outbox records.
///
/// The dual write in `persist_order_with_outbox` is the core correctness
/// property of the outbox pattern: either both rows commit or neither
/// does, so an event can never exist without its order nor be lost
/// relative to it.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists an order and its outbox record in one atomic unit.
    async fn persist_order_with_outbox(
        &self,
        order: &Order,
        record: &OutboxRecord,
    ) -> Result<(), StoreError>;

    /// Loads an order by id.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Returns up to `limit` unprocessed outbox records, oldest first.
    async fn fetch_unprocessed_outbox(&self, limit: usize) -> Result<Vec<OutboxRecord>, StoreError>;

    /// Marks one outbox record processed.
    ///
    /// Only called after the broker acknowledged the publish; a crash
    /// between acknowledgment and this call yields a duplicate publish on
    /// the next cycle, which downstream consumers must tolerate.
    async fn mark_outbox_processed(
        &self,
        record_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
