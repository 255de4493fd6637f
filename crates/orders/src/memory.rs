//! In-memory order store implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::Order;
use crate::outbox::OutboxRecord;
use crate::store::OrderStore;

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<OrderId, Order>,
    outbox: Vec<OutboxRecord>,
}

/// In-memory order store for tests and single-process deployments.
///
/// One mutex guards both tables, which makes the order+outbox dual write
/// atomic. Only a single publisher instance may drain this store; there is
/// no cross-process claim on unprocessed records.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    /// Returns the number of outbox records, processed or not.
    pub fn outbox_count(&self) -> usize {
        self.state.lock().unwrap().outbox.len()
    }

    /// Returns the number of unprocessed outbox records.
    pub fn unprocessed_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .outbox
            .iter()
            .filter(|r| !r.is_processed())
            .count()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn persist_order_with_outbox(
        &self,
        order: &Order,
        record: &OutboxRecord,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.orders.insert(order.id(), order.clone());
        state.outbox.push(record.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.state.lock().unwrap().orders.get(&order_id).cloned())
    }

    async fn fetch_unprocessed_outbox(
        &self,
        limit: usize,
    ) -> Result<Vec<OutboxRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut unprocessed: Vec<OutboxRecord> = state
            .outbox
            .iter()
            .filter(|r| !r.is_processed())
            .cloned()
            .collect();
        unprocessed.sort_by_key(|r| r.created_at);
        unprocessed.truncate(limit);
        Ok(unprocessed)
    }

    async fn mark_outbox_processed(
        &self,
        record_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(record) = state.outbox.iter_mut().find(|r| r.id == record_id)
            && record.processed_at.is_none()
        {
            record.processed_at = Some(processed_at);
        }
        Ok(())
    }
}
