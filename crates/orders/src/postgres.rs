//! PostgreSQL-backed order store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::StoreError;
use crate::order::{Money, Order};
use crate::outbox::OutboxRecord;
use crate::store::OrderStore;

/// PostgreSQL order/outbox store.
///
/// `fetch_unprocessed_outbox` claims its batch with
/// `FOR UPDATE SKIP LOCKED`, so two publisher instances polling at once do
/// not hand the same records to both. The claim only spans the fetch
/// transaction; a record published but not yet marked can still be
/// re-published after a crash, which is the accepted at-least-once window.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order, StoreError> {
        let quantity: i32 = row.try_get("quantity").map_err(sqlx::Error::from)?;
        Ok(Order::from_parts(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id").map_err(sqlx::Error::from)?),
            CustomerId::from_uuid(
                row.try_get::<Uuid, _>("customer_id")
                    .map_err(sqlx::Error::from)?,
            ),
            ProductId::new(
                row.try_get::<String, _>("product_id")
                    .map_err(sqlx::Error::from)?,
            ),
            quantity.max(0) as u32,
            Money::from_cents(row.try_get("unit_price_cents").map_err(sqlx::Error::from)?),
            row.try_get("created_by").map_err(sqlx::Error::from)?,
            row.try_get("created_at").map_err(sqlx::Error::from)?,
        ))
    }

    fn row_to_record(row: PgRow) -> Result<OutboxRecord, StoreError> {
        Ok(OutboxRecord {
            id: row.try_get("id").map_err(sqlx::Error::from)?,
            message_type: row.try_get("message_type").map_err(sqlx::Error::from)?,
            payload: row.try_get("payload").map_err(sqlx::Error::from)?,
            created_at: row.try_get("created_at").map_err(sqlx::Error::from)?,
            processed_at: row.try_get("processed_at").map_err(sqlx::Error::from)?,
        })
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn persist_order_with_outbox(
        &self,
        order: &Order,
        record: &OutboxRecord,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, product_id, quantity, unit_price_cents, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.customer_id().as_uuid())
        .bind(order.product_id().as_str())
        .bind(order.quantity() as i32)
        .bind(order.unit_price().cents())
        .bind(order.created_by())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await
        .map_err(StoreError::Database)?;

        sqlx::query(
            r#"
            INSERT INTO outbox (id, message_type, payload, created_at, processed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(&record.message_type)
        .bind(&record.payload)
        .bind(record.created_at)
        .bind(record.processed_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::Database)?;

        tx.commit().await.map_err(StoreError::Database)?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, product_id, quantity, unit_price_cents, created_by, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Database)?;

        row.map(Self::row_to_order).transpose()
    }

    async fn fetch_unprocessed_outbox(
        &self,
        limit: usize,
    ) -> Result<Vec<OutboxRecord>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::Database)?;

        let rows = sqlx::query(
            r#"
            SELECT id, message_type, payload, created_at, processed_at
            FROM outbox
            WHERE processed_at IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await
        .map_err(StoreError::Database)?;

        tx.commit().await.map_err(StoreError::Database)?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    async fn mark_outbox_processed(
        &self,
        record_id: Uuid,
        processed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE outbox
            SET processed_at = $2
            WHERE id = $1 AND processed_at IS NULL
            "#,
        )
        .bind(record_id)
        .bind(processed_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;
        Ok(())
    }
}
