//! PostgreSQL-backed stock ledger implementation.

use async_trait::async_trait;
use common::{ProductId, WarehouseId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::error::{InventoryError, LedgerError};
use crate::ledger::{StockLedger, StockLine, StockReduction};
use crate::reduction::plan_reduction;

/// PostgreSQL stock ledger.
///
/// `reduce_stock` locks the product's lines with `SELECT ... FOR UPDATE`
/// inside one transaction, so concurrent reservations for the same product
/// serialize and the non-negativity invariant holds.
#[derive(Clone)]
pub struct PgStockLedger {
    pool: PgPool,
}

impl PgStockLedger {
    /// Creates a new PostgreSQL stock ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_line(row: PgRow) -> Result<StockLine, LedgerError> {
        let quantity: i32 = row.try_get("quantity").map_err(sqlx::Error::from)?;
        Ok(StockLine {
            product_id: ProductId::new(
                row.try_get::<String, _>("product_id")
                    .map_err(sqlx::Error::from)?,
            ),
            warehouse_id: WarehouseId::new(
                row.try_get::<String, _>("warehouse_id")
                    .map_err(sqlx::Error::from)?,
            ),
            // The CHECK constraint keeps quantity non-negative.
            quantity: quantity.max(0) as u32,
        })
    }
}

#[async_trait]
impl StockLedger for PgStockLedger {
    async fn product_name(&self, product_id: &ProductId) -> Result<Option<String>, LedgerError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM products WHERE product_id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(LedgerError::Database)?;
        Ok(name)
    }

    async fn lines_for_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<StockLine>, LedgerError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, warehouse_id, quantity
            FROM stock_lines
            WHERE product_id = $1
            ORDER BY warehouse_id ASC
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::Database)?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn reduce_stock(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StockReduction, InventoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| InventoryError::Ledger(LedgerError::Database(e)))?;

        let rows = sqlx::query(
            r#"
            SELECT product_id, warehouse_id, quantity
            FROM stock_lines
            WHERE product_id = $1
            ORDER BY warehouse_id ASC
            FOR UPDATE
            "#,
        )
        .bind(product_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| InventoryError::Ledger(LedgerError::Database(e)))?;

        let lines = rows
            .into_iter()
            .map(Self::row_to_line)
            .collect::<Result<Vec<_>, _>>()?;

        let plan = plan_reduction(product_id, &lines, quantity)?;

        for deduction in &plan.deductions {
            sqlx::query(
                r#"
                UPDATE stock_lines
                SET quantity = quantity - $3
                WHERE product_id = $1 AND warehouse_id = $2
                "#,
            )
            .bind(product_id.as_str())
            .bind(deduction.warehouse_id.as_str())
            .bind(deduction.amount as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| InventoryError::Ledger(LedgerError::Database(e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| InventoryError::Ledger(LedgerError::Database(e)))?;

        Ok(StockReduction {
            deducted: quantity,
            new_total: plan.new_total,
        })
    }
}
