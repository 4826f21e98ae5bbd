//! Order ledger.

use crate::rows::{LineRow, OrderRow, from_db, to_db};
use crate::{PostgresStore, db};
use chrono::{DateTime, Utc};
use kiosk_core::providers::OrderStore;
use kiosk_core::{KioskError, NewOrder, Order, OrderId, OrderStatus, OrderTransition, Result};
use sqlx::PgPool;
use std::collections::BTreeMap;

const ORDER_COLUMNS: &str = "id, payment_method, amount, status, created_at, settled_at";
const LINE_COLUMNS: &str = "order_id, product_id, variant, price";

async fn load_order(pool: &PgPool, id: OrderId) -> Result<Order> {
    let order_id = to_db(id.get())?;
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(order_id)
        .fetch_optional(pool)
        .await
        .map_err(db("Failed to get order"))?
        .ok_or(KioskError::OrderNotFound(id))?;
    let lines = sqlx::query_as::<_, LineRow>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = $1 ORDER BY line_no"
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await
    .map_err(db("Failed to get order lines"))?;
    row.into_order(lines)
}

impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: NewOrder, now: DateTime<Utc>) -> Result<Order> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;

        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO orders (payment_method, amount, status, created_at)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id
            ",
        )
        .bind(order.payment_method.as_str())
        .bind(to_db(order.amount.minor())?)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db("Failed to insert order"))?;

        for (line_no, line) in (0_i32..).zip(&order.lines) {
            sqlx::query(
                "INSERT INTO order_lines (order_id, line_no, product_id, variant, price) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(line_no)
            .bind(to_db(line.product_id.get())?)
            .bind(line.variant.as_str())
            .bind(to_db(line.price.minor())?)
            .execute(&mut *tx)
            .await
            .map_err(db("Failed to insert order line"))?;
        }

        tx.commit().await.map_err(db("Failed to commit order"))?;
        Ok(order.into_order(OrderId::new(from_db(id, "id")?), now))
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        load_order(&self.pool, id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to list orders"))?;
        let lines = sqlx::query_as::<_, LineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines ORDER BY order_id, line_no"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list order lines"))?;

        let mut by_order: BTreeMap<i64, Vec<LineRow>> = BTreeMap::new();
        for line in lines {
            by_order.entry(line.order_id).or_default().push(line);
        }
        rows.into_iter()
            .map(|row| {
                let lines = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    async fn transition_order(&self, id: OrderId, to: OrderStatus, now: DateTime<Utc>) -> Result<OrderTransition> {
        if to.is_terminal() {
            let applied = sqlx::query(
                "UPDATE orders SET status = $2, settled_at = $3 WHERE id = $1 AND status = 'pending'",
            )
            .bind(to_db(id.get())?)
            .bind(to.as_str())
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db("Failed to transition order"))?;

            if applied.rows_affected() > 0 {
                tracing::debug!(order_id = %id, status = %to, "Order settled");
                return load_order(&self.pool, id).await.map(OrderTransition::Applied);
            }
        }

        let order = load_order(&self.pool, id).await?;
        if order.status == to && to.is_terminal() {
            Ok(OrderTransition::Unchanged(order))
        } else {
            Err(KioskError::InvalidTransition { order_id: id, from: order.status, to })
        }
    }
}
