//! Slot assignment table.

use crate::products::{ASSIGNMENT_ORDER, fetch_product, product_assignments, release_if_vacated, save_product};
use crate::rows::{ASSIGNMENT_COLUMNS, AssignmentRow, from_db, slot_columns, to_db};
use crate::{PostgresStore, db, lock_allocation};
use chrono::{DateTime, Utc};
use kiosk_core::allocation;
use kiosk_core::providers::SlotStore;
use kiosk_core::{AssignmentId, BottleSize, NewAssignment, ProductId, Result, Slot, SlotAssignment, Variant};
use sqlx::PgExecutor;
use std::collections::BTreeSet;

async fn slot_rows<'e>(executor: impl PgExecutor<'e>, slot: Slot) -> Result<Vec<SlotAssignment>> {
    let (kind, number) = slot_columns(Some(slot));
    let sql = format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM slot_assignments WHERE slot_kind = $1 AND slot_number = $2 {ASSIGNMENT_ORDER}"
    );
    sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(kind)
        .bind(number)
        .fetch_all(executor)
        .await
        .map_err(db("Failed to list slot assignments"))?
        .into_iter()
        .map(SlotAssignment::try_from)
        .collect()
}

impl SlotStore for PostgresStore {
    async fn assign(&self, request: NewAssignment, now: DateTime<Utc>) -> Result<SlotAssignment> {
        let product_id = request.product_id();
        let slot = request.slot();
        let variant = request.variant();

        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let product = fetch_product(&mut *tx, product_id, true).await?;
        let existing = product_assignments(&mut *tx, product_id).await?;
        allocation::check_assignment(&product.stock, &existing, &request)?;

        let displaced: Vec<SlotAssignment> = slot_rows(&mut *tx, slot)
            .await?
            .into_iter()
            .filter(|a| variant == Variant::Spray || a.holds(product_id, variant))
            .collect();
        for row in &displaced {
            sqlx::query("DELETE FROM slot_assignments WHERE id = $1")
                .bind(to_db(row.id.get())?)
                .execute(&mut *tx)
                .await
                .map_err(db("Failed to remove displaced assignment"))?;
        }
        let previous: BTreeSet<ProductId> = displaced.iter().map(|a| a.product_id).collect();
        for previous in previous {
            release_if_vacated(&mut tx, previous, slot).await?;
        }

        let (kind, number) = slot_columns(Some(slot));
        let id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO slot_assignments
                (slot_kind, slot_number, product_id, variant, slot_quantity, priority, assigned_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(kind)
        .bind(number)
        .bind(to_db(product_id.get())?)
        .bind(variant.as_str())
        .bind(i64::from(request.slot_quantity()))
        .bind(i64::from(request.priority()))
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(db("Failed to insert assignment"))?;

        // Reload: releasing a displaced row may have touched this product
        let mut product = fetch_product(&mut *tx, product_id, true).await?;
        product.claim_slot(slot, variant);
        save_product(&mut tx, &product).await?;

        tx.commit().await.map_err(db("Failed to commit assignment"))?;
        tracing::debug!(%slot, %product_id, %variant, replaced = displaced.len(), "Slot assigned");
        Ok(request.into_assignment(AssignmentId::new(from_db(id, "id")?), now))
    }

    async fn available_quantity(
        &self,
        product_id: ProductId,
        bottle_size: BottleSize,
        excluding: Option<Slot>,
    ) -> Result<u32> {
        let product = fetch_product(&self.pool, product_id, false).await?;
        let assignments = product_assignments(&self.pool, product_id).await?;
        Ok(allocation::available_quantity(
            product.stock.get(Variant::Bottle(bottle_size)),
            &assignments,
            product_id,
            bottle_size,
            excluding,
        ))
    }

    async fn clear_slot(&self, slot: Slot) -> Result<usize> {
        let (kind, number) = slot_columns(Some(slot));
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let removed: Vec<i64> = sqlx::query_scalar(
            "DELETE FROM slot_assignments WHERE slot_kind = $1 AND slot_number = $2 RETURNING product_id",
        )
        .bind(kind)
        .bind(number)
        .fetch_all(&mut *tx)
        .await
        .map_err(db("Failed to clear slot"))?;

        let products: BTreeSet<i64> = removed.iter().copied().collect();
        for product_id in products {
            release_if_vacated(&mut tx, ProductId::new(from_db(product_id, "product_id")?), slot).await?;
        }

        tx.commit().await.map_err(db("Failed to commit slot clear"))?;
        Ok(removed.len())
    }

    async fn remove_assignment(
        &self,
        product_id: ProductId,
        slot: Slot,
        bottle_size: Option<BottleSize>,
    ) -> Result<bool> {
        let (kind, number) = slot_columns(Some(slot));
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let removed: Option<i64> = sqlx::query_scalar(
            r"
            DELETE FROM slot_assignments WHERE id = (
                SELECT id FROM slot_assignments
                WHERE product_id = $1 AND slot_kind = $2 AND slot_number = $3
                  AND ($4::TEXT IS NULL OR variant = $4)
                ORDER BY id
                LIMIT 1
            )
            RETURNING id
            ",
        )
        .bind(to_db(product_id.get())?)
        .bind(kind)
        .bind(number)
        .bind(bottle_size.map(BottleSize::as_str))
        .fetch_optional(&mut *tx)
        .await
        .map_err(db("Failed to remove assignment"))?;

        if removed.is_none() {
            return Ok(false);
        }
        release_if_vacated(&mut tx, product_id, slot).await?;
        tx.commit().await.map_err(db("Failed to commit assignment removal"))?;
        Ok(true)
    }

    async fn assignments_for_slot(&self, slot: Slot) -> Result<Vec<SlotAssignment>> {
        slot_rows(&self.pool, slot).await
    }

    async fn assignments_for_product(&self, product_id: ProductId) -> Result<Vec<SlotAssignment>> {
        product_assignments(&self.pool, product_id).await
    }

    async fn all_assignments(&self) -> Result<Vec<SlotAssignment>> {
        let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM slot_assignments {ASSIGNMENT_ORDER}");
        sqlx::query_as::<_, AssignmentRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to list assignments"))?
            .into_iter()
            .map(SlotAssignment::try_from)
            .collect()
    }
}
