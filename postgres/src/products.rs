//! Products and stock.

use crate::rows::{
    ASSIGNMENT_COLUMNS, AssignmentRow, PRODUCT_COLUMNS, ProductRow, from_db, slot_columns, to_db,
};
use crate::{PostgresStore, db, lock_allocation};
use chrono::{DateTime, Utc};
use kiosk_core::allocation;
use kiosk_core::providers::{ProductStore, StockDecrement};
use kiosk_core::{
    BottleSize, KioskError, NewProduct, Product, ProductId, ProductPatch, Result, Slot, SlotAssignment, Variant,
};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgConnection, PgExecutor, Postgres, Row};

/// Sort order matching `Slot`'s ordering: spray slots first
pub const ASSIGNMENT_ORDER: &str =
    "ORDER BY CASE slot_kind WHEN 'spray' THEN 0 ELSE 1 END, slot_number, priority, id";

pub async fn fetch_product<'e>(executor: impl PgExecutor<'e>, id: ProductId, for_update: bool) -> Result<Product> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1{}",
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(to_db(id.get())?)
        .fetch_optional(executor)
        .await
        .map_err(db("Failed to get product"))?
        .ok_or(KioskError::ProductNotFound(id))?;
    Product::try_from(row)
}

/// Rows holding `product_id`
pub async fn product_assignments<'e>(
    executor: impl PgExecutor<'e>,
    product_id: ProductId,
) -> Result<Vec<SlotAssignment>> {
    let sql = format!("SELECT {ASSIGNMENT_COLUMNS} FROM slot_assignments WHERE product_id = $1 {ASSIGNMENT_ORDER}");
    sqlx::query_as::<_, AssignmentRow>(&sql)
        .bind(to_db(product_id.get())?)
        .fetch_all(executor)
        .await
        .map_err(db("Failed to list assignments"))?
        .into_iter()
        .map(SlotAssignment::try_from)
        .collect()
}

fn bind_product<'q>(
    query: Query<'q, Postgres, PgArguments>,
    product: &'q Product,
) -> Result<Query<'q, Postgres, PgArguments>> {
    let (spray_kind, spray_number) = slot_columns(product.spray_slot);
    let (bottle_kind, bottle_number) = slot_columns(product.bottle_slot);
    let stock = |variant| i64::from(product.stock.get(variant));
    Ok(query
        .bind(product.name.as_str())
        .bind(product.description.as_str())
        .bind(product.image_url.as_deref())
        .bind(product.available)
        .bind(stock(Variant::Spray))
        .bind(stock(Variant::Bottle(BottleSize::Ml30)))
        .bind(stock(Variant::Bottle(BottleSize::Ml60)))
        .bind(stock(Variant::Bottle(BottleSize::Ml100)))
        .bind(to_db(product.prices.spray.minor())?)
        .bind(to_db(product.prices.ml30.minor())?)
        .bind(to_db(product.prices.ml60.minor())?)
        .bind(to_db(product.prices.ml100.minor())?)
        .bind(spray_kind)
        .bind(spray_number)
        .bind(bottle_kind)
        .bind(bottle_number)
        .bind(product.bottle_size.map(BottleSize::as_str))
        .bind(product.created_at))
}

/// Write every mutable column of `product` back.
pub async fn save_product(conn: &mut PgConnection, product: &Product) -> Result<()> {
    let query = sqlx::query(
        r"
        UPDATE products SET
            name = $1, description = $2, image_url = $3, available = $4,
            stock_spray = $5, stock_30ml = $6, stock_60ml = $7, stock_100ml = $8,
            price_spray = $9, price_30ml = $10, price_60ml = $11, price_100ml = $12,
            spray_slot_kind = $13, spray_slot_number = $14,
            bottle_slot_kind = $15, bottle_slot_number = $16, bottle_size = $17,
            created_at = $18
        WHERE id = $19
        ",
    );
    bind_product(query, product)?
        .bind(to_db(product.id.get())?)
        .execute(conn)
        .await
        .map_err(db("Failed to update product"))?;
    Ok(())
}

/// Clear `product_id`'s back-reference to `slot` once it has no row there.
pub async fn release_if_vacated(conn: &mut PgConnection, product_id: ProductId, slot: Slot) -> Result<()> {
    let (kind, number) = slot_columns(Some(slot));
    let still_there: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM slot_assignments WHERE product_id = $1 AND slot_kind = $2 AND slot_number = $3)",
    )
    .bind(to_db(product_id.get())?)
    .bind(kind)
    .bind(number)
    .fetch_one(&mut *conn)
    .await
    .map_err(db("Failed to check slot occupancy"))?;
    if still_there {
        return Ok(());
    }

    match fetch_product(&mut *conn, product_id, true).await {
        Ok(mut product) => {
            product.release_slot(slot);
            save_product(conn, &product).await
        }
        Err(KioskError::ProductNotFound(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

impl ProductStore for PostgresStore {
    async fn get_product(&self, id: ProductId) -> Result<Product> {
        fetch_product(&self.pool, id, false).await
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db("Failed to list products"))?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn insert_product(&self, product: NewProduct, now: DateTime<Utc>) -> Result<Product> {
        // Validated before the sequence hands out an id
        let draft = product.into_product(ProductId::new(0), now)?;
        let query = sqlx::query(
            r"
            INSERT INTO products (
                name, description, image_url, available,
                stock_spray, stock_30ml, stock_60ml, stock_100ml,
                price_spray, price_30ml, price_60ml, price_100ml,
                spray_slot_kind, spray_slot_number,
                bottle_slot_kind, bottle_slot_number, bottle_size,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            ",
        );
        let row = bind_product(query, &draft)?
            .fetch_one(&self.pool)
            .await
            .map_err(db("Failed to insert product"))?;
        let id: i64 = row.try_get("id").map_err(db("Failed to read product id"))?;

        tracing::debug!(product_id = id, "Product inserted");
        Ok(Product { id: ProductId::new(from_db(id, "id")?), ..draft })
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let mut product = fetch_product(&mut *tx, id, true).await?;
        let assignments = product_assignments(&mut *tx, id).await?;
        for (variant, quantity) in patch.stock.provided() {
            allocation::check_stock_change(id, variant, quantity, &assignments)?;
            product.stock.set(variant, quantity)?;
        }
        patch.apply_fields(&mut product)?;
        save_product(&mut tx, &product).await?;

        tx.commit().await.map_err(db("Failed to commit product update"))?;
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        // Assignments go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(to_db(id.get())?)
            .execute(&self.pool)
            .await
            .map_err(db("Failed to delete product"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_stock(&self, id: ProductId, variant: Variant, quantity: u32) -> Result<Product> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let mut product = fetch_product(&mut *tx, id, true).await?;
        let assignments = product_assignments(&mut *tx, id).await?;
        allocation::check_stock_change(id, variant, quantity, &assignments)?;
        product.stock.set(variant, quantity)?;
        save_product(&mut tx, &product).await?;

        tx.commit().await.map_err(db("Failed to commit stock change"))?;
        Ok(product)
    }

    async fn decrement_stock(&self, id: ProductId, variant: Variant, amount: u32) -> Result<StockDecrement> {
        let mut tx = self.pool.begin().await.map_err(db("Failed to begin transaction"))?;
        lock_allocation(&mut tx).await?;

        let mut product = fetch_product(&mut *tx, id, true).await?;
        product.stock.decrement(id, variant, amount)?;

        let before = product_assignments(&mut *tx, id).await?;
        let mut after = before.clone();
        let drawn_from = allocation::draw_units(&mut after, id, variant, amount);

        for old in &before {
            match after.iter().find(|row| row.id == old.id) {
                None => {
                    sqlx::query("DELETE FROM slot_assignments WHERE id = $1")
                        .bind(to_db(old.id.get())?)
                        .execute(&mut *tx)
                        .await
                        .map_err(db("Failed to remove emptied assignment"))?;
                }
                Some(row) if row.slot_quantity != old.slot_quantity => {
                    sqlx::query("UPDATE slot_assignments SET slot_quantity = $1 WHERE id = $2")
                        .bind(i64::from(row.slot_quantity))
                        .bind(to_db(row.id.get())?)
                        .execute(&mut *tx)
                        .await
                        .map_err(db("Failed to update slot quantity"))?;
                }
                Some(_) => {}
            }
        }
        for slot in &drawn_from {
            if !after.iter().any(|row| row.slot == *slot) {
                product.release_slot(*slot);
            }
        }
        save_product(&mut tx, &product).await?;

        tx.commit().await.map_err(db("Failed to commit decrement"))?;
        tracing::debug!(product_id = %id, %variant, amount, slots = drawn_from.len(), "Stock decremented");
        Ok(StockDecrement { product, drawn_from })
    }
}
