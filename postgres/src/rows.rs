//! Row types and their conversions to the domain model.

use crate::storage_error;
use chrono::{DateTime, Utc};
use kiosk_core::{
    AdminSession, AssignmentId, BottleSize, LineItem, Money, Order, OrderId, OrderStatus, PaymentMethod, Product,
    ProductId, Result, SessionToken, Slot, SlotAssignment, SlotKind, SlotUsage, StockLevels, Variant, VariantPrices,
};
use std::str::FromStr;
use uuid::Uuid;

/// Column list matching [`ProductRow`]
pub const PRODUCT_COLUMNS: &str = "id, name, description, image_url, available, \
     stock_spray, stock_30ml, stock_60ml, stock_100ml, \
     price_spray, price_30ml, price_60ml, price_100ml, \
     spray_slot_kind, spray_slot_number, bottle_slot_kind, bottle_slot_number, bottle_size, created_at";

/// Column list matching [`AssignmentRow`]
pub const ASSIGNMENT_COLUMNS: &str =
    "id, slot_kind, slot_number, product_id, variant, slot_quantity, priority, assigned_at";

pub fn to_db(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| storage_error("value out of range", value))
}

pub fn from_db<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T> {
    T::try_from(value).map_err(|_| storage_error(&format!("bad {column}"), value))
}

fn parse<T: FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse().map_err(|e: String| storage_error("bad enum value", e))
}

fn slot(kind: &str, number: i16) -> Result<Slot> {
    let number = u8::try_from(number).map_err(|_| storage_error("bad slot number", number))?;
    Slot::new(parse::<SlotKind>(kind)?, number).map_err(|e| storage_error("bad slot", e))
}

fn optional_slot(kind: Option<&str>, number: Option<i16>) -> Result<Option<Slot>> {
    match (kind, number) {
        (Some(kind), Some(number)) => slot(kind, number).map(Some),
        _ => Ok(None),
    }
}

/// Slot as `(kind, number)` columns
pub fn slot_columns(slot: Option<Slot>) -> (Option<&'static str>, Option<i16>) {
    slot.map_or((None, None), |s| (Some(s.kind().as_str()), Some(i16::from(s.number()))))
}

#[derive(sqlx::FromRow)]
pub struct ProductRow {
    id: i64,
    name: String,
    description: String,
    image_url: Option<String>,
    available: bool,
    stock_spray: i64,
    stock_30ml: i64,
    stock_60ml: i64,
    stock_100ml: i64,
    price_spray: i64,
    price_30ml: i64,
    price_60ml: i64,
    price_100ml: i64,
    spray_slot_kind: Option<String>,
    spray_slot_number: Option<i16>,
    bottle_slot_kind: Option<String>,
    bottle_slot_number: Option<i16>,
    bottle_size: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = kiosk_core::KioskError;

    fn try_from(row: ProductRow) -> Result<Self> {
        let money = |value: i64, column: &str| from_db::<u64>(value, column).map(Money::from_minor);
        let stock = StockLevels::new(
            from_db(row.stock_spray, "stock_spray")?,
            from_db(row.stock_30ml, "stock_30ml")?,
            from_db(row.stock_60ml, "stock_60ml")?,
            from_db(row.stock_100ml, "stock_100ml")?,
        )
        .map_err(|e| storage_error("stored stock out of range", e))?;

        Ok(Self {
            id: ProductId::new(from_db(row.id, "id")?),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            available: row.available,
            stock,
            prices: VariantPrices {
                spray: money(row.price_spray, "price_spray")?,
                ml30: money(row.price_30ml, "price_30ml")?,
                ml60: money(row.price_60ml, "price_60ml")?,
                ml100: money(row.price_100ml, "price_100ml")?,
            },
            spray_slot: optional_slot(row.spray_slot_kind.as_deref(), row.spray_slot_number)?,
            bottle_slot: optional_slot(row.bottle_slot_kind.as_deref(), row.bottle_slot_number)?,
            bottle_size: row.bottle_size.as_deref().map(parse::<BottleSize>).transpose()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct AssignmentRow {
    id: i64,
    slot_kind: String,
    slot_number: i16,
    product_id: i64,
    variant: String,
    slot_quantity: i64,
    priority: i64,
    assigned_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for SlotAssignment {
    type Error = kiosk_core::KioskError;

    fn try_from(row: AssignmentRow) -> Result<Self> {
        Ok(Self {
            id: AssignmentId::new(from_db(row.id, "id")?),
            slot: slot(&row.slot_kind, row.slot_number)?,
            product_id: ProductId::new(from_db(row.product_id, "product_id")?),
            variant: parse::<Variant>(&row.variant)?,
            slot_quantity: from_db(row.slot_quantity, "slot_quantity")?,
            priority: from_db(row.priority, "priority")?,
            assigned_at: row.assigned_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    payment_method: String,
    amount: i64,
    status: String,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
pub struct LineRow {
    pub order_id: i64,
    product_id: i64,
    variant: String,
    price: i64,
}

impl TryFrom<LineRow> for LineItem {
    type Error = kiosk_core::KioskError;

    fn try_from(row: LineRow) -> Result<Self> {
        Ok(Self {
            product_id: ProductId::new(from_db(row.product_id, "product_id")?),
            variant: parse::<Variant>(&row.variant)?,
            price: Money::from_minor(from_db(row.price, "price")?),
        })
    }
}

impl OrderRow {
    /// Builds the order from its row and its lines in line order
    pub fn into_order(self, lines: Vec<LineRow>) -> Result<Order> {
        Ok(Order {
            id: OrderId::new(from_db(self.id, "id")?),
            lines: lines.into_iter().map(LineItem::try_from).collect::<Result<_>>()?,
            payment_method: parse::<PaymentMethod>(&self.payment_method)?,
            amount: Money::from_minor(from_db(self.amount, "amount")?),
            status: parse::<OrderStatus>(&self.status)?,
            created_at: self.created_at,
            settled_at: self.settled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct SessionRow {
    token: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for AdminSession {
    fn from(row: SessionRow) -> Self {
        Self {
            token: SessionToken::from_uuid(row.token),
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct UsageRow {
    slot_kind: String,
    slot_number: i16,
    product_id: Option<i64>,
    usage_count: i64,
    last_used_at: Option<DateTime<Utc>>,
}

impl TryFrom<UsageRow> for SlotUsage {
    type Error = kiosk_core::KioskError;

    fn try_from(row: UsageRow) -> Result<Self> {
        Ok(Self {
            slot: slot(&row.slot_kind, row.slot_number)?,
            product_id: row
                .product_id
                .map(|id| from_db(id, "product_id").map(ProductId::new))
                .transpose()?,
            usage_count: from_db(row.usage_count, "usage_count")?,
            last_used_at: row.last_used_at,
        })
    }
}
