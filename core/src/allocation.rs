//! Slot allocation rules.
//!
//! Pure functions shared by every store implementation so the in-memory and
//! PostgreSQL backends agree on what a valid reservation is. Stores call these
//! while holding their lock (or inside their transaction) and commit only when
//! they return `Ok`.

use crate::error::{KioskError, Result};
use crate::types::{BasketItem, BottleSize, NewAssignment, ProductId, Slot, SlotAssignment, StockLevels, Variant};
use std::collections::BTreeMap;

/// Maximum stock of any bottle variant
pub const BOTTLE_STOCK_CEILING: u32 = 20;

/// Maximum units a single bottle assignment may reserve
pub const MAX_SLOT_QUANTITY: u32 = 20;

/// Units of (`product_id`, `bottle_size`) reserved by assignments, skipping rows in `excluding`
pub fn reserved_units<'a>(
    assignments: impl IntoIterator<Item = &'a SlotAssignment>,
    product_id: ProductId,
    bottle_size: BottleSize,
    excluding: Option<Slot>,
) -> u32 {
    let variant = Variant::Bottle(bottle_size);
    assignments
        .into_iter()
        .filter(|a| a.holds(product_id, variant))
        .filter(|a| Some(a.slot) != excluding)
        .fold(0_u32, |sum, a| sum.saturating_add(a.slot_quantity))
}

/// Stock not yet promised to any other slot
///
/// `stock − Σ slot_quantity` over the other assignments of the same product and
/// size, floored at zero.
pub fn available_quantity<'a>(
    stock: u32,
    assignments: impl IntoIterator<Item = &'a SlotAssignment>,
    product_id: ProductId,
    bottle_size: BottleSize,
    excluding: Option<Slot>,
) -> u32 {
    stock.saturating_sub(reserved_units(assignments, product_id, bottle_size, excluding))
}

/// Validates a new assignment against current stock and reservations
///
/// Spray assignments always pass. A bottle assignment replaces any row for the
/// same product and size in its own slot, so that row is left out of the sum.
///
/// # Errors
///
/// Returns `KioskError::InsufficientAvailable` if the slot asks for more units
/// than remain unreserved.
pub fn check_assignment<'a>(
    stock: &StockLevels,
    existing: impl IntoIterator<Item = &'a SlotAssignment>,
    request: &NewAssignment,
) -> Result<()> {
    let Variant::Bottle(bottle_size) = request.variant() else {
        return Ok(());
    };

    let available = available_quantity(
        stock.get(request.variant()),
        existing,
        request.product_id(),
        bottle_size,
        Some(request.slot()),
    );

    if request.slot_quantity() > available {
        return Err(KioskError::InsufficientAvailable {
            product_id: request.product_id(),
            bottle_size,
            requested: request.slot_quantity(),
            available,
        });
    }
    Ok(())
}

/// Validates an absolute stock value
///
/// Applies the bottle ceiling and refuses to drop a bottle counter below the
/// units already reserved in slots.
///
/// # Errors
///
/// Returns `KioskError::LimitExceeded` or `KioskError::BelowReserved`.
pub fn check_stock_change<'a>(
    product_id: ProductId,
    variant: Variant,
    quantity: u32,
    assignments: impl IntoIterator<Item = &'a SlotAssignment>,
) -> Result<()> {
    StockLevels::check(variant, quantity)?;

    if let Variant::Bottle(bottle_size) = variant {
        let reserved = reserved_units(assignments, product_id, bottle_size, None);
        if quantity < reserved {
            return Err(KioskError::BelowReserved {
                product_id,
                bottle_size,
                requested: quantity,
                reserved,
            });
        }
    }
    Ok(())
}

/// Takes `amount` units of `variant` out of the slots, highest priority first
///
/// Bottle rows lose one unit per draw and are removed from `assignments` when
/// they reach zero. A spray tester is never used up, so its row stays and the
/// same slot is reported once per unit. Fewer than `amount` slots are returned
/// when the slots run dry; the remaining units were sold without a slot.
pub fn draw_units(
    assignments: &mut Vec<SlotAssignment>,
    product_id: ProductId,
    variant: Variant,
    amount: u32,
) -> Vec<Slot> {
    let mut drawn = Vec::new();
    for _ in 0..amount {
        let Some(index) = assignments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.holds(product_id, variant) && a.slot_quantity > 0)
            .min_by_key(|(_, a)| (a.priority, a.slot))
            .map(|(index, _)| index)
        else {
            break;
        };

        let row = &mut assignments[index];
        drawn.push(row.slot);
        if variant == Variant::Spray {
            continue;
        }
        row.slot_quantity -= 1;
        if row.slot_quantity == 0 {
            assignments.remove(index);
        }
    }
    drawn
}

/// Units of each (product, size) requested by a basket
pub fn basket_demand(items: &[BasketItem]) -> BTreeMap<(ProductId, BottleSize), u32> {
    let mut demand = BTreeMap::new();
    for item in items {
        *demand.entry((item.product_id, item.bottle_size)).or_insert(0_u32) += 1;
    }
    demand
}
