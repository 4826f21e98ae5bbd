use kiosk_core::allocation::{self, BOTTLE_STOCK_CEILING, MAX_SLOT_QUANTITY};
use kiosk_core::providers::KioskStore;
use kiosk_core::{BottleSize, KioskError, ProductId, Slot, SlotKind, Variant};
use std::collections::HashMap;
use thiserror::Error;

/// A broken stock or slot invariant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Bottle stock above the ceiling
    #[error("product {product_id} has {stock} of {variant}, above the ceiling")]
    StockAboveCeiling {
        /// Product
        product_id: ProductId,
        /// Variant
        variant: Variant,
        /// Stock found
        stock: u32,
    },

    /// More units reserved in slots than on hand
    #[error("product {product_id} has {reserved} of {bottle_size} reserved but {stock} in stock")]
    OverReserved {
        /// Product
        product_id: ProductId,
        /// Size
        bottle_size: BottleSize,
        /// Units reserved
        reserved: u32,
        /// Units on hand
        stock: u32,
    },

    /// A spray slot with more than one occupant
    #[error("spray slot {0} has {1} occupants")]
    SharedSpraySlot(Slot, usize),

    /// A row whose quantity is outside the legal range
    #[error("slot {slot} holds {quantity} units")]
    BadSlotQuantity {
        /// Slot
        slot: Slot,
        /// Quantity found
        quantity: u32,
    },

    /// The store could not be read
    #[error("store error: {0}")]
    Store(#[from] KioskError),
}

/// Check every stock and slot invariant against the current store contents
///
/// # Errors
///
/// Returns the first violation found.
pub async fn check_invariants<S: KioskStore>(store: &S) -> Result<(), InvariantViolation> {
    let products = store.list_products().await?;
    let assignments = store.all_assignments().await?;

    for product in &products {
        for size in BottleSize::ALL {
            let variant = Variant::Bottle(size);
            let stock = product.stock.get(variant);
            if stock > BOTTLE_STOCK_CEILING {
                return Err(InvariantViolation::StockAboveCeiling { product_id: product.id, variant, stock });
            }
            let reserved = allocation::reserved_units(&assignments, product.id, size, None);
            if reserved > stock {
                return Err(InvariantViolation::OverReserved {
                    product_id: product.id,
                    bottle_size: size,
                    reserved,
                    stock,
                });
            }
        }
    }

    let mut spray_occupants: HashMap<Slot, usize> = HashMap::new();
    for row in &assignments {
        let legal = match row.slot.kind() {
            SlotKind::Spray => row.slot_quantity == 1,
            SlotKind::Bottle => (1..=MAX_SLOT_QUANTITY).contains(&row.slot_quantity),
        };
        if !legal {
            return Err(InvariantViolation::BadSlotQuantity { slot: row.slot, quantity: row.slot_quantity });
        }
        if row.slot.kind() == SlotKind::Spray {
            *spray_occupants.entry(row.slot).or_default() += 1;
        }
    }
    if let Some((slot, count)) = spray_occupants.into_iter().find(|(_, count)| *count > 1) {
        return Err(InvariantViolation::SharedSpraySlot(slot, count));
    }

    Ok(())
}
