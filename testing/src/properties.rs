//! proptest strategies for kiosk domain types and random store workloads.

use kiosk_core::providers::KioskStore;
use kiosk_core::{BottleSize, NewAssignment, OrderStatus, ProductId, Slot, Variant};
use proptest::prelude::*;

/// Any bottle size
pub fn arb_bottle_size() -> impl Strategy<Value = BottleSize> {
    prop::sample::select(BottleSize::ALL.to_vec())
}

/// Any variant
pub fn arb_variant() -> impl Strategy<Value = Variant> {
    prop::sample::select(Variant::ALL.to_vec())
}

/// Any valid bottle slot
pub fn arb_bottle_slot() -> impl Strategy<Value = Slot> {
    (1_u8..=15).prop_filter_map("bottle slot", |n| Slot::bottle(n).ok())
}

/// Any valid spray slot
pub fn arb_spray_slot() -> impl Strategy<Value = Slot> {
    (1_u8..=5).prop_filter_map("spray slot", |n| Slot::spray(n).ok())
}

/// One step of a random store workload
///
/// Product ids are small so operations collide on the same products.
/// Quantities deliberately overshoot the legal ranges so rejections are
/// exercised too.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Set an absolute stock value
    SetStock {
        /// Product
        product: u64,
        /// Variant
        variant: Variant,
        /// Value, possibly above the ceiling
        quantity: u32,
    },
    /// Reserve bottles in a slot
    AssignBottle {
        /// Product
        product: u64,
        /// Slot
        slot: Slot,
        /// Size
        bottle_size: BottleSize,
        /// Units
        quantity: u32,
        /// Dispense priority
        priority: u32,
    },
    /// Put a spray tester in a slot
    AssignSpray {
        /// Product
        product: u64,
        /// Slot
        slot: Slot,
    },
    /// Sell units
    Decrement {
        /// Product
        product: u64,
        /// Variant
        variant: Variant,
        /// Units
        amount: u32,
    },
    /// Empty a slot
    ClearSlot {
        /// Slot
        slot: Slot,
    },
    /// Remove one row
    Remove {
        /// Product
        product: u64,
        /// Slot
        slot: Slot,
    },
}

/// Any store operation against products 1–3
pub fn arb_store_op() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (1_u64..=3, arb_variant(), 0_u32..=25)
            .prop_map(|(product, variant, quantity)| StoreOp::SetStock { product, variant, quantity }),
        (1_u64..=3, arb_bottle_slot(), arb_bottle_size(), 1_u32..=20, 0_u32..=3).prop_map(
            |(product, slot, bottle_size, quantity, priority)| StoreOp::AssignBottle {
                product,
                slot,
                bottle_size,
                quantity,
                priority,
            }
        ),
        (1_u64..=3, arb_spray_slot()).prop_map(|(product, slot)| StoreOp::AssignSpray { product, slot }),
        (1_u64..=3, arb_variant(), 1_u32..=3)
            .prop_map(|(product, variant, amount)| StoreOp::Decrement { product, variant, amount }),
        arb_bottle_slot().prop_map(|slot| StoreOp::ClearSlot { slot }),
        (1_u64..=3, arb_bottle_slot()).prop_map(|(product, slot)| StoreOp::Remove { product, slot }),
    ]
}

/// Apply one operation, ignoring business-rule rejections
///
/// Returns `true` if the store accepted the operation.
pub async fn apply_op<S: KioskStore>(store: &S, op: &StoreOp, now: chrono::DateTime<chrono::Utc>) -> bool {
    match *op {
        StoreOp::SetStock { product, variant, quantity } => {
            store.set_stock(ProductId::new(product), variant, quantity).await.is_ok()
        }
        StoreOp::AssignBottle { product, slot, bottle_size, quantity, priority } => {
            match NewAssignment::bottle(ProductId::new(product), slot, bottle_size, priority, quantity) {
                Ok(request) => store.assign(request, now).await.is_ok(),
                Err(_) => false,
            }
        }
        StoreOp::AssignSpray { product, slot } => match NewAssignment::spray(ProductId::new(product), slot, 0) {
            Ok(request) => store.assign(request, now).await.is_ok(),
            Err(_) => false,
        },
        StoreOp::Decrement { product, variant, amount } => {
            store.decrement_stock(ProductId::new(product), variant, amount).await.is_ok()
        }
        StoreOp::ClearSlot { slot } => store.clear_slot(slot).await.unwrap_or(0) > 0,
        StoreOp::Remove { product, slot } => store
            .remove_assignment(ProductId::new(product), slot, None)
            .await
            .unwrap_or(false),
    }
}

/// A terminal order status
pub fn arb_terminal_status() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![Just(OrderStatus::Completed), Just(OrderStatus::Failed)]
}
