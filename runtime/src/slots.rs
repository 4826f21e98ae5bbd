//! Slot assignment table.
//!
//! A bottle slot is a physical reservation: it claims units of a variant's
//! stock when it is assigned, long before they are sold. The available check
//! therefore runs here, at assignment time, inside the store's atomic
//! `assign`.

use crate::metrics::KioskMetrics;
use kiosk_core::environment::Clock;
use kiosk_core::providers::KioskStore;
use kiosk_core::{
    BottleSize, KioskError, NewAssignment, ProductId, Result, Slot, SlotAssignment, SlotKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One slot and everything assigned to it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    /// The slot
    pub slot: Slot,
    /// Rows in the slot, highest priority first
    pub assignments: Vec<SlotAssignment>,
}

/// The whole machine, every slot listed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMap {
    /// Spray slots 1–5
    pub spray: Vec<SlotEntry>,
    /// Bottle slots 1–15
    pub bottle: Vec<SlotEntry>,
}

/// Slot assignment service.
#[derive(Clone)]
pub struct SlotService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KioskStore> SlotService<S> {
    /// Create a slot service over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Put a product's spray tester in a spray slot, replacing any occupant.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidSlot` for a number outside 1–5 and
    /// `KioskError::ProductNotFound` for an unknown product.
    pub async fn assign_spray(&self, product_id: ProductId, number: u8, priority: u32) -> Result<SlotAssignment> {
        let request = NewAssignment::spray(product_id, Slot::spray(number)?, priority)?;
        self.assign(request).await
    }

    /// Reserve `slot_quantity` bottles of a product in a bottle slot.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidSlot`, `KioskError::InvalidQuantity`,
    /// `KioskError::ProductNotFound`, or `KioskError::InsufficientAvailable`
    /// when other slots already hold too much of the variant.
    pub async fn assign_bottle(
        &self,
        product_id: ProductId,
        number: u8,
        bottle_size: BottleSize,
        priority: u32,
        slot_quantity: u32,
    ) -> Result<SlotAssignment> {
        let request = NewAssignment::bottle(product_id, Slot::bottle(number)?, bottle_size, priority, slot_quantity)?;
        self.assign(request).await
    }

    async fn assign(&self, request: NewAssignment) -> Result<SlotAssignment> {
        match self.store.assign(request, self.clock.now()).await {
            Ok(row) => {
                tracing::info!(
                    slot = %row.slot,
                    product_id = %row.product_id,
                    variant = %row.variant,
                    slot_quantity = row.slot_quantity,
                    priority = row.priority,
                    "Slot assigned"
                );
                Ok(row)
            }
            Err(err @ KioskError::InsufficientAvailable { .. }) => {
                KioskMetrics::assignment_rejected();
                tracing::info!(slot = %request.slot(), error = %err, "Slot assignment rejected");
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Units of a bottle variant not yet reserved by other slots.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`.
    pub async fn available_quantity(
        &self,
        product_id: ProductId,
        bottle_size: BottleSize,
        excluding: Option<Slot>,
    ) -> Result<u32> {
        self.store.available_quantity(product_id, bottle_size, excluding).await
    }

    /// Empty a slot.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn clear_slot(&self, slot: Slot) -> Result<usize> {
        let removed = self.store.clear_slot(slot).await?;
        tracing::info!(%slot, removed, "Slot cleared");
        Ok(removed)
    }

    /// Take one product out of a slot. Stock is untouched.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn remove_assignment(
        &self,
        product_id: ProductId,
        slot: Slot,
        bottle_size: Option<BottleSize>,
    ) -> Result<bool> {
        let removed = self.store.remove_assignment(product_id, slot, bottle_size).await?;
        if removed {
            tracing::info!(%slot, product_id = %product_id, "Slot assignment removed");
        }
        Ok(removed)
    }

    /// Rows in one slot.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn assignments_for_slot(&self, slot: Slot) -> Result<Vec<SlotAssignment>> {
        self.store.assignments_for_slot(slot).await
    }

    /// Rows holding one product.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn assignments_for_product(&self, product_id: ProductId) -> Result<Vec<SlotAssignment>> {
        self.store.assignments_for_product(product_id).await
    }

    /// Every slot with its rows, empty slots included.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn slot_map(&self) -> Result<SlotMap> {
        let rows = self.store.all_assignments().await?;
        let entries = |kind: SlotKind| -> Vec<SlotEntry> {
            Slot::all(kind)
                .map(|slot| SlotEntry {
                    slot,
                    assignments: rows.iter().filter(|a| a.slot == slot).cloned().collect(),
                })
                .collect()
        };
        Ok(SlotMap {
            spray: entries(SlotKind::Spray),
            bottle: entries(SlotKind::Bottle),
        })
    }
}
