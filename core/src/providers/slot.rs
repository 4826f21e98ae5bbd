//! Slot assignment store trait.

use crate::error::Result;
use crate::types::{BottleSize, NewAssignment, ProductId, Slot, SlotAssignment};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Slot assignment table.
///
/// The table is the authoritative product-to-slot mapping; the back-references
/// on `Product` only name a primary slot and are kept in step by these
/// operations.
pub trait SlotStore: Send + Sync {
    /// Place a product variant in a slot.
    ///
    /// A spray slot keeps a single occupant, so any previous row is replaced.
    /// A bottle slot replaces only an existing row for the same product and
    /// size; other products stay. Bottle requests are checked with
    /// [`crate::allocation::check_assignment`] against the product's stock in
    /// the same atomic step as the insert. Sets the product's primary
    /// back-reference if it has none.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound` or
    /// `KioskError::InsufficientAvailable`; the table is unchanged on error.
    fn assign(
        &self,
        request: NewAssignment,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<SlotAssignment>> + Send;

    /// Units of (`product_id`, `bottle_size`) not reserved by any slot other
    /// than `excluding`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`.
    fn available_quantity(
        &self,
        product_id: ProductId,
        bottle_size: BottleSize,
        excluding: Option<Slot>,
    ) -> impl Future<Output = Result<u32>> + Send;

    /// Remove every assignment in a slot.
    ///
    /// # Returns
    ///
    /// Number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn clear_slot(&self, slot: Slot) -> impl Future<Output = Result<usize>> + Send;

    /// Remove one product's row from a slot.
    ///
    /// With `bottle_size` only that size's row matches. Stock is untouched.
    ///
    /// # Returns
    ///
    /// `true` if a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn remove_assignment(
        &self,
        product_id: ProductId,
        slot: Slot,
        bottle_size: Option<BottleSize>,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Rows in a slot, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn assignments_for_slot(
        &self,
        slot: Slot,
    ) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send;

    /// Rows holding a product, ordered by slot.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn assignments_for_product(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send;

    /// Every row, ordered by slot.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn all_assignments(&self) -> impl Future<Output = Result<Vec<SlotAssignment>>> + Send;
}
