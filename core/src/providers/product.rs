//! Product store trait.

use crate::error::Result;
use crate::types::{NewProduct, Product, ProductId, ProductPatch, Slot, Variant};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Result of a successful stock decrement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockDecrement {
    /// Product after the decrement
    pub product: Product,
    /// Slot each unit was drawn from, in dispense order
    ///
    /// Shorter than the decremented amount when no slot held the variant.
    pub drawn_from: Vec<Slot>,
}

/// Product/variant store.
///
/// # Implementation Notes
///
/// - Ids come from a sequence owned by the store
/// - `set_stock` and `decrement_stock` check and write atomically per product
/// - The bottle ceiling and reservation checks live in
///   [`crate::allocation::check_stock_change`] so every backend applies them
pub trait ProductStore: Send + Sync {
    /// Get a product.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound` if no product has this id.
    fn get_product(&self, id: ProductId) -> impl Future<Output = Result<Product>> + Send;

    /// List every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>>> + Send;

    /// Create a product under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for bottle stock above the ceiling.
    fn insert_product(
        &self,
        product: NewProduct,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Product>> + Send;

    /// Apply a shallow patch.
    ///
    /// Stock values in the patch go through the same checks as `set_stock`;
    /// if any is rejected nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`, `KioskError::LimitExceeded` or
    /// `KioskError::BelowReserved`.
    fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> impl Future<Output = Result<Product>> + Send;

    /// Delete a product and its slot assignments.
    ///
    /// # Returns
    ///
    /// `true` if the product existed.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<bool>> + Send;

    /// Set a variant's stock to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`, `KioskError::LimitExceeded` for a
    /// bottle value above 20, or `KioskError::BelowReserved` when slots already
    /// hold more units than `quantity`.
    fn set_stock(
        &self,
        id: ProductId,
        variant: Variant,
        quantity: u32,
    ) -> impl Future<Output = Result<Product>> + Send;

    /// Remove `amount` units of a variant, drawing them from the slots.
    ///
    /// The only operation that lowers stock. Fails closed: when fewer than
    /// `amount` units are on hand nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound` or `KioskError::InsufficientStock`.
    fn decrement_stock(
        &self,
        id: ProductId,
        variant: Variant,
        amount: u32,
    ) -> impl Future<Output = Result<StockDecrement>> + Send;
}
