//! Product/variant catalog.

use kiosk_core::environment::Clock;
use kiosk_core::providers::KioskStore;
use kiosk_core::{NewProduct, Product, ProductId, ProductPatch, Result, Variant};
use std::sync::Arc;

/// Product catalog service.
///
/// Customer reads see only available products; admin reads see everything.
#[derive(Clone)]
pub struct CatalogService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KioskStore> CatalogService<S> {
    /// Create a catalog over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Get a product, visible or not.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store.get_product(id).await
    }

    /// Products customers can buy.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn list_available(&self) -> Result<Vec<Product>> {
        let mut products = self.store.list_products().await?;
        products.retain(|p| p.available);
        Ok(products)
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        self.store.list_products().await
    }

    /// Create a product; missing stock values take the defaults.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::LimitExceeded` for bottle stock above 20.
    pub async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = self.store.insert_product(product, self.clock.now()).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`, `KioskError::LimitExceeded` or
    /// `KioskError::BelowReserved`.
    pub async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<Product> {
        let product = self.store.update_product(id, patch).await?;
        tracing::info!(product_id = %id, "Product updated");
        Ok(product)
    }

    /// Delete a product and its slot assignments.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool> {
        let deleted = self.store.delete_product(id).await?;
        if deleted {
            tracing::info!(product_id = %id, "Product deleted");
        }
        Ok(deleted)
    }

    /// Set a variant's stock to an absolute value.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`, `KioskError::LimitExceeded` or
    /// `KioskError::BelowReserved`.
    pub async fn set_stock(&self, id: ProductId, variant: Variant, quantity: u32) -> Result<Product> {
        let product = self.store.set_stock(id, variant, quantity).await?;
        tracing::info!(product_id = %id, %variant, quantity, "Stock set");
        Ok(product)
    }
}
