//! Customer-facing catalog endpoints.
//!
//! - GET /api/products - products visible on the kiosk
//! - GET /api/products/:id - one visible product

use crate::WebResult;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
};
use kiosk_core::providers::KioskStore;
use kiosk_core::{KioskError, Product, ProductId};

/// List available products.
pub async fn list_products<S: KioskStore>(State(state): State<AppState<S>>) -> WebResult<Json<Vec<Product>>> {
    Ok(Json(state.kiosk.catalog.list_available().await?))
}

/// Get one product.
///
/// Hidden products answer 404 here; admins see them under
/// `/api/admin/products`.
pub async fn get_product<S: KioskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> WebResult<Json<Product>> {
    let id = ProductId::new(id);
    let product = state.kiosk.catalog.get(id).await?;
    if !product.available {
        return Err(KioskError::ProductNotFound(id).into());
    }
    Ok(Json(product))
}
