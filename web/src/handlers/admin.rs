//! Admin session and catalog management endpoints.
//!
//! Everything except login requires `Authorization: Bearer <token>`.

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::{AdminGuard, BearerToken, ClientIp};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use kiosk_core::providers::KioskStore;
use kiosk_core::{
    AdminSession, BottleSize, NewProduct, Product, ProductId, ProductPatch, SlotAssignment, Variant,
};
use serde::{Deserialize, Serialize};

/// Admin credentials.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
}

/// Absolute stock value for one variant.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    /// Variant to set
    pub variant: Variant,
    /// New count
    pub quantity: u32,
}

/// Unreserved stock of one bottle size.
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    /// Product
    pub product_id: ProductId,
    /// Bottle size
    pub bottle_size: BottleSize,
    /// Units not yet placed in any slot
    pub available: u32,
}

/// Exchange credentials for a session token.
pub async fn login<S: KioskStore>(
    State(state): State<AppState<S>>,
    ClientIp(client_ip): ClientIp,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<AdminSession>> {
    match state.kiosk.admin.login(&request.username, &request.password).await {
        Ok(session) => {
            tracing::info!(%client_ip, "Admin session opened");
            Ok(Json(session))
        }
        Err(err) => {
            tracing::warn!(%client_ip, "Admin login rejected");
            Err(err.into())
        }
    }
}

/// End the caller's session.
pub async fn logout<S: KioskStore>(
    State(state): State<AppState<S>>,
    BearerToken(token): BearerToken,
) -> WebResult<StatusCode> {
    state.kiosk.admin.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every product, hidden ones included.
pub async fn list_products<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
) -> WebResult<Json<Vec<Product>>> {
    Ok(Json(state.kiosk.catalog.list_all().await?))
}

/// Create a product.
pub async fn create_product<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Json(product): Json<NewProduct>,
) -> WebResult<(StatusCode, Json<Product>)> {
    let product = state.kiosk.catalog.create(product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Merge a patch into a product.
pub async fn update_product<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path(id): Path<u64>,
    Json(patch): Json<ProductPatch>,
) -> WebResult<Json<Product>> {
    Ok(Json(state.kiosk.catalog.update(ProductId::new(id), patch).await?))
}

/// Delete a product and its slot assignments.
pub async fn delete_product<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path(id): Path<u64>,
) -> WebResult<StatusCode> {
    if state.kiosk.catalog.delete(ProductId::new(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Product", id))
    }
}

/// Set one variant's stock.
pub async fn set_stock<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path(id): Path<u64>,
    Json(request): Json<SetStockRequest>,
) -> WebResult<Json<Product>> {
    let product = state
        .kiosk
        .catalog
        .set_stock(ProductId::new(id), request.variant, request.quantity)
        .await?;
    Ok(Json(product))
}

/// Slots a product is placed in.
pub async fn product_assignments<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path(id): Path<u64>,
) -> WebResult<Json<Vec<SlotAssignment>>> {
    let id = ProductId::new(id);
    state.kiosk.catalog.get(id).await?;
    Ok(Json(state.kiosk.slots.assignments_for_product(id).await?))
}

/// Stock of one size not yet placed in a slot.
pub async fn available_quantity<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((id, bottle_size)): Path<(u64, BottleSize)>,
) -> WebResult<Json<AvailabilityResponse>> {
    let product_id = ProductId::new(id);
    state.kiosk.catalog.get(product_id).await?;
    let available = state.kiosk.slots.available_quantity(product_id, bottle_size, None).await?;

    Ok(Json(AvailabilityResponse { product_id, bottle_size, available }))
}
