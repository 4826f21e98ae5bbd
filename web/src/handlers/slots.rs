//! Slot management endpoints (admin only).
//!
//! Slots are addressed as `/:kind/:n` with `kind` either `spray` or
//! `bottle`. Spray slots are assigned with PUT (the newcomer replaces the
//! occupant); bottle slots with POST (several products share a slot).

use crate::WebResult;
use crate::error::AppError;
use crate::extractors::AdminGuard;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use kiosk_core::providers::KioskStore;
use kiosk_core::{BottleSize, KioskError, ProductId, Slot, SlotAssignment, SlotKind, Variant};
use kiosk_runtime::SlotMap;
use serde::{Deserialize, Serialize};

/// Request to put a spray tester in a slot.
#[derive(Debug, Deserialize)]
pub struct AssignSprayRequest {
    /// Product
    pub product_id: ProductId,
    /// Dispense priority, lower first
    #[serde(default)]
    pub priority: u32,
}

/// Request to reserve bottles in a slot.
#[derive(Debug, Deserialize)]
pub struct AssignBottleRequest {
    /// Product
    pub product_id: ProductId,
    /// Bottle size
    pub bottle_size: BottleSize,
    /// Units to place
    pub slot_quantity: u32,
    /// Dispense priority, lower first
    #[serde(default)]
    pub priority: u32,
}

/// Filter for removing one product from a slot.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveQuery {
    /// Only the row of this size
    #[serde(default)]
    pub size: Option<BottleSize>,
}

/// Rows removed by a clear.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedResponse {
    /// Slot that was cleared
    pub slot: Slot,
    /// Rows removed
    pub removed: usize,
}

/// Every slot with its rows.
pub async fn slot_map<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
) -> WebResult<Json<SlotMap>> {
    Ok(Json(state.kiosk.slots.slot_map().await?))
}

/// Rows in one slot.
pub async fn slot_assignments<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((kind, number)): Path<(SlotKind, u8)>,
) -> WebResult<Json<Vec<SlotAssignment>>> {
    let slot = Slot::new(kind, number)?;
    Ok(Json(state.kiosk.slots.assignments_for_slot(slot).await?))
}

/// Put a spray tester in a spray slot.
pub async fn assign_spray<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((kind, number)): Path<(SlotKind, u8)>,
    Json(request): Json<AssignSprayRequest>,
) -> WebResult<Json<SlotAssignment>> {
    if kind != SlotKind::Spray {
        return Err(KioskError::VariantMismatch { kind, variant: Variant::Spray }.into());
    }

    let row = state
        .kiosk
        .slots
        .assign_spray(request.product_id, number, request.priority)
        .await?;
    Ok(Json(row))
}

/// Reserve bottles in a bottle slot.
pub async fn assign_bottle<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((kind, number)): Path<(SlotKind, u8)>,
    Json(request): Json<AssignBottleRequest>,
) -> WebResult<(StatusCode, Json<SlotAssignment>)> {
    if kind != SlotKind::Bottle {
        return Err(KioskError::VariantMismatch { kind, variant: Variant::Bottle(request.bottle_size) }.into());
    }

    let row = state
        .kiosk
        .slots
        .assign_bottle(request.product_id, number, request.bottle_size, request.priority, request.slot_quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Empty a slot.
pub async fn clear_slot<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((kind, number)): Path<(SlotKind, u8)>,
) -> WebResult<Json<ClearedResponse>> {
    let slot = Slot::new(kind, number)?;
    let removed = state.kiosk.slots.clear_slot(slot).await?;
    Ok(Json(ClearedResponse { slot, removed }))
}

/// Take one product out of a slot, optionally only one size.
pub async fn remove_assignment<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
    Path((kind, number, product_id)): Path<(SlotKind, u8, u64)>,
    Query(query): Query<RemoveQuery>,
) -> WebResult<StatusCode> {
    let slot = Slot::new(kind, number)?;
    let removed = state
        .kiosk
        .slots
        .remove_assignment(ProductId::new(product_id), slot, query.size)
        .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Assignment", format!("{product_id} in {slot}")))
    }
}
