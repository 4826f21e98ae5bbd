//! Reporting endpoints (admin only).

use crate::WebResult;
use crate::extractors::AdminGuard;
use crate::state::AppState;
use axum::{Json, extract::State};
use kiosk_core::Order;
use kiosk_core::heat::Heatmap;
use kiosk_core::providers::KioskStore;
use kiosk_runtime::SalesReport;

/// Every order, oldest first.
pub async fn order_ledger<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
) -> WebResult<Json<Vec<Order>>> {
    Ok(Json(state.kiosk.orders.list_orders().await?))
}

/// Slot popularity snapshot.
pub async fn heatmap<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
) -> WebResult<Json<Heatmap>> {
    Ok(Json(state.kiosk.usage.snapshot().await?))
}

/// Sales totals from the order ledger.
pub async fn sales<S: KioskStore>(
    State(state): State<AppState<S>>,
    _admin: AdminGuard,
) -> WebResult<Json<SalesReport>> {
    Ok(Json(state.kiosk.analytics.report().await?))
}
