//! Order and payment endpoints.
//!
//! - POST /api/orders/spray - open a spray order
//! - POST /api/orders/bottles - open a bottle order for a basket
//! - GET /api/orders/:id - order status
//! - POST /api/orders/:id/checkout - open the gateway checkout
//! - POST /api/orders/:id/verify - verify the gateway proof and settle
//! - POST /api/orders/:id/fail - abandon or fail the payment
//!
//! # Payment Flow
//!
//! 1. **Create**: the order is stored as `pending`; nothing is reserved
//! 2. **Checkout**: the gateway issues its own order reference
//! 3. **Verify**: a verified proof completes the order and decrements stock
//!    exactly once; a declined proof fails it

use crate::WebResult;
use crate::extractors::CorrelationId;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use kiosk_core::providers::{GatewayOrder, KioskStore, PaymentProof};
use kiosk_core::{BasketItem, Money, Order, OrderId, PaymentMethod, ProductId};
use serde::Deserialize;

/// Request to open a spray order.
#[derive(Debug, Deserialize)]
pub struct SprayOrderRequest {
    /// Product to spray
    pub product_id: ProductId,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Amount in minor units; must equal the catalog spray price, which is
    /// used when omitted
    #[serde(default)]
    pub amount: Option<Money>,
}

/// Request to open a bottle order.
#[derive(Debug, Deserialize)]
pub struct BottleOrderRequest {
    /// One entry per bottle
    pub items: Vec<BasketItem>,
    /// How the customer pays
    pub payment_method: PaymentMethod,
}

/// Request to fail a payment.
#[derive(Debug, Default, Deserialize)]
pub struct FailPaymentRequest {
    /// Why the payment failed
    #[serde(default)]
    pub reason: Option<String>,
}

/// Open a spray order.
pub async fn create_spray_order<S: KioskStore>(
    State(state): State<AppState<S>>,
    correlation_id: CorrelationId,
    Json(request): Json<SprayOrderRequest>,
) -> WebResult<(StatusCode, Json<Order>)> {
    let amount = match request.amount {
        Some(amount) => amount,
        None => state.kiosk.catalog.get(request.product_id).await?.prices.spray,
    };

    let order = state
        .kiosk
        .orders
        .create_spray_order(request.product_id, amount, request.payment_method)
        .await?;

    tracing::debug!(correlation_id = %correlation_id.0, order_id = %order.id, "Spray order opened");
    Ok((StatusCode::CREATED, Json(order)))
}

/// Open a bottle order.
pub async fn create_bottle_order<S: KioskStore>(
    State(state): State<AppState<S>>,
    correlation_id: CorrelationId,
    Json(request): Json<BottleOrderRequest>,
) -> WebResult<(StatusCode, Json<Order>)> {
    let order = state
        .kiosk
        .orders
        .create_bottle_order(&request.items, request.payment_method)
        .await?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        order_id = %order.id,
        bottles = order.lines.len(),
        "Bottle order opened"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Get an order.
pub async fn get_order<S: KioskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> WebResult<Json<Order>> {
    Ok(Json(state.kiosk.orders.get_order(OrderId::new(id)).await?))
}

/// Open the gateway checkout for a pending order.
pub async fn checkout<S: KioskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> WebResult<Json<GatewayOrder>> {
    Ok(Json(state.kiosk.orders.open_checkout(OrderId::new(id)).await?))
}

/// Verify a gateway proof and settle the order.
///
/// A declined proof answers 402 and leaves the order `failed`. Verifying an
/// already completed order returns it unchanged.
pub async fn verify_payment<S: KioskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
    Json(proof): Json<PaymentProof>,
) -> WebResult<Json<Order>> {
    Ok(Json(state.kiosk.orders.verify_and_confirm(OrderId::new(id), proof).await?))
}

/// Fail a pending order.
pub async fn fail_payment<S: KioskStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
    request: Option<Json<FailPaymentRequest>>,
) -> WebResult<Json<Order>> {
    let reason = request
        .and_then(|Json(request)| request.reason)
        .unwrap_or_else(|| "cancelled by customer".to_string());

    Ok(Json(state.kiosk.orders.fail_payment(OrderId::new(id), reason).await?))
}
