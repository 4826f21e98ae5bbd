//! Payment gateway trait.
//!
//! The gateway is an external service exposing "create order" and "verify
//! payment". Its wire protocol belongs to the client implementing this trait.

use crate::error::KioskError;
use crate::types::{Money, OrderId, PaymentOutcome};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Transport-level gateway failure
///
/// A declined payment is not an error; it is reported as
/// `PaymentOutcome::Declined`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Gateway did not answer in time
    #[error("Gateway timeout")]
    Timeout,
    /// Gateway refused the request
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),
    /// Gateway unreachable or returned garbage
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for KioskError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err.to_string())
    }
}

/// Gateway-side order opened for a kiosk order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Kiosk order
    pub order_id: OrderId,
    /// Gateway's order reference, shown to the payment widget
    pub gateway_order_id: String,
    /// Amount to collect
    pub amount: Money,
}

/// What the payment widget hands back after the customer pays
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    /// Gateway order the payment belongs to
    pub gateway_order_id: String,
    /// Gateway payment reference
    pub payment_ref: String,
    /// Gateway-issued signature; its scheme belongs to the gateway
    pub signature: String,
}

/// Payment gateway trait
///
/// Object safe so the server can hold an `Arc<dyn PaymentGateway>`.
pub trait PaymentGateway: Send + Sync {
    /// Gateway order reference issued for a kiosk order
    ///
    /// `create_order` returns this reference and a proof for the order must
    /// carry it.
    fn gateway_order_id(&self, order_id: OrderId) -> String;

    /// Open a gateway order for `amount`
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure.
    fn create_order(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<GatewayOrder>> + Send>>;

    /// Check a payment proof
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failure. A bad signature or a
    /// refused payment is `Ok(PaymentOutcome::Declined)`.
    fn verify_payment(
        &self,
        proof: PaymentProof,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentOutcome>> + Send>>;
}
