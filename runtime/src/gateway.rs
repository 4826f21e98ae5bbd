//! Shared-secret payment gateway.
//!
//! Stands in for a card processor when payments are confirmed by an
//! attendant terminal that knows a secret shared with the kiosk. The
//! terminal echoes the gateway order id and presents the secret as the
//! proof's signature; anything else is declined. The signature does not
//! cover the references, so binding a proof to its order is left to the
//! caller comparing `gateway_order_id`.

use constant_time_eq::constant_time_eq;
use kiosk_core::providers::{GatewayError, GatewayOrder, GatewayResult, PaymentGateway, PaymentProof};
use kiosk_core::{Money, OrderId, PaymentOutcome};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const ORDER_PREFIX: &str = "kiosk_";

/// Gateway that verifies proofs against a shared secret.
#[derive(Clone)]
pub struct SharedSecretGateway {
    secret: Option<Arc<str>>,
}

impl SharedSecretGateway {
    /// Gateway keyed by `secret`. An empty secret leaves it unconfigured.
    #[must_use]
    pub fn new(secret: impl AsRef<str>) -> Self {
        let secret = secret.as_ref();
        Self {
            secret: (!secret.is_empty()).then(|| Arc::from(secret)),
        }
    }


    fn verify(&self, proof: &PaymentProof) -> GatewayResult<PaymentOutcome> {
        let Some(secret) = &self.secret else {
            return Err(GatewayError::Unavailable("no payment secret configured".to_string()));
        };

        if !proof.gateway_order_id.starts_with(ORDER_PREFIX) {
            return Ok(PaymentOutcome::Declined { reason: "unknown gateway order".to_string() });
        }
        if !constant_time_eq(proof.signature.as_bytes(), secret.as_bytes()) {
            return Ok(PaymentOutcome::Declined { reason: "signature mismatch".to_string() });
        }

        Ok(PaymentOutcome::Verified { payment_ref: proof.payment_ref.clone() })
    }
}

impl fmt::Debug for SharedSecretGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecretGateway")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl PaymentGateway for SharedSecretGateway {
    fn gateway_order_id(&self, order_id: OrderId) -> String {
        format!("{ORDER_PREFIX}{order_id}")
    }

    fn create_order(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<GatewayOrder>> + Send>> {
        let order = GatewayOrder {
            order_id,
            gateway_order_id: self.gateway_order_id(order_id),
            amount,
        };
        Box::pin(async move { Ok(order) })
    }

    fn verify_payment(
        &self,
        proof: PaymentProof,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentOutcome>> + Send>> {
        let result = self.verify(&proof);
        Box::pin(async move { result })
    }
}
