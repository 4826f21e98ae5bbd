use kiosk_core::providers::{GatewayError, GatewayOrder, GatewayResult, PaymentGateway, PaymentProof};
use kiosk_core::{Money, OrderId, PaymentOutcome};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Verdict {
    Approve,
    Decline(String),
    Fail(GatewayError),
}

#[derive(Debug, Default)]
struct Script {
    default: Option<Verdict>,
    per_order: HashMap<String, Verdict>,
    opened: Vec<GatewayOrder>,
    verified: Vec<PaymentProof>,
}

/// Scripted payment gateway
///
/// Approves everything unless told otherwise. Verdicts can be set for all
/// payments or per gateway order id, and every call is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl MockPaymentGateway {
    /// Gateway that approves every payment
    #[must_use]
    pub fn approving() -> Self {
        Self::default()
    }

    /// Gateway that declines every payment with `reason`
    #[must_use]
    pub fn declining(reason: impl Into<String>) -> Self {
        let gateway = Self::default();
        gateway.set_default(Verdict::Decline(reason.into()));
        gateway
    }

    /// Gateway whose verification calls fail in transport
    #[must_use]
    pub fn failing(error: GatewayError) -> Self {
        let gateway = Self::default();
        gateway.set_default(Verdict::Fail(error));
        gateway
    }

    /// Sleep this long inside every call
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Decline payments for one gateway order
    pub fn decline_order(&self, gateway_order_id: impl Into<String>, reason: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script
                .per_order
                .insert(gateway_order_id.into(), Verdict::Decline(reason.into()));
        }
    }

    /// Gateway orders opened so far
    #[must_use]
    pub fn opened_orders(&self) -> Vec<GatewayOrder> {
        self.script.lock().map(|s| s.opened.clone()).unwrap_or_default()
    }

    /// Number of verification calls so far
    #[must_use]
    pub fn verify_calls(&self) -> usize {
        self.script.lock().map(|s| s.verified.len()).unwrap_or_default()
    }

    /// Proof the mock accepts for `order_id`
    #[must_use]
    pub fn proof_for(order_id: OrderId) -> PaymentProof {
        PaymentProof {
            gateway_order_id: gateway_order_id(order_id),
            payment_ref: format!("mock_pay_{}", uuid::Uuid::new_v4()),
            signature: "mock-signature".to_string(),
        }
    }

    fn set_default(&self, verdict: Verdict) {
        if let Ok(mut script) = self.script.lock() {
            script.default = Some(verdict);
        }
    }
}

fn gateway_order_id(order_id: OrderId) -> String {
    format!("mock_order_{order_id}")
}

impl PaymentGateway for MockPaymentGateway {
    fn gateway_order_id(&self, order_id: OrderId) -> String {
        gateway_order_id(order_id)
    }

    fn create_order(
        &self,
        order_id: OrderId,
        amount: Money,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<GatewayOrder>> + Send>> {
        let script = Arc::clone(&self.script);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let order = GatewayOrder {
                order_id,
                gateway_order_id: gateway_order_id(order_id),
                amount,
            };
            script
                .lock()
                .map_err(|_| GatewayError::Unavailable("mock lock poisoned".to_string()))?
                .opened
                .push(order.clone());
            tracing::debug!(order_id = %order_id, amount = amount.minor(), "Mock gateway order opened");
            Ok(order)
        })
    }

    fn verify_payment(
        &self,
        proof: PaymentProof,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentOutcome>> + Send>> {
        let script = Arc::clone(&self.script);
        let delay = self.delay;
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let verdict = {
                let mut script = script
                    .lock()
                    .map_err(|_| GatewayError::Unavailable("mock lock poisoned".to_string()))?;
                script.verified.push(proof.clone());
                script
                    .per_order
                    .get(&proof.gateway_order_id)
                    .or(script.default.as_ref())
                    .cloned()
                    .unwrap_or(Verdict::Approve)
            };
            match verdict {
                Verdict::Approve => Ok(PaymentOutcome::Verified { payment_ref: proof.payment_ref }),
                Verdict::Decline(reason) => Ok(PaymentOutcome::Declined { reason }),
                Verdict::Fail(err) => Err(err),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_approves_by_default() {
        let gateway = MockPaymentGateway::approving();
        let proof = MockPaymentGateway::proof_for(OrderId::new(1));

        let outcome = gateway.verify_payment(proof.clone()).await.unwrap();

        assert_eq!(outcome, PaymentOutcome::Verified { payment_ref: proof.payment_ref });
        assert_eq!(gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_per_order_decline_overrides_default() {
        let gateway = MockPaymentGateway::approving();
        gateway.decline_order("mock_order_2", "card declined");

        let declined = gateway.verify_payment(MockPaymentGateway::proof_for(OrderId::new(2))).await.unwrap();
        let approved = gateway.verify_payment(MockPaymentGateway::proof_for(OrderId::new(3))).await.unwrap();

        assert!(matches!(declined, PaymentOutcome::Declined { .. }));
        assert!(matches!(approved, PaymentOutcome::Verified { .. }));
    }

    #[test]
    fn test_failing_gateway() {
        let gateway = MockPaymentGateway::failing(GatewayError::Timeout);
        let result = tokio_test::block_on(gateway.verify_payment(MockPaymentGateway::proof_for(OrderId::new(1))));
        assert_eq!(result, Err(GatewayError::Timeout));
    }
}
