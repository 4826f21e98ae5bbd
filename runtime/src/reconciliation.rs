//! Stock reconciliation engine.
//!
//! Orders move `pending → completed | failed`. Stock checks at creation are
//! advisory: nothing is reserved, so two shoppers can both pass the check for
//! the last unit. The authoritative decrement happens after payment, once per
//! order, on the single `pending → completed` edge. A decrement that then
//! finds the shelf empty is logged and counted but does not undo the payment.
//!
//! ```text
//!  create_*_order ──► pending ──confirm(Verified)──► completed ──► decrement + usage
//!                        │
//!                        └──confirm(Declined)──► failed
//! ```

use crate::metrics::KioskMetrics;
use crate::usage::UsageTracker;
use kiosk_core::allocation;
use kiosk_core::environment::Clock;
use kiosk_core::providers::{GatewayOrder, KioskStore, PaymentGateway, PaymentProof};
use kiosk_core::{
    BasketItem, KioskError, LineItem, Money, NewOrder, Order, OrderId, OrderStatus, OrderTransition,
    PaymentMethod, PaymentOutcome, Product, ProductId, Result, Variant,
};
use std::sync::Arc;
use std::time::Instant;

/// Order lifecycle and post-payment stock reconciliation.
#[derive(Clone)]
pub struct ReconciliationEngine<S> {
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    usage: UsageTracker<S>,
    clock: Arc<dyn Clock>,
}

impl<S: KioskStore> ReconciliationEngine<S> {
    /// Create the engine.
    #[must_use]
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            usage: UsageTracker::new(store.clone(), Arc::clone(&clock)),
            store,
            gateway,
            clock,
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Order creation
    // ═══════════════════════════════════════════════════════════

    /// Open a spray order for the quoted amount.
    ///
    /// The quote must be the catalog spray price; the order records it.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProductNotFound`, `KioskError::ProductUnavailable`,
    /// `KioskError::PriceMismatch` for a stale or forged quote, or
    /// `KioskError::OutOfStock` when no spray is left.
    pub async fn create_spray_order(
        &self,
        product_id: ProductId,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        let product = self.sellable(product_id).await?;
        if amount != product.prices.spray {
            return Err(KioskError::PriceMismatch { product_id, quoted: amount, price: product.prices.spray });
        }
        if product.stock.get(Variant::Spray) < 1 {
            return Err(KioskError::OutOfStock { product_id, variant: Variant::Spray });
        }

        let order = self
            .store
            .insert_order(
                NewOrder {
                    lines: vec![LineItem { product_id, variant: Variant::Spray, price: amount }],
                    payment_method,
                    amount,
                },
                self.clock.now(),
            )
            .await?;

        KioskMetrics::order_created("spray");
        tracing::info!(order_id = %order.id, product_id = %product_id, amount = amount.minor(), "Spray order created");
        Ok(order)
    }

    /// Open one order for a basket of bottles, priced at current prices.
    ///
    /// Every item is checked before anything is written. Several units of the
    /// same product and size are checked against the stock together.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::EmptyOrder`, or the first failing item's
    /// `KioskError::ProductNotFound`, `KioskError::ProductUnavailable` or
    /// `KioskError::OutOfStock`. No order is created on error.
    pub async fn create_bottle_order(
        &self,
        items: &[BasketItem],
        payment_method: PaymentMethod,
    ) -> Result<Order> {
        if items.is_empty() {
            return Err(KioskError::EmptyOrder);
        }

        let mut lines = Vec::with_capacity(items.len());
        for ((product_id, bottle_size), wanted) in allocation::basket_demand(items) {
            let product = self.sellable(product_id).await?;
            let variant = Variant::Bottle(bottle_size);
            if product.stock.get(variant) < wanted {
                return Err(KioskError::OutOfStock { product_id, variant });
            }
            let price = product.prices.get(variant);
            lines.extend((0..wanted).map(|_| LineItem { product_id, variant, price }));
        }
        let amount = lines.iter().map(|line| line.price).sum();

        let order = self
            .store
            .insert_order(NewOrder { lines, payment_method, amount }, self.clock.now())
            .await?;

        KioskMetrics::order_created("bottle");
        tracing::info!(
            order_id = %order.id,
            items = order.lines.len(),
            amount = amount.minor(),
            "Bottle order created"
        );
        Ok(order)
    }

    async fn sellable(&self, product_id: ProductId) -> Result<Product> {
        let product = self.store.get_product(product_id).await?;
        if !product.available {
            return Err(KioskError::ProductUnavailable(product_id));
        }
        Ok(product)
    }

    // ═══════════════════════════════════════════════════════════
    // Payment
    // ═══════════════════════════════════════════════════════════

    /// Settle an order with the gateway's verdict.
    ///
    /// `Verified` completes the order and then, exactly once, decrements one
    /// unit per line and records a dispense for the slot it came from. A
    /// repeated call with the same verdict returns the order untouched.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::OrderNotFound`, or `KioskError::InvalidTransition`
    /// if the order already settled the other way. Decrement failures are
    /// not errors.
    pub async fn confirm_payment(&self, order_id: OrderId, outcome: PaymentOutcome) -> Result<Order> {
        let target = match &outcome {
            PaymentOutcome::Verified { .. } => OrderStatus::Completed,
            PaymentOutcome::Declined { .. } => OrderStatus::Failed,
        };

        let order = match self.store.transition_order(order_id, target, self.clock.now()).await? {
            OrderTransition::Applied(order) => order,
            OrderTransition::Unchanged(order) => {
                tracing::debug!(order_id = %order_id, status = %order.status, "Order already settled");
                return Ok(order);
            }
        };

        match outcome {
            PaymentOutcome::Verified { payment_ref } => {
                KioskMetrics::order_completed();
                tracing::info!(order_id = %order_id, %payment_ref, "Payment confirmed");
                self.reconcile(&order).await;
            }
            PaymentOutcome::Declined { reason } => {
                KioskMetrics::order_failed();
                tracing::info!(order_id = %order_id, %reason, "Payment failed");
            }
        }
        Ok(order)
    }

    /// Mark an order as failed without asking the gateway.
    ///
    /// # Errors
    ///
    /// Same as [`Self::confirm_payment`].
    pub async fn fail_payment(&self, order_id: OrderId, reason: impl Into<String>) -> Result<Order> {
        self.confirm_payment(order_id, PaymentOutcome::Declined { reason: reason.into() })
            .await
    }

    /// Apply a completed order's lines to stock and usage.
    async fn reconcile(&self, order: &Order) {
        for line in &order.lines {
            match self.store.decrement_stock(line.product_id, line.variant, 1).await {
                Ok(decrement) => {
                    tracing::debug!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        variant = %line.variant,
                        remaining = decrement.product.stock.get(line.variant),
                        "Stock decremented"
                    );
                    if decrement.drawn_from.is_empty() {
                        tracing::warn!(
                            order_id = %order.id,
                            product_id = %line.product_id,
                            variant = %line.variant,
                            "No slot holds the sold variant"
                        );
                    }
                    for slot in decrement.drawn_from {
                        if let Err(err) = self.usage.record_usage(slot, line.product_id, line.variant).await {
                            tracing::error!(order_id = %order.id, %slot, error = %err, "Failed to record usage");
                        }
                    }
                }
                Err(err @ (KioskError::InsufficientStock { .. } | KioskError::ProductNotFound(_))) => {
                    KioskMetrics::decrement_race(line.variant);
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        variant = %line.variant,
                        error = %err,
                        "Stock decrement race: paid order left without stock"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        order_id = %order.id,
                        product_id = %line.product_id,
                        variant = %line.variant,
                        error = %err,
                        "Stock decrement failed"
                    );
                }
            }
        }
    }

    /// Open the gateway-side order so the customer can pay.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::OrderNotFound`, `KioskError::InvalidTransition` if
    /// the order already settled, or `KioskError::Gateway`.
    pub async fn open_checkout(&self, order_id: OrderId) -> Result<GatewayOrder> {
        let order = self.store.get_order(order_id).await?;
        if order.status.is_terminal() {
            return Err(KioskError::InvalidTransition {
                order_id,
                from: order.status,
                to: OrderStatus::Completed,
            });
        }

        let checkout = self.gateway.create_order(order_id, order.amount).await?;
        tracing::info!(order_id = %order_id, gateway_order_id = %checkout.gateway_order_id, "Checkout opened");
        Ok(checkout)
    }

    /// Ask the gateway about a payment, then settle the order.
    ///
    /// The proof must name the gateway order opened for `order_id`; a proof
    /// for any other order is rejected before the gateway is asked and the
    /// order is left as it was. No lock is held during the gateway round
    /// trip. A transport failure leaves the order `pending` so the kiosk can
    /// ask again.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::ProofMismatch` for a proof issued for another
    /// order, `KioskError::Gateway` on transport failure and
    /// `KioskError::PaymentVerificationFailed` when the payment was declined
    /// (the order is `failed` by then), plus the errors of
    /// [`Self::confirm_payment`].
    pub async fn verify_and_confirm(&self, order_id: OrderId, proof: PaymentProof) -> Result<Order> {
        self.store.get_order(order_id).await?;
        if proof.gateway_order_id != self.gateway.gateway_order_id(order_id) {
            tracing::warn!(
                order_id = %order_id,
                gateway_order_id = %proof.gateway_order_id,
                "Payment proof names another order"
            );
            return Err(KioskError::ProofMismatch { order_id, gateway_order_id: proof.gateway_order_id });
        }

        let started = Instant::now();
        let verdict = self.gateway.verify_payment(proof).await;
        KioskMetrics::payment_verification(started.elapsed());

        let outcome = verdict.inspect_err(|err| {
            tracing::warn!(order_id = %order_id, error = %err, "Payment verification did not complete");
        })?;

        let declined = match &outcome {
            PaymentOutcome::Declined { reason } => Some(reason.clone()),
            PaymentOutcome::Verified { .. } => None,
        };
        let order = self.confirm_payment(order_id, outcome).await?;

        match declined {
            Some(reason) => Err(KioskError::PaymentVerificationFailed { order_id, reason }),
            None => Ok(order),
        }
    }

    // ═══════════════════════════════════════════════════════════
    // Reads
    // ═══════════════════════════════════════════════════════════

    /// Get an order.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::OrderNotFound`.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store.get_order(order_id).await
    }

    /// The whole ledger, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.store.list_orders().await
    }
}
