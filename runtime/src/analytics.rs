//! Sales analytics derived from the order ledger.

use kiosk_core::providers::KioskStore;
use kiosk_core::{Money, Order, OrderStatus, ProductId, Result, Variant};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Units and revenue for one variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSales {
    /// Variant
    pub variant: Variant,
    /// Units sold
    pub units: u64,
    /// Revenue from those units
    pub revenue: Money,
}

/// Units and revenue for one product
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    /// Product
    pub product_id: ProductId,
    /// Current name, if the product still exists
    pub name: Option<String>,
    /// Units sold across all variants
    pub units: u64,
    /// Revenue across all variants
    pub revenue: Money,
}

/// Dashboard sales summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    /// Orders still waiting for payment
    pub pending_orders: u64,
    /// Paid orders
    pub completed_orders: u64,
    /// Failed orders
    pub failed_orders: u64,
    /// Σ amount of completed orders
    pub revenue: Money,
    /// Per-variant totals, every variant listed
    pub by_variant: Vec<VariantSales>,
    /// Per-product totals, highest revenue first
    pub top_products: Vec<ProductSales>,
}

impl SalesReport {
    /// Summarizes a ledger
    ///
    /// Only completed orders count toward units and revenue.
    #[must_use]
    pub fn from_orders(orders: &[Order], names: &HashMap<ProductId, String>) -> Self {
        let mut pending_orders = 0;
        let mut completed_orders = 0;
        let mut failed_orders = 0;
        let mut revenue = Money::ZERO;
        let mut by_variant: Vec<VariantSales> = Variant::ALL
            .into_iter()
            .map(|variant| VariantSales { variant, units: 0, revenue: Money::ZERO })
            .collect();
        let mut by_product: HashMap<ProductId, (u64, Money)> = HashMap::new();

        for order in orders {
            match order.status {
                OrderStatus::Pending => pending_orders += 1,
                OrderStatus::Failed => failed_orders += 1,
                OrderStatus::Completed => {
                    completed_orders += 1;
                    revenue = revenue.saturating_add(order.amount);
                    for line in &order.lines {
                        if let Some(entry) = by_variant.iter_mut().find(|v| v.variant == line.variant) {
                            entry.units += 1;
                            entry.revenue = entry.revenue.saturating_add(line.price);
                        }
                        let product = by_product.entry(line.product_id).or_insert((0, Money::ZERO));
                        product.0 += 1;
                        product.1 = product.1.saturating_add(line.price);
                    }
                }
            }
        }

        let mut top_products: Vec<ProductSales> = by_product
            .into_iter()
            .map(|(product_id, (units, revenue))| ProductSales {
                product_id,
                name: names.get(&product_id).cloned(),
                units,
                revenue,
            })
            .collect();
        top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then(a.product_id.cmp(&b.product_id)));

        Self {
            pending_orders,
            completed_orders,
            failed_orders,
            revenue,
            by_variant,
            top_products,
        }
    }
}

/// Sales analytics service.
#[derive(Clone)]
pub struct SalesAnalytics<S> {
    store: S,
}

impl<S: KioskStore> SalesAnalytics<S> {
    /// Create the service.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Build the report from the current ledger.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn report(&self) -> Result<SalesReport> {
        let orders = self.store.list_orders().await?;
        let names = self
            .store
            .list_products()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        Ok(SalesReport::from_orders(&orders, &names))
    }
}
