//! # Kiosk Runtime
//!
//! Services implementing the fragrance kiosk on top of the `kiosk-core`
//! storage traits, plus an in-memory store.
//!
//! ## Core Components
//!
//! - **`CatalogService`**: products, prices and per-variant stock
//! - **`SlotService`**: the slot assignment table and its reservation check
//! - **`ReconciliationEngine`**: order lifecycle and post-payment decrements
//! - **`UsageTracker`**: per-slot dispense counters and the heatmap
//! - **`AdminAuth`**: bearer-token admin sessions
//! - **`SalesAnalytics`**: revenue and units from the ledger
//! - **`InMemoryStore`**: one-mutex implementation of every store trait
//!
//! ## Example
//!
//! ```ignore
//! use kiosk_runtime::{Kiosk, InMemoryStore, admin::AdminSettings};
//!
//! let kiosk = Kiosk::new(
//!     InMemoryStore::new(),
//!     gateway,
//!     Arc::new(SystemClock),
//!     AdminSettings::new("admin", "secret"),
//! );
//!
//! let order = kiosk.orders.create_spray_order(product_id, price, PaymentMethod::Upi).await?;
//! kiosk.orders.verify_and_confirm(order.id, proof).await?;
//! ```

use kiosk_core::environment::Clock;
use kiosk_core::providers::{KioskStore, PaymentGateway};
use serde::Serialize;
use std::sync::Arc;

/// Admin sessions
pub mod admin;

/// Sales analytics
pub mod analytics;

/// Product catalog
pub mod catalog;

/// Shared-secret payment gateway
pub mod gateway;

/// Prometheus metrics for observability
pub mod metrics;

/// Order lifecycle and stock reconciliation
pub mod reconciliation;

/// Slot assignment table
pub mod slots;

/// In-memory store
pub mod store;

/// Slot usage and heatmap
pub mod usage;

pub use admin::{AdminAuth, AdminSettings};
pub use analytics::{SalesAnalytics, SalesReport};
pub use catalog::CatalogService;
pub use gateway::SharedSecretGateway;
pub use reconciliation::ReconciliationEngine;
pub use slots::{SlotMap, SlotService};
pub use store::InMemoryStore;
pub use usage::UsageTracker;

/// Health check status levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,

    /// Component is operational but something needs attention
    Degraded,

    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Get the worst status between two statuses
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    /// Name of the component being checked
    pub component: String,

    /// Current health status
    pub status: HealthStatus,

    /// Optional message providing details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    /// Create a degraded check result
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Aggregated health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall system status (worst of all checks)
    pub status: HealthStatus,

    /// Individual component checks
    pub checks: Vec<HealthCheck>,

    /// Timestamp when report was generated
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    /// Create a new health report from checks
    #[must_use]
    pub fn new(checks: Vec<HealthCheck>, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .fold(HealthStatus::Healthy, HealthStatus::worst);

        Self {
            status,
            checks,
            timestamp,
        }
    }
}

/// Every kiosk service over one store.
#[derive(Clone)]
pub struct Kiosk<S> {
    /// Product catalog
    pub catalog: CatalogService<S>,
    /// Slot assignment table
    pub slots: SlotService<S>,
    /// Orders and reconciliation
    pub orders: ReconciliationEngine<S>,
    /// Usage and heatmap
    pub usage: UsageTracker<S>,
    /// Admin sessions
    pub admin: AdminAuth<S>,
    /// Sales analytics
    pub analytics: SalesAnalytics<S>,
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KioskStore> Kiosk<S> {
    /// Wire every service to `store`.
    #[must_use]
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>, clock: Arc<dyn Clock>, admin: AdminSettings) -> Self {
        Self {
            catalog: CatalogService::new(store.clone(), Arc::clone(&clock)),
            slots: SlotService::new(store.clone(), Arc::clone(&clock)),
            orders: ReconciliationEngine::new(store.clone(), gateway, Arc::clone(&clock)),
            usage: UsageTracker::new(store.clone(), Arc::clone(&clock)),
            admin: AdminAuth::new(store.clone(), Arc::clone(&clock), admin),
            analytics: SalesAnalytics::new(store.clone()),
            store,
            clock,
        }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Probe the store and the catalog.
    ///
    /// An unreachable store is unhealthy; an empty catalog or a catalog with
    /// nothing in stock is degraded.
    pub async fn health(&self) -> HealthReport {
        let check = match self.catalog.list_available().await {
            Err(err) => HealthCheck::unhealthy("store", err.to_string()),
            Ok(products) if products.is_empty() => HealthCheck::degraded("store", "no products available"),
            Ok(products) => {
                let sellable = products
                    .iter()
                    .any(|p| kiosk_core::Variant::ALL.into_iter().any(|v| p.stock.get(v) > 0));
                if sellable {
                    HealthCheck::healthy("store")
                } else {
                    HealthCheck::degraded("store", "every product is out of stock")
                }
            }
        };
        HealthReport::new(vec![check], self.clock.now())
    }
}
