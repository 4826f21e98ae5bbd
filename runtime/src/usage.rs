//! Slot usage and heatmap.

use crate::metrics::KioskMetrics;
use kiosk_core::environment::Clock;
use kiosk_core::heat::{HeatLevel, Heatmap};
use kiosk_core::providers::KioskStore;
use kiosk_core::{ProductId, Result, Slot, SlotUsage, Variant};
use std::sync::Arc;

/// Records dispense events and derives slot popularity.
#[derive(Clone)]
pub struct UsageTracker<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KioskStore> UsageTracker<S> {
    /// Create a tracker over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Count one dispense from `slot`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn record_usage(&self, slot: Slot, product_id: ProductId, variant: Variant) -> Result<SlotUsage> {
        let usage = self.store.record_usage(slot, product_id, self.clock.now()).await?;
        KioskMetrics::dispensed(variant);
        tracing::debug!(%slot, product_id = %product_id, usage_count = usage.usage_count, "Usage recorded");
        Ok(usage)
    }

    /// Bucket a 0–100 popularity score.
    #[must_use]
    pub const fn heat_level(score: u8) -> HeatLevel {
        HeatLevel::from_score(score)
    }

    /// Heat of every slot, for dashboard polling.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn snapshot(&self) -> Result<Heatmap> {
        let records = self.store.usage_records().await?;
        Ok(Heatmap::build(&records))
    }
}
