//! Slot usage store trait.

use crate::error::Result;
use crate::types::{ProductId, Slot, SlotUsage};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Per-slot dispense counters. Increment only.
pub trait UsageStore: Send + Sync {
    /// Count one dispense event from `slot`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn record_usage(
        &self,
        slot: Slot,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<SlotUsage>> + Send;

    /// Counters for every slot that has been used.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn usage_records(&self) -> impl Future<Output = Result<Vec<SlotUsage>>> + Send;
}
