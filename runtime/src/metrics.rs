//! Prometheus metrics for the kiosk services.
//!
//! Counters cover the order lifecycle, stock reconciliation, slot allocation
//! and admin logins. The web crate renders them at `/metrics`.
//!
//! # Example
//!
//! ```rust,no_run
//! use kiosk_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! let text = exporter.render().unwrap_or_default();
//! # Ok(())
//! # }
//! ```

use kiosk_core::Variant;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus exporter.
///
/// Installs the global recorder once and renders the scrape body on demand.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (several servers in one test
    /// process), this logs a warning and leaves the exporter without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Orders
    describe_counter!("kiosk_orders_created_total", "Orders created, by kind");
    describe_counter!("kiosk_orders_completed_total", "Orders moved to completed");
    describe_counter!("kiosk_orders_failed_total", "Orders moved to failed");
    describe_histogram!(
        "kiosk_payment_verification_duration_seconds",
        "Round trip to the payment gateway for verification"
    );

    // Stock
    describe_counter!(
        "kiosk_stock_decrement_races_total",
        "Post-payment decrements that found too little stock"
    );
    describe_counter!("kiosk_dispense_events_total", "Units dispensed, by variant");

    // Slots
    describe_counter!(
        "kiosk_slot_assignments_rejected_total",
        "Slot assignments rejected for lack of unreserved stock"
    );

    // Admin
    describe_counter!("kiosk_admin_logins_total", "Admin login attempts, by outcome");
}

/// Kiosk metrics recorder.
pub struct KioskMetrics;

impl KioskMetrics {
    /// Record a new order.
    pub fn order_created(kind: &'static str) {
        counter!("kiosk_orders_created_total", "kind" => kind).increment(1);
    }

    /// Record an order reaching `completed`.
    pub fn order_completed() {
        counter!("kiosk_orders_completed_total").increment(1);
    }

    /// Record an order reaching `failed`.
    pub fn order_failed() {
        counter!("kiosk_orders_failed_total").increment(1);
    }

    /// Record a gateway verification round trip.
    pub fn payment_verification(duration: Duration) {
        histogram!("kiosk_payment_verification_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a decrement that lost the race for the last units.
    pub fn decrement_race(variant: Variant) {
        counter!("kiosk_stock_decrement_races_total", "variant" => variant.as_str()).increment(1);
    }

    /// Record a dispensed unit.
    pub fn dispensed(variant: Variant) {
        counter!("kiosk_dispense_events_total", "variant" => variant.as_str()).increment(1);
    }

    /// Record a rejected slot assignment.
    pub fn assignment_rejected() {
        counter!("kiosk_slot_assignments_rejected_total").increment(1);
    }

    /// Record a login attempt.
    pub fn admin_login(success: bool) {
        let outcome = if success { "success" } else { "rejected" };
        counter!("kiosk_admin_logins_total", "outcome" => outcome).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninstalled_exporter_renders_nothing() {
        let exporter = MetricsExporter::new();
        assert!(exporter.render().is_none());
    }

    #[test]
    fn test_recording_without_recorder_is_a_no_op() {
        KioskMetrics::order_created("spray");
        KioskMetrics::decrement_race(Variant::Spray);
        KioskMetrics::admin_login(false);
        KioskMetrics::payment_verification(Duration::from_millis(5));
    }
}
