//! Application state shared by every handler.

use kiosk_core::providers::KioskStore;
use kiosk_runtime::Kiosk;
use kiosk_runtime::metrics::MetricsExporter;
use std::sync::Arc;

/// The kiosk services plus the metrics exporter.
///
/// Generic over the store so the same router serves the in-memory and the
/// PostgreSQL backends.
pub struct AppState<S> {
    /// Every kiosk service
    pub kiosk: Arc<Kiosk<S>>,
    /// Prometheus exporter (may be uninstalled in tests)
    pub metrics: Arc<MetricsExporter>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            kiosk: Arc::clone(&self.kiosk),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S: KioskStore> AppState<S> {
    /// Create state without a metrics recorder.
    #[must_use]
    pub fn new(kiosk: Kiosk<S>) -> Self {
        Self::with_metrics(kiosk, MetricsExporter::new())
    }

    /// Create state around an installed exporter.
    #[must_use]
    pub fn with_metrics(kiosk: Kiosk<S>, metrics: MetricsExporter) -> Self {
        Self {
            kiosk: Arc::new(kiosk),
            metrics: Arc::new(metrics),
        }
    }
}
