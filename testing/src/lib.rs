//! # Kiosk Testing
//!
//! Testing utilities for the fragrance kiosk.
//!
//! This crate provides:
//! - Deterministic clocks (`FixedClock`, `ManualClock`)
//! - `MockPaymentGateway` with scripted verdicts
//! - Product fixtures and a fully wired in-memory `TestKiosk`
//! - Invariant checks over any store
//! - proptest strategies for domain types and store operations
//!
//! ## Example
//!
//! ```ignore
//! use kiosk_testing::{TestKiosk, ProductBuilder};
//!
//! #[tokio::test]
//! async fn test_spray_purchase() {
//!     let harness = TestKiosk::new();
//!     let product = harness.kiosk.catalog.create(ProductBuilder::new("Amber").spray(10).build()).await.unwrap();
//!
//!     let order = harness.kiosk.orders
//!         .create_spray_order(product.id, product.prices.spray, PaymentMethod::Upi)
//!         .await
//!         .unwrap();
//!
//!     harness.kiosk.orders.confirm_payment(order.id, verified()).await.unwrap();
//!     kiosk_testing::assertions::check_invariants(harness.kiosk.store()).await.unwrap();
//! }
//! ```

use chrono::{DateTime, Utc};
use kiosk_core::environment::Clock;

/// Invariant checks over a store
pub mod assertions;

/// Product fixtures and a wired test kiosk
pub mod fixtures;

/// Scripted payment gateway
pub mod gateway;

/// Property-based testing utilities using proptest.
pub mod properties;

/// Mock clocks for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use kiosk_testing::mocks::FixedClock;
    /// use kiosk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep one handle and pass
    /// another to the services.
    ///
    /// ```
    /// use kiosk_testing::mocks::ManualClock;
    /// use kiosk_core::environment::Clock;
    /// use chrono::Duration;
    ///
    /// let clock = ManualClock::starting_at(kiosk_testing::test_time());
    /// let before = clock.now();
    /// clock.advance(Duration::hours(25));
    /// assert_eq!(clock.now() - before, Duration::hours(25));
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock reading `time`
        #[must_use]
        pub fn starting_at(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(Mutex::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            if let Ok(mut time) = self.time.lock() {
                *time += by;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.time.lock().map_or_else(|poisoned| *poisoned.into_inner(), |time| *time)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(super::test_time())
    }
}

/// 2025-01-01 00:00:00 UTC
#[must_use]
pub fn test_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}

// Re-export commonly used items
pub use fixtures::{ADMIN_PASSWORD, ADMIN_USERNAME, ProductBuilder, TestKiosk, standard_prices};
pub use gateway::MockPaymentGateway;
pub use mocks::{FixedClock, ManualClock, test_clock};
