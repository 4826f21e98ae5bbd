//! # Kiosk Core
//!
//! Domain types, storage contracts and pure allocation rules for a fragrance
//! vending kiosk.
//!
//! The machine has 5 spray testers and 15 bottle dispensers. Each product is
//! sold in four variants (a spray, or a 30/60/100 ml bottle) with independent
//! stock counters and prices. Bottle slots reserve a quantity of a variant's
//! stock; stock only decreases after a payment is confirmed.
//!
//! ## Core Concepts
//!
//! - **Variant**: the unit of stock, pricing and slot assignment
//! - **Slot**: a physical dispenser position, validated on construction
//! - **Slot assignment**: a reservation of a variant's units in a slot
//! - **Order**: a purchase attempt, `pending → completed | failed`
//! - **Providers**: storage and payment traits implemented by the runtime
//!   (in memory) and the PostgreSQL crate
//!
//! ## Invariants
//!
//! - Stock counters are never negative; bottle counters never exceed 20
//! - For every (product, bottle size) the units reserved by slot assignments
//!   never exceed the stock on hand
//! - A completed order decrements stock exactly once
//!
//! ## Example
//!
//! ```
//! use kiosk_core::{allocation, BottleSize, ProductId, Slot, SlotAssignment, AssignmentId, Variant};
//! use chrono::Utc;
//!
//! let product = ProductId::new(1);
//! let row = SlotAssignment {
//!     id: AssignmentId::new(1),
//!     slot: Slot::bottle(3).unwrap(),
//!     product_id: product,
//!     variant: Variant::Bottle(BottleSize::Ml30),
//!     slot_quantity: 4,
//!     priority: 0,
//!     assigned_at: Utc::now(),
//! };
//!
//! let free = allocation::available_quantity(5, &[row], product, BottleSize::Ml30, None);
//! assert_eq!(free, 1);
//! ```

pub mod allocation;
pub mod error;
pub mod heat;
pub mod providers;
pub mod types;

pub use error::{KioskError, Result};
pub use types::*;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};

/// Environment module - injected dependencies
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Services stamp orders, sessions and usage records through this trait so
    /// tests can pin or advance time.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
