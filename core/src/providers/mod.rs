//! Storage and payment provider traits.
//!
//! The services in `kiosk-runtime` are written against these traits. Storage
//! is implemented in memory by `kiosk-runtime::store` and in PostgreSQL by
//! `kiosk-postgres`; payment is implemented by a gateway client or by
//! `MockPaymentGateway` in tests.
//!
//! Every storage operation that checks a rule and then writes (stock changes,
//! bottle assignments, order transitions) is atomic inside the implementation.
//! Callers never read-then-write across two calls.

mod order;
mod payment;
mod product;
mod session;
mod slot;
mod usage;

pub use order::OrderStore;
pub use payment::{GatewayError, GatewayOrder, GatewayResult, PaymentGateway, PaymentProof};
pub use product::{ProductStore, StockDecrement};
pub use session::SessionStore;
pub use slot::SlotStore;
pub use usage::UsageStore;

/// Everything the kiosk services need from storage
///
/// Implemented automatically for any cheap-to-clone type implementing every
/// store trait.
pub trait KioskStore:
    ProductStore + SlotStore + OrderStore + SessionStore + UsageStore + Clone + Send + Sync + 'static
{
}

impl<T> KioskStore for T where
    T: ProductStore + SlotStore + OrderStore + SessionStore + UsageStore + Clone + Send + Sync + 'static
{
}
