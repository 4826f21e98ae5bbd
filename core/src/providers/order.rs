//! Order ledger trait.

use crate::error::Result;
use crate::types::{NewOrder, Order, OrderId, OrderStatus, OrderTransition};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Append-mostly order ledger.
pub trait OrderStore: Send + Sync {
    /// Append a `pending` order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn insert_order(
        &self,
        order: NewOrder,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Order>> + Send;

    /// Get an order.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::OrderNotFound`.
    fn get_order(&self, id: OrderId) -> impl Future<Output = Result<Order>> + Send;

    /// Every order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<Order>>> + Send;

    /// Compare-and-set the status out of `pending`.
    ///
    /// Exactly one caller observes `Applied` for a given order; a repeat of
    /// the same terminal status returns `Unchanged`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::OrderNotFound`, or `KioskError::InvalidTransition`
    /// when the order already holds a different terminal status or `to` is
    /// `pending`.
    fn transition_order(
        &self,
        id: OrderId,
        to: OrderStatus,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<OrderTransition>> + Send;
}
