//! Error types for kiosk operations.

use crate::types::{BottleSize, Money, OrderId, OrderStatus, ProductId, SlotKind, Variant};
use thiserror::Error;

/// Result type alias for kiosk operations.
pub type Result<T> = std::result::Result<T, KioskError>;

/// Error taxonomy for the kiosk core.
///
/// Variants are grouped by how the caller is expected to react: look-ups that
/// can simply be retried, business-rule rejections that name the offending
/// item, authentication failures that must not leak detail, and system errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KioskError {
    // ═══════════════════════════════════════════════════════════
    // Not Found
    // ═══════════════════════════════════════════════════════════

    /// No product with this id.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// No order with this id.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    // ═══════════════════════════════════════════════════════════
    // Stock & Allocation
    // ═══════════════════════════════════════════════════════════

    /// The variant has no stock left to sell.
    #[error("Product {product_id} is out of stock for {variant}")]
    OutOfStock {
        /// Offending product
        product_id: ProductId,
        /// Offending variant
        variant: Variant,
    },

    /// A slot assignment asked for more units than remain unreserved.
    #[error(
        "Only {available} unit(s) of product {product_id} ({bottle_size}) are unreserved, {requested} requested"
    )]
    InsufficientAvailable {
        /// Product being assigned
        product_id: ProductId,
        /// Bottle size being assigned
        bottle_size: BottleSize,
        /// Units the assignment asked for
        requested: u32,
        /// Units still free for reservation
        available: u32,
    },

    /// A decrement found fewer units than it needed.
    #[error("Product {product_id} has {available} unit(s) of {variant}, {requested} needed")]
    InsufficientStock {
        /// Product being decremented
        product_id: ProductId,
        /// Variant being decremented
        variant: Variant,
        /// Units requested
        requested: u32,
        /// Units actually on hand
        available: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Validation
    // ═══════════════════════════════════════════════════════════

    /// A bottle stock value above the machine's per-variant ceiling.
    #[error("{variant} stock of {requested} exceeds the limit of {limit}")]
    LimitExceeded {
        /// Variant being set
        variant: Variant,
        /// Requested stock level
        requested: u32,
        /// Maximum permitted stock level
        limit: u32,
    },

    /// A stock level below what slot assignments already hold.
    #[error(
        "Product {product_id} has {reserved} unit(s) of {bottle_size} reserved in slots, cannot set stock to {requested}"
    )]
    BelowReserved {
        /// Product being changed
        product_id: ProductId,
        /// Bottle size being changed
        bottle_size: BottleSize,
        /// Requested stock level
        requested: u32,
        /// Units held by slot assignments
        reserved: u32,
    },

    /// Slot number outside the physical range for its kind.
    #[error("{kind} slot {number} does not exist")]
    InvalidSlot {
        /// Slot kind
        kind: SlotKind,
        /// Requested slot number
        number: u8,
    },

    /// Slot quantity outside `1..=20`.
    #[error("Slot quantity {quantity} is outside 1..={max}")]
    InvalidQuantity {
        /// Requested quantity
        quantity: u32,
        /// Largest permitted quantity
        max: u32,
    },

    /// Variant cannot live in a slot of this kind.
    #[error("{variant} cannot be assigned to a {kind} slot")]
    VariantMismatch {
        /// Slot kind
        kind: SlotKind,
        /// Variant that was offered
        variant: Variant,
    },

    /// A bottle back-reference with only one of its slot and size.
    #[error("A bottle slot and a bottle size must be set together")]
    IncompleteBottleSlot,

    /// Bottle order without any items.
    #[error("Order has no items")]
    EmptyOrder,

    /// Product exists but is hidden from customers.
    #[error("Product {0} is not available for sale")]
    ProductUnavailable(ProductId),

    // ═══════════════════════════════════════════════════════════
    // Authentication
    // ═══════════════════════════════════════════════════════════

    /// Username or password did not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Session token is past its expiry.
    #[error("Session has expired")]
    SessionExpired,

    /// Session token is unknown.
    #[error("Session not found")]
    SessionNotFound,

    // ═══════════════════════════════════════════════════════════
    // Payment
    // ═══════════════════════════════════════════════════════════

    /// The gateway declined the payment; the order is now `failed`.
    #[error("Payment for order {order_id} was not verified: {reason}")]
    PaymentVerificationFailed {
        /// Order that failed
        order_id: OrderId,
        /// Reason reported by the gateway
        reason: String,
    },

    /// A quoted amount that is not the catalog price.
    #[error("Product {product_id} costs {price}, {quoted} was quoted")]
    PriceMismatch {
        /// Product being bought
        product_id: ProductId,
        /// Amount the caller sent
        quoted: Money,
        /// Current catalog price
        price: Money,
    },

    /// A payment proof issued for a different gateway order.
    #[error("Payment proof for {gateway_order_id} does not belong to order {order_id}")]
    ProofMismatch {
        /// Order being settled
        order_id: OrderId,
        /// Gateway order named by the proof
        gateway_order_id: String,
    },

    /// The order is already in a conflicting terminal state.
    #[error("Order {order_id} is {from} and cannot become {to}")]
    InvalidTransition {
        /// Order being transitioned
        order_id: OrderId,
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Payment gateway could not be reached or answered nonsense.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl KioskError {
    /// Returns `true` if the caller can fix this by changing its request.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kiosk_core::KioskError;
    /// assert!(KioskError::EmptyOrder.is_user_error());
    /// assert!(!KioskError::Storage("down".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::OutOfStock { .. }
                | Self::InsufficientAvailable { .. }
                | Self::LimitExceeded { .. }
                | Self::BelowReserved { .. }
                | Self::InvalidSlot { .. }
                | Self::InvalidQuantity { .. }
                | Self::VariantMismatch { .. }
                | Self::IncompleteBottleSlot
                | Self::EmptyOrder
                | Self::ProductUnavailable(_)
                | Self::PriceMismatch { .. }
                | Self::ProofMismatch { .. }
        )
    }

    /// Returns `true` for authentication failures.
    ///
    /// These are reported to clients with one uniform message.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kiosk_core::KioskError;
    /// assert!(KioskError::SessionExpired.is_auth_error());
    /// assert!(!KioskError::EmptyOrder.is_auth_error());
    /// ```
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::SessionExpired | Self::SessionNotFound
        )
    }

    /// Returns `true` if a missing record caused the error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductNotFound(_) | Self::OrderNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_item() {
        let err = KioskError::OutOfStock {
            product_id: ProductId::new(7),
            variant: Variant::Bottle(BottleSize::Ml60),
        };
        assert_eq!(err.to_string(), "Product 7 is out of stock for 60ml");

        let err = KioskError::InsufficientAvailable {
            product_id: ProductId::new(2),
            bottle_size: BottleSize::Ml30,
            requested: 1,
            available: 0,
        };
        assert!(err.to_string().contains("Only 0 unit(s)"));
    }

    #[test]
    fn test_error_categories_are_disjoint() {
        let errors = [
            KioskError::InvalidCredentials,
            KioskError::SessionExpired,
            KioskError::EmptyOrder,
            KioskError::ProductNotFound(ProductId::new(1)),
            KioskError::Storage("x".into()),
        ];

        for err in errors {
            let categories = [err.is_user_error(), err.is_auth_error(), err.is_not_found()];
            assert!(categories.iter().filter(|c| **c).count() <= 1, "{err:?}");
        }
    }
}
