//! HTTP error responses.
//!
//! Every handler returns [`AppError`] on failure. Domain errors convert into
//! it through `From<KioskError>`, which fixes the status code and the
//! machine-readable `code` for each variant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kiosk_core::KioskError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Serializes as `{ "code": ..., "message": ... }` with the matching status.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (logged, never sent to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{resource} {id} not found"))
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message)
    }

    /// Status code this error responds with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Request failed"
                ),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<KioskError> for AppError {
    fn from(err: KioskError) -> Self {
        let message = err.to_string();
        match err {
            KioskError::ProductNotFound(_) => Self::new(StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND", message),
            KioskError::OrderNotFound(_) => Self::new(StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", message),

            KioskError::OutOfStock { .. } => Self::new(StatusCode::CONFLICT, "OUT_OF_STOCK", message),
            KioskError::InsufficientAvailable { .. } => {
                Self::new(StatusCode::CONFLICT, "INSUFFICIENT_AVAILABLE", message)
            }
            KioskError::InsufficientStock { .. } => Self::new(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message),
            KioskError::InvalidTransition { .. } => Self::new(StatusCode::CONFLICT, "INVALID_TRANSITION", message),

            KioskError::LimitExceeded { .. } => Self::validation("LIMIT_EXCEEDED", message),
            KioskError::BelowReserved { .. } => Self::validation("BELOW_RESERVED", message),
            KioskError::InvalidSlot { .. } => Self::validation("INVALID_SLOT", message),
            KioskError::InvalidQuantity { .. } => Self::validation("INVALID_QUANTITY", message),
            KioskError::VariantMismatch { .. } => Self::validation("VARIANT_MISMATCH", message),
            KioskError::IncompleteBottleSlot => Self::validation("INCOMPLETE_BOTTLE_SLOT", message),
            KioskError::EmptyOrder => Self::validation("EMPTY_ORDER", message),
            KioskError::ProductUnavailable(_) => Self::validation("PRODUCT_UNAVAILABLE", message),

            KioskError::InvalidCredentials => Self::unauthorized("Invalid credentials"),
            KioskError::SessionExpired | KioskError::SessionNotFound => {
                Self::unauthorized("Invalid or expired session")
            }

            KioskError::PaymentVerificationFailed { .. } => {
                Self::new(StatusCode::PAYMENT_REQUIRED, "PAYMENT_FAILED", message)
            }
            KioskError::PriceMismatch { .. } => Self::validation("PRICE_MISMATCH", message),
            KioskError::ProofMismatch { .. } => Self::validation("PROOF_MISMATCH", message),
            KioskError::Gateway(_) => Self::new(StatusCode::BAD_GATEWAY, "GATEWAY_ERROR", message),
            KioskError::Storage(_) => Self::internal("An internal error occurred").with_source(err),
        }
    }
}

impl AppError {
    fn validation(code: &'static str, message: String) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::{BottleSize, OrderId, OrderStatus, ProductId, Variant};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_stock_conflicts_map_to_409() {
        let err = AppError::from(KioskError::InsufficientAvailable {
            product_id: ProductId::new(1),
            bottle_size: BottleSize::Ml30,
            requested: 1,
            available: 0,
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "INSUFFICIENT_AVAILABLE");

        let err = AppError::from(KioskError::OutOfStock { product_id: ProductId::new(1), variant: Variant::Spray });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = AppError::from(KioskError::LimitExceeded {
            variant: Variant::Bottle(BottleSize::Ml60),
            requested: 25,
            limit: 20,
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "LIMIT_EXCEEDED");
        assert_eq!(AppError::from(KioskError::EmptyOrder).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_auth_errors_are_uniform() {
        let expired = AppError::from(KioskError::SessionExpired);
        let missing = AppError::from(KioskError::SessionNotFound);
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.to_string(), missing.to_string());
        assert_eq!(AppError::from(KioskError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_payment_and_infrastructure_errors() {
        let declined = AppError::from(KioskError::PaymentVerificationFailed {
            order_id: OrderId::new(3),
            reason: "declined".to_string(),
        });
        assert_eq!(declined.status(), StatusCode::PAYMENT_REQUIRED);

        let conflict = AppError::from(KioskError::InvalidTransition {
            order_id: OrderId::new(3),
            from: OrderStatus::Failed,
            to: OrderStatus::Completed,
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let mismatch = AppError::from(KioskError::ProofMismatch {
            order_id: OrderId::new(3),
            gateway_order_id: "kiosk_1".to_string(),
        });
        assert_eq!(mismatch.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(AppError::from(KioskError::Gateway("down".into())).status(), StatusCode::BAD_GATEWAY);

        let storage = AppError::from(KioskError::Storage("disk".into()));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!storage.to_string().contains("disk"));
    }
}
