//! HTTP API for the fragrance kiosk.
//!
//! Thin axum shell over [`kiosk_runtime::Kiosk`]: handlers parse the request,
//! call one service operation and map [`kiosk_core::KioskError`] to an HTTP
//! status through [`AppError`].
//!
//! # Request Flow
//!
//! 1. The correlation layer tags the request and opens its span
//! 2. Extractors parse path, body and (for admin routes) the bearer session
//! 3. The handler calls the kiosk service
//! 4. The result or error is serialized as JSON
//!
//! # Example
//!
//! ```ignore
//! use kiosk_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(kiosk));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // handlers all fail with AppError

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod seed;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use extractors::{AdminGuard, BearerToken, ClientIp, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, CorrelationIdExt, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
