//! HTTP request handlers.
//!
//! Every handler is generic over the store so one router serves both
//! backends.

pub mod admin;
pub mod analytics;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod slots;
