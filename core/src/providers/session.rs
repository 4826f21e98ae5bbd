//! Admin session store trait.

use crate::error::Result;
use crate::types::{AdminSession, SessionToken};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Admin session store.
///
/// Expiry is decided by the caller; the store only keeps rows.
pub trait SessionStore: Send + Sync {
    /// Save a session.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn insert_session(&self, session: AdminSession) -> impl Future<Output = Result<()>> + Send;

    /// Look up a session, expired or not.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn get_session(
        &self,
        token: SessionToken,
    ) -> impl Future<Output = Result<Option<AdminSession>>> + Send;

    /// Delete a session.
    ///
    /// # Returns
    ///
    /// `true` if the session existed.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn delete_session(&self, token: SessionToken) -> impl Future<Output = Result<bool>> + Send;

    /// Delete every session expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the backend fails.
    fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize>> + Send;
}
