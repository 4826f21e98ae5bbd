//! Admin sessions.
//!
//! A single configured credential pair issues bearer tokens with a fixed
//! lifetime. There is no refresh; an expired token is deleted the first time
//! it is presented.

use crate::metrics::KioskMetrics;
use chrono::Duration;
use constant_time_eq::constant_time_eq;
use kiosk_core::environment::Clock;
use kiosk_core::providers::KioskStore;
use kiosk_core::{AdminSession, KioskError, Result, SessionToken};
use std::fmt;
use std::sync::Arc;

/// Default session lifetime in hours
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Admin login settings
#[derive(Clone)]
pub struct AdminSettings {
    /// Login name
    pub username: String,
    /// Login password
    pub password: String,
    /// Session lifetime
    pub session_ttl: Duration,
}

impl AdminSettings {
    /// Credentials with the default 24 h session lifetime
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

impl fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Admin session service.
#[derive(Clone)]
pub struct AdminAuth<S> {
    store: S,
    clock: Arc<dyn Clock>,
    settings: Arc<AdminSettings>,
}

impl<S: KioskStore> AdminAuth<S> {
    /// Create the service.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, settings: AdminSettings) -> Self {
        Self {
            store,
            clock,
            settings: Arc::new(settings),
        }
    }

    /// Exchange credentials for a session.
    ///
    /// Both fields are compared in constant time and both are always checked,
    /// so the response does not reveal which one was wrong.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::InvalidCredentials`.
    pub async fn login(&self, username: &str, password: &str) -> Result<AdminSession> {
        let user_ok = constant_time_eq(username.as_bytes(), self.settings.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.settings.password.as_bytes());

        if !(user_ok & pass_ok) {
            KioskMetrics::admin_login(false);
            tracing::warn!("Rejected admin login");
            return Err(KioskError::InvalidCredentials);
        }

        let now = self.clock.now();
        let session = AdminSession {
            token: SessionToken::generate(),
            created_at: now,
            expires_at: now + self.settings.session_ttl,
        };
        self.store.insert_session(session).await?;

        KioskMetrics::admin_login(true);
        tracing::info!(expires_at = %session.expires_at, "Admin session created");
        Ok(session)
    }

    /// Check a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::SessionNotFound` for an unknown token and
    /// `KioskError::SessionExpired` (after deleting it) for an expired one.
    pub async fn validate(&self, token: SessionToken) -> Result<AdminSession> {
        let session = self
            .store
            .get_session(token)
            .await?
            .ok_or(KioskError::SessionNotFound)?;

        if session.is_expired(self.clock.now()) {
            self.store.delete_session(token).await?;
            tracing::debug!("Expired admin session removed");
            return Err(KioskError::SessionExpired);
        }
        Ok(session)
    }

    /// End a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn logout(&self, token: SessionToken) -> Result<bool> {
        let removed = self.store.delete_session(token).await?;
        if removed {
            tracing::info!("Admin session ended");
        }
        Ok(removed)
    }

    /// Delete every expired session.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if the store fails.
    pub async fn purge_expired(&self) -> Result<usize> {
        let purged = self.store.delete_expired_sessions(self.clock.now()).await?;
        if purged > 0 {
            tracing::debug!(purged, "Expired admin sessions purged");
        }
        Ok(purged)
    }
}
