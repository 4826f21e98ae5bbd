//! `PostgreSQL` store for the fragrance kiosk.
//!
//! Implements every storage trait from `kiosk-core` on one connection pool.
//!
//! # Consistency
//!
//! Operations that read the slot table and then write it (assignments, stock
//! changes, decrements, slot clearing) run in a transaction that first takes
//! a transaction-scoped advisory lock, so they serialize exactly like the
//! in-memory store's single mutex. The rule checks themselves are the shared
//! ones in `kiosk_core::allocation`. Order transitions are a conditional
//! `UPDATE ... WHERE status = 'pending'`, so only one caller can settle an
//! order.
//!
//! # Example
//!
//! ```no_run
//! use kiosk_postgres::PostgresStore;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresStore::connect("postgres://localhost/kiosk", 10, 1, Duration::from_secs(30)).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use kiosk_core::{KioskError, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::fmt::Display;
use std::time::Duration;

mod orders;
mod products;
mod rows;
mod sessions;
mod slots;

/// Advisory lock key guarding the slot table and stock counters.
const ALLOCATION_LOCK: i64 = 0x6b69_6f73_6b;

/// `PostgreSQL` kiosk store.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if no connection can be established.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        min_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await
            .map_err(db("Failed to connect"))?;
        tracing::info!(max_connections, "PostgreSQL pool ready");
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns `KioskError::Storage` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| storage_error("Migration failed", e))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn storage_error(context: &str, err: impl Display) -> KioskError {
    KioskError::Storage(format!("{context}: {err}"))
}

pub(crate) fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> KioskError {
    move |e| storage_error(context, e)
}

/// Serialize with every other allocation-changing transaction.
pub(crate) async fn lock_allocation(conn: &mut sqlx::PgConnection) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ALLOCATION_LOCK)
        .execute(conn)
        .await
        .map_err(db("Failed to take allocation lock"))?;
    Ok(())
}
