//! Admin sessions and slot usage counters.

use crate::rows::{SessionRow, UsageRow, slot_columns, to_db};
use crate::{PostgresStore, db};
use chrono::{DateTime, Utc};
use kiosk_core::providers::{SessionStore, UsageStore};
use kiosk_core::{AdminSession, KioskError, ProductId, Result, SessionToken, Slot, SlotUsage};

impl SessionStore for PostgresStore {
    async fn insert_session(&self, session: AdminSession) -> Result<()> {
        sqlx::query("INSERT INTO admin_sessions (token, created_at, expires_at) VALUES ($1, $2, $3)")
            .bind(*session.token.as_uuid())
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return KioskError::Storage("Session token already exists".to_string());
                    }
                }
                KioskError::Storage(format!("Failed to insert session: {e}"))
            })?;
        Ok(())
    }

    async fn get_session(&self, token: SessionToken) -> Result<Option<AdminSession>> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token, created_at, expires_at FROM admin_sessions WHERE token = $1",
        )
        .bind(*token.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("Failed to get session"))?;
        Ok(row.map(AdminSession::from))
    }

    async fn delete_session(&self, token: SessionToken) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token = $1")
            .bind(*token.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db("Failed to delete session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db("Failed to purge sessions"))?;
        usize::try_from(result.rows_affected())
            .map_err(|_| KioskError::Storage("purged row count out of range".to_string()))
    }
}

impl UsageStore for PostgresStore {
    async fn record_usage(&self, slot: Slot, product_id: ProductId, now: DateTime<Utc>) -> Result<SlotUsage> {
        let (kind, number) = slot_columns(Some(slot));
        let row = sqlx::query_as::<_, UsageRow>(
            r"
            INSERT INTO slot_usage (slot_kind, slot_number, product_id, usage_count, last_used_at)
            VALUES ($1, $2, $3, 1, $4)
            ON CONFLICT (slot_kind, slot_number) DO UPDATE SET
                usage_count = slot_usage.usage_count + 1,
                product_id = EXCLUDED.product_id,
                last_used_at = EXCLUDED.last_used_at
            RETURNING slot_kind, slot_number, product_id, usage_count, last_used_at
            ",
        )
        .bind(kind)
        .bind(number)
        .bind(to_db(product_id.get())?)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db("Failed to record usage"))?;
        SlotUsage::try_from(row)
    }

    async fn usage_records(&self) -> Result<Vec<SlotUsage>> {
        sqlx::query_as::<_, UsageRow>(
            r"
            SELECT slot_kind, slot_number, product_id, usage_count, last_used_at
            FROM slot_usage
            ORDER BY CASE slot_kind WHEN 'spray' THEN 0 ELSE 1 END, slot_number
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list usage"))?
        .into_iter()
        .map(SlotUsage::try_from)
        .collect()
    }
}
