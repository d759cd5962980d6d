use async_trait::async_trait;
use chrono::Utc;
use kotoba_core::model::SessionSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{ProgressStore, StorageError, decode_or_discard};
use crate::snapshot::{PROGRESS_SLOT, encode_snapshot};

#[async_trait]
impl ProgressStore for SqliteRepository {
    async fn save_progress(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let payload = encode_snapshot(snapshot)?;
        sqlx::query(
            r"
                INSERT INTO quiz_progress (slot, payload, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(slot) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(PROGRESS_SLOT)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn load_progress(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM quiz_progress WHERE slot = ?1")
            .bind(PROGRESS_SLOT)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        Ok(decode_or_discard(&payload))
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM quiz_progress WHERE slot = ?1")
            .bind(PROGRESS_SLOT)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
