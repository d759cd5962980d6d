use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Applies the schema migrations that have not been recorded yet.
///
/// Version 1 creates the word corpus, the progress slot and the preferences row.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS words (
                    lesson TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    word_id TEXT,
                    lexicon TEXT,
                    reading TEXT,
                    meaning TEXT,
                    PRIMARY KEY (lesson, position)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_progress (
                    slot TEXT PRIMARY KEY,
                    payload TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_preferences (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    mode TEXT NOT NULL,
                    lesson_filter TEXT,
                    furigana_visible INTEGER NOT NULL CHECK (furigana_visible IN (0, 1))
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(1_i64)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
