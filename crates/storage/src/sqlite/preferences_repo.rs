use async_trait::async_trait;
use kotoba_core::model::{LessonId, QuizPreferences};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{bool_from_i64, conn, parse_mode, ser};
use crate::repository::{PreferencesStore, StorageError};

#[async_trait]
impl PreferencesStore for SqliteRepository {
    async fn load_preferences(&self) -> Result<Option<QuizPreferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT mode, lesson_filter, furigana_visible
            FROM quiz_preferences
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mode: String = row.try_get("mode").map_err(ser)?;
        let lesson_filter: Option<String> = row.try_get("lesson_filter").map_err(ser)?;
        let furigana_visible: i64 = row.try_get("furigana_visible").map_err(ser)?;

        Ok(Some(QuizPreferences {
            mode: parse_mode(&mode)?,
            lesson_filter: lesson_filter.map(LessonId::new),
            furigana_visible: bool_from_i64("furigana_visible", furigana_visible)?,
        }))
    }

    async fn save_preferences(&self, preferences: &QuizPreferences) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_preferences (id, mode, lesson_filter, furigana_visible)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                mode = excluded.mode,
                lesson_filter = excluded.lesson_filter,
                furigana_visible = excluded.furigana_visible
            ",
        )
        .bind(preferences.mode.as_str())
        .bind(preferences.lesson_filter.as_ref().map(LessonId::as_str))
        .bind(i64::from(preferences.furigana_visible))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
