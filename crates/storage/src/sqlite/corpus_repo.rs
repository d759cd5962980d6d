use async_trait::async_trait;
use kotoba_core::model::{Corpus, CorpusEntry, LessonId};
use sqlx::{Row, SqlitePool};

use super::SqliteRepository;
use super::mapping::{conn, position_to_i64, ser};
use crate::repository::{StorageError, WordCorpusLoader};

pub(crate) async fn replace_corpus(pool: &SqlitePool, corpus: &Corpus) -> Result<usize, StorageError> {
    let mut tx = pool.begin().await.map_err(conn)?;

    sqlx::query("DELETE FROM words")
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

    let mut written = 0_usize;
    for lesson in corpus.lessons() {
        for (position, entry) in lesson.entries.iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO words (lesson, position, word_id, lexicon, reading, meaning)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(lesson.id.as_str())
            .bind(position_to_i64(position)?)
            .bind(entry.id.as_deref())
            .bind(entry.lexicon.as_deref())
            .bind(entry.reading.as_deref())
            .bind(entry.meaning.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
            written += 1;
        }
    }

    tx.commit().await.map_err(conn)?;
    Ok(written)
}

#[async_trait]
impl WordCorpusLoader for SqliteRepository {
    async fn fetch_all(&self) -> Result<Corpus, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT lesson, word_id, lexicon, reading, meaning
                FROM words
                ORDER BY lesson ASC, position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut corpus = Corpus::default();
        for row in rows {
            let lesson: String = row.try_get("lesson").map_err(ser)?;
            let entry = CorpusEntry {
                id: row.try_get("word_id").map_err(ser)?,
                lexicon: row.try_get("lexicon").map_err(ser)?,
                reading: row.try_get("reading").map_err(ser)?,
                meaning: row.try_get("meaning").map_err(ser)?,
            };
            corpus.push_entry(LessonId::new(lesson), entry);
        }
        Ok(corpus)
    }
}
