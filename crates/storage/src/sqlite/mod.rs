use std::sync::Arc;
use std::time::Duration;

use kotoba_core::model::Corpus;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{PreferencesStore, ProgressStore, Storage, StorageError, WordCorpusLoader};

mod corpus_repo;
mod mapping;
mod migrate;
mod preferences_repo;
mod progress_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Replace the stored corpus with `corpus`, keeping record order within each lesson.
    ///
    /// Returns the number of records written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction fails.
    pub async fn import_corpus(&self, corpus: &Corpus) -> Result<usize, StorageError> {
        corpus_repo::replace_corpus(&self.pool, corpus).await
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let corpus: Arc<dyn WordCorpusLoader> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressStore> = Arc::new(repo.clone());
        let preferences: Arc<dyn PreferencesStore> = Arc::new(repo);
        Ok(Self {
            corpus,
            progress,
            preferences,
        })
    }
}
