use async_trait::async_trait;
use kotoba_core::model::{Corpus, QuizPreferences, SessionSnapshot};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot::{decode_snapshot, encode_snapshot};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Source of the vocabulary corpus.
#[async_trait]
pub trait WordCorpusLoader: Send + Sync {
    /// Fetch every lesson with its word records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the corpus store cannot be reached or read.
    async fn fetch_all(&self) -> Result<Corpus, StorageError>;
}

/// Single-slot store for the in-progress session.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Overwrite the slot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or written.
    async fn save_progress(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Read the slot back.
    ///
    /// Implementations return `Ok(None)` both for an empty slot and for a
    /// payload that does not decode as a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    async fn load_progress(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    /// Remove the slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    async fn clear_progress(&self) -> Result<(), StorageError>;
}

/// Store for quiz preferences that outlive a session.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be read.
    async fn load_preferences(&self) -> Result<Option<QuizPreferences>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the preferences cannot be written.
    async fn save_preferences(&self, preferences: &QuizPreferences) -> Result<(), StorageError>;
}

/// Decode a stored payload, logging and discarding anything malformed.
pub(crate) fn decode_or_discard(payload: &str) -> Option<SessionSnapshot> {
    match decode_snapshot(payload) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::warn!(error = %err, "discarding malformed progress snapshot");
            None
        }
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Progress is held as the encoded JSON payload, so it goes through the same
/// codec as the persistent backends.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    corpus: Arc<Mutex<Corpus>>,
    progress: Arc<Mutex<Option<String>>>,
    preferences: Arc<Mutex<Option<QuizPreferences>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_corpus(corpus: Corpus) -> Self {
        Self {
            corpus: Arc::new(Mutex::new(corpus)),
            ..Self::default()
        }
    }

    /// Replace the corpus served by `fetch_all`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn set_corpus(&self, corpus: Corpus) -> Result<(), StorageError> {
        let mut guard = self
            .corpus
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = corpus;
        Ok(())
    }

    /// Put a raw payload into the progress slot, bypassing the encoder.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw_progress(&self, payload: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(payload.into());
        Ok(())
    }

    /// The raw payload currently in the progress slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw_progress(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl WordCorpusLoader for InMemoryRepository {
    async fn fetch_all(&self) -> Result<Corpus, StorageError> {
        let guard = self
            .corpus
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl ProgressStore for InMemoryRepository {
    async fn save_progress(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let payload = encode_snapshot(snapshot)?;
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(payload);
        Ok(())
    }

    async fn load_progress(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.as_deref().and_then(decode_or_discard))
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[async_trait]
impl PreferencesStore for InMemoryRepository {
    async fn load_preferences(&self) -> Result<Option<QuizPreferences>, StorageError> {
        let guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_preferences(&self, preferences: &QuizPreferences) -> Result<(), StorageError> {
        let mut guard = self
            .preferences
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(preferences.clone());
        Ok(())
    }
}

/// Aggregates the storage ports behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub corpus: Arc<dyn WordCorpusLoader>,
    pub progress: Arc<dyn ProgressStore>,
    pub preferences: Arc<dyn PreferencesStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(corpus: Corpus) -> Self {
        Self::from_repository(InMemoryRepository::with_corpus(corpus))
    }

    /// Use one repository value for every port.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: WordCorpusLoader + ProgressStore + PreferencesStore + Clone + 'static,
    {
        Self {
            corpus: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            preferences: Arc::new(repo),
        }
    }

    /// Swap the corpus source, keeping progress and preferences.
    #[must_use]
    pub fn with_corpus_loader(mut self, corpus: Arc<dyn WordCorpusLoader>) -> Self {
        self.corpus = corpus;
        self
    }
}
