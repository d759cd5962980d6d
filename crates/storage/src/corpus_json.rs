//! Corpus exports in JSON form.
//!
//! The expected document maps lesson ids to word records, either keyed by an
//! entry name or as a plain array:
//!
//! ```json
//! { "1": { "guru": { "kanji": "先生", "furigana": "せんせい", "indonesia": "guru" } } }
//! ```
//!
//! Field names `lexicon`/`reading`/`meaning` are accepted as well.

use std::path::PathBuf;

use async_trait::async_trait;
use kotoba_core::model::{Corpus, CorpusEntry, LessonId};
use serde_json::{Map, Value};

use crate::repository::{StorageError, WordCorpusLoader};

fn string_field(record: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| record.get(*name).and_then(Value::as_str))
        .map(str::to_owned)
}

fn entry_from_value(value: &Value) -> Option<CorpusEntry> {
    let record = value.as_object()?;
    Some(CorpusEntry {
        id: string_field(record, &["id"]),
        lexicon: string_field(record, &["lexicon", "kanji"]),
        reading: string_field(record, &["reading", "furigana"]),
        meaning: string_field(record, &["meaning", "indonesia"]),
    })
}

/// Parse a corpus document, optionally nested under `root`.
///
/// Lessons or records that are not JSON objects are skipped with a warning.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the text is not JSON or the
/// lesson map is not an object. Returns `StorageError::NotFound` if `root` is
/// given but absent.
pub fn parse_corpus_json(raw: &str, root: Option<&str>) -> Result<Corpus, StorageError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let lessons = match root {
        Some(key) => document.get(key).ok_or(StorageError::NotFound)?,
        None => &document,
    };
    let lessons = lessons.as_object().ok_or_else(|| {
        StorageError::Serialization("corpus must be an object of lessons".into())
    })?;

    let mut corpus = Corpus::default();
    for (lesson, records) in lessons {
        let lesson_id = LessonId::new(lesson.as_str());
        let values: Vec<&Value> = match records {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => {
                tracing::warn!(lesson = %lesson, "skipping lesson that is not an object or array");
                continue;
            }
        };
        for value in values {
            match entry_from_value(value) {
                Some(entry) => corpus.push_entry(lesson_id.clone(), entry),
                None => tracing::warn!(lesson = %lesson, "skipping non-object word record"),
            }
        }
    }
    Ok(corpus)
}

/// Corpus loader reading a JSON export from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonCorpusFile {
    path: PathBuf,
    root: Option<String>,
}

impl JsonCorpusFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: None,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }
}

#[async_trait]
impl WordCorpusLoader for JsonCorpusFile {
    async fn fetch_all(&self) -> Result<Corpus, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::Connection(format!("{}: {e}", self.path.display())))?;
        parse_corpus_json(&raw, self.root.as_deref())
    }
}
