use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{LessonId, WordKey};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("word key must not be empty")]
    EmptyKey,
}

//
// ─── WORD ─────────────────────────────────────────────────────────────────────
//

/// A vocabulary word as loaded from the corpus. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    key: WordKey,
    lexicon: String,
    reading: Option<String>,
    meaning: String,
    lesson: LessonId,
}

impl Word {
    /// Build a word. An empty reading is normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns `WordError::EmptyKey` if the key is blank.
    pub fn new(
        key: WordKey,
        lexicon: impl Into<String>,
        reading: Option<String>,
        meaning: impl Into<String>,
        lesson: LessonId,
    ) -> Result<Self, WordError> {
        if key.as_str().trim().is_empty() {
            return Err(WordError::EmptyKey);
        }

        Ok(Self {
            key,
            lexicon: lexicon.into(),
            reading: reading.filter(|r| !r.is_empty()),
            meaning: meaning.into(),
            lesson,
        })
    }

    #[must_use]
    pub fn key(&self) -> &WordKey {
        &self.key
    }

    #[must_use]
    pub fn lexicon(&self) -> &str {
        &self.lexicon
    }

    #[must_use]
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref()
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn lesson(&self) -> &LessonId {
        &self.lesson
    }

    /// Lexicon term, followed by `「reading」` when furigana is shown and a reading exists.
    #[must_use]
    pub fn lexicon_display(&self, furigana_visible: bool) -> String {
        match self.reading() {
            Some(reading) if furigana_visible => format!("{}「{reading}」", self.lexicon),
            _ => self.lexicon.clone(),
        }
    }
}
