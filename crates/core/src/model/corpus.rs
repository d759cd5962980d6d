use crate::model::{LessonId, Word, WordError, WordKey};

/// Lexicon shown for a corpus record that has none.
pub const MISSING_LEXICON: &str = "???";
/// Meaning shown for a corpus record that has no translation yet.
pub const MISSING_MEANING: &str = "(no translation)";

/// A word-like record as delivered by the corpus store. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CorpusEntry {
    pub id: Option<String>,
    pub lexicon: Option<String>,
    pub reading: Option<String>,
    pub meaning: Option<String>,
}

impl CorpusEntry {
    /// Turn the record into a `Word` of `lesson`, filling placeholders for missing fields.
    ///
    /// # Errors
    ///
    /// Returns `WordError` if no usable key can be formed.
    pub fn to_word(&self, lesson: &LessonId) -> Result<Word, WordError> {
        let lexicon = self
            .lexicon
            .clone()
            .unwrap_or_else(|| MISSING_LEXICON.to_owned());
        let key = match self.id.as_deref() {
            Some(id) if !id.trim().is_empty() => WordKey::new(id),
            _ => WordKey::derived(lesson, &lexicon),
        };
        let meaning = self
            .meaning
            .clone()
            .unwrap_or_else(|| MISSING_MEANING.to_owned());

        Word::new(key, lexicon, self.reading.clone(), meaning, lesson.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: LessonId,
    pub entries: Vec<CorpusEntry>,
}

/// The full word corpus, partitioned by lesson.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corpus {
    lessons: Vec<Lesson>,
}

impl Corpus {
    #[must_use]
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Self { lessons }
    }

    pub fn push_entry(&mut self, lesson: LessonId, entry: CorpusEntry) {
        match self.lessons.iter_mut().find(|l| l.id == lesson) {
            Some(existing) => existing.entries.push(entry),
            None => self.lessons.push(Lesson {
                id: lesson,
                entries: vec![entry],
            }),
        }
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Sorted, de-duplicated lesson ids.
    #[must_use]
    pub fn lesson_ids(&self) -> Vec<LessonId> {
        let mut ids: Vec<LessonId> = self.lessons.iter().map(|l| l.id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.lessons.iter().map(|l| l.entries.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// Flatten into the word pool, lesson by lesson.
    ///
    /// # Errors
    ///
    /// Returns the first `WordError` raised by a record.
    pub fn words(&self) -> Result<Vec<Word>, WordError> {
        let mut words = Vec::with_capacity(self.word_count());
        for lesson in &self.lessons {
            for entry in &lesson.entries {
                words.push(entry.to_word(&lesson.id)?);
            }
        }
        Ok(words)
    }
}
