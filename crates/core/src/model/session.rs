use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{LessonId, QuizMode, Word, WrongRecord};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a persisted snapshot cannot be turned back into a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot has no words")]
    Empty,

    #[error("cursor {cursor} is past the end of {total} words")]
    CursorOutOfRange { cursor: usize, total: usize },

    #[error("wrong count ({count}) does not match wrong records ({records})")]
    WrongRecordMismatch { count: u32, records: usize },

    #[error("answered count ({answered}) does not match cursor ({cursor})")]
    CountMismatch { answered: usize, cursor: usize },
}

/// Why an answer submission was refused without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerRejection {
    AlreadyFinished,
    Locked,
}

/// What happened when a pending transition was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the question at this cursor.
    Next(usize),
    Finished,
}

//
// ─── SNAPSHOT ─────────────────────────────────────────────────────────────────
//

/// Plain, serializable image of a session used for resume-after-reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub ordered_words: Vec<Word>,
    pub cursor: usize,
    /// `None` when read from a payload that kept the mode elsewhere.
    pub mode: Option<QuizMode>,
    pub lesson_filter: Option<LessonId>,
    pub furigana_visible: bool,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub wrong_records: Vec<WrongRecord>,
    pub finished: bool,
    pub saved_at: Option<DateTime<Utc>>,
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One run through a shuffled list of words.
///
/// Holds the counters and wrong-answer log. The accessors never expose a
/// state where `correct + wrong` disagrees with the cursor: answering locks the
/// session and counts the answer, and only [`QuizSession::advance`] moves the
/// cursor forward and releases the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSession {
    ordered_words: Vec<Word>,
    cursor: usize,
    mode: QuizMode,
    lesson_filter: Option<LessonId>,
    furigana_visible: bool,
    correct_count: u32,
    wrong_count: u32,
    wrong_records: Vec<WrongRecord>,
    finished: bool,
    locked: bool,
}

impl QuizSession {
    /// Start a session over an already shuffled word list.
    ///
    /// An empty list produces a session that is finished from the start.
    #[must_use]
    pub fn new(
        ordered_words: Vec<Word>,
        mode: QuizMode,
        lesson_filter: Option<LessonId>,
        furigana_visible: bool,
    ) -> Self {
        let finished = ordered_words.is_empty();
        Self {
            ordered_words,
            cursor: 0,
            mode,
            lesson_filter,
            furigana_visible,
            correct_count: 0,
            wrong_count: 0,
            wrong_records: Vec::new(),
            finished,
            locked: false,
        }
    }

    /// Rebuild a session from a persisted snapshot.
    ///
    /// A snapshot taken between counting an answer and advancing (one more
    /// answer than the cursor accounts for) is advanced here, so the restored
    /// session never offers an already counted question again.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot is empty or its counters are inconsistent.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Result<Self, SnapshotError> {
        let total = snapshot.ordered_words.len();
        if total == 0 {
            return Err(SnapshotError::Empty);
        }
        if snapshot.cursor > total {
            return Err(SnapshotError::CursorOutOfRange {
                cursor: snapshot.cursor,
                total,
            });
        }
        if snapshot.wrong_records.len() != snapshot.wrong_count as usize {
            return Err(SnapshotError::WrongRecordMismatch {
                count: snapshot.wrong_count,
                records: snapshot.wrong_records.len(),
            });
        }

        let answered = snapshot.correct_count as usize + snapshot.wrong_count as usize;
        let mut session = Self {
            ordered_words: snapshot.ordered_words,
            cursor: snapshot.cursor,
            mode: snapshot.mode.unwrap_or_default(),
            lesson_filter: snapshot.lesson_filter,
            furigana_visible: snapshot.furigana_visible,
            correct_count: snapshot.correct_count,
            wrong_count: snapshot.wrong_count,
            wrong_records: snapshot.wrong_records,
            finished: snapshot.finished,
            locked: false,
        };

        if session.finished {
            if answered > total {
                return Err(SnapshotError::CountMismatch {
                    answered,
                    cursor: session.cursor,
                });
            }
            return Ok(session);
        }

        if answered == session.cursor + 1 && session.cursor < total {
            session.locked = true;
            session.advance();
        } else if answered != session.cursor {
            return Err(SnapshotError::CountMismatch {
                answered,
                cursor: session.cursor,
            });
        }

        if session.cursor == total {
            session.finished = true;
        }
        Ok(session)
    }

    #[must_use]
    pub fn to_snapshot(&self, saved_at: Option<DateTime<Utc>>) -> SessionSnapshot {
        SessionSnapshot {
            ordered_words: self.ordered_words.clone(),
            cursor: self.cursor,
            mode: Some(self.mode),
            lesson_filter: self.lesson_filter.clone(),
            furigana_visible: self.furigana_visible,
            correct_count: self.correct_count,
            wrong_count: self.wrong_count,
            wrong_records: self.wrong_records.clone(),
            finished: self.finished,
            saved_at,
        }
    }

    #[must_use]
    pub fn ordered_words(&self) -> &[Word] {
        &self.ordered_words
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.ordered_words.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn lesson_filter(&self) -> Option<&LessonId> {
        self.lesson_filter.as_ref()
    }

    #[must_use]
    pub fn furigana_visible(&self) -> bool {
        self.furigana_visible
    }

    pub fn set_furigana_visible(&mut self, visible: bool) {
        self.furigana_visible = visible;
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn wrong_count(&self) -> u32 {
        self.wrong_count
    }

    #[must_use]
    pub fn wrong_records(&self) -> &[WrongRecord] {
        &self.wrong_records
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.correct_count as usize + self.wrong_count as usize
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The word being asked, or `None` once finished.
    #[must_use]
    pub fn current_word(&self) -> Option<&Word> {
        if self.finished {
            return None;
        }
        self.ordered_words.get(self.cursor)
    }

    /// Check that an answer may be counted now and return the word it is judged against.
    ///
    /// # Errors
    ///
    /// Returns `AnswerRejection` when finished or while a previous answer is still pending.
    pub fn accepting_answer(&self) -> Result<&Word, AnswerRejection> {
        if self.finished {
            return Err(AnswerRejection::AlreadyFinished);
        }
        if self.locked {
            return Err(AnswerRejection::Locked);
        }
        self.current_word().ok_or(AnswerRejection::AlreadyFinished)
    }

    /// Count a correct answer and lock until [`QuizSession::advance`].
    ///
    /// # Errors
    ///
    /// Returns `AnswerRejection` without counting if no answer is accepted right now.
    pub fn record_correct(&mut self) -> Result<(), AnswerRejection> {
        self.accepting_answer()?;
        self.correct_count = self.correct_count.saturating_add(1);
        self.locked = true;
        Ok(())
    }

    /// Count a wrong answer, log it, and lock until [`QuizSession::advance`].
    ///
    /// # Errors
    ///
    /// Returns `AnswerRejection` without counting if no answer is accepted right now.
    pub fn record_wrong(&mut self, record: WrongRecord) -> Result<(), AnswerRejection> {
        self.accepting_answer()?;
        self.wrong_count = self.wrong_count.saturating_add(1);
        self.wrong_records.push(record);
        self.locked = true;
        Ok(())
    }

    /// Move past the answered question and release the lock.
    ///
    /// Returns `None` if no answer is pending.
    pub fn advance(&mut self) -> Option<Advance> {
        if !self.locked || self.finished {
            return None;
        }
        self.locked = false;
        if self.cursor + 1 < self.ordered_words.len() {
            self.cursor += 1;
            Some(Advance::Next(self.cursor))
        } else {
            self.cursor = self.ordered_words.len();
            self.finished = true;
            Some(Advance::Finished)
        }
    }

    /// End the session early, keeping whatever was counted so far.
    pub fn give_up(&mut self) {
        self.finished = true;
        self.locked = false;
    }
}
