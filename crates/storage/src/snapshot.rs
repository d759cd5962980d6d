//! JSON codec for the progress slot.
//!
//! Writes always use the current shape. Reads also accept the older payloads
//! that stored `words`/`currentIndex`/`wrongAnswers`, words keyed by
//! `kanji`/`furigana`/`indonesia`/`dai`, and wrong answers carrying display
//! strings instead of the selected word.

use chrono::{DateTime, Utc};
use kotoba_core::model::{
    CorpusEntry, LessonId, QuizMode, SessionSnapshot, Word, WrongRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::repository::StorageError;

/// Key of the single progress slot.
pub const PROGRESS_SLOT: &str = "quizProgress";

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedWord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(default, alias = "kanji")]
    lexicon: Option<String>,
    #[serde(default, alias = "furigana", skip_serializing_if = "Option::is_none")]
    reading: Option<String>,
    #[serde(default, alias = "indonesia")]
    meaning: Option<String>,
    #[serde(default, alias = "dai")]
    lesson: Option<String>,
}

impl PersistedWord {
    fn from_word(word: &Word) -> Self {
        Self {
            key: Some(word.key().as_str().to_owned()),
            lexicon: Some(word.lexicon().to_owned()),
            reading: word.reading().map(str::to_owned),
            meaning: Some(word.meaning().to_owned()),
            lesson: Some(word.lesson().as_str().to_owned()),
        }
    }

    fn into_word(self) -> Result<Word, StorageError> {
        let lesson = LessonId::new(self.lesson.unwrap_or_default());
        CorpusEntry {
            id: self.key,
            lexicon: self.lexicon,
            reading: self.reading,
            meaning: self.meaning,
        }
        .to_word(&lesson)
        .map_err(ser)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedWrongRecord {
    Answered {
        question: PersistedWord,
        selected: PersistedWord,
        #[serde(default, alias = "quizMode")]
        mode: Option<QuizMode>,
    },
    Legacy {
        #[serde(default)]
        question: Option<PersistedWord>,
        #[serde(default, rename = "yourAnswerText", alias = "yourAnswer")]
        your_answer: Option<String>,
        #[serde(default, rename = "correctAnswerText", alias = "correctAnswer")]
        correct_answer: Option<String>,
        #[serde(default, alias = "quizMode")]
        mode: Option<QuizMode>,
    },
}

impl PersistedWrongRecord {
    fn into_record(self) -> Result<WrongRecord, StorageError> {
        match self {
            PersistedWrongRecord::Answered {
                question,
                selected,
                mode,
            } => Ok(WrongRecord::Answered {
                question: question.into_word()?,
                selected: selected.into_word()?,
                mode,
            }),
            PersistedWrongRecord::Legacy {
                question,
                your_answer,
                correct_answer,
                mode,
            } => Ok(WrongRecord::Legacy {
                question: question.map(PersistedWord::into_word).transpose()?,
                your_answer,
                correct_answer,
                mode,
            }),
        }
    }
}

fn encode_record(record: &WrongRecord) -> Result<Value, StorageError> {
    #[derive(Serialize)]
    struct AnsweredOut {
        question: PersistedWord,
        selected: PersistedWord,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<QuizMode>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct LegacyOut {
        #[serde(skip_serializing_if = "Option::is_none")]
        question: Option<PersistedWord>,
        #[serde(skip_serializing_if = "Option::is_none")]
        your_answer_text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        correct_answer_text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<QuizMode>,
    }

    let value = match record {
        WrongRecord::Answered {
            question,
            selected,
            mode,
        } => serde_json::to_value(AnsweredOut {
            question: PersistedWord::from_word(question),
            selected: PersistedWord::from_word(selected),
            mode: *mode,
        }),
        // Re-emitted only so a resumed session keeps what it was loaded with.
        WrongRecord::Legacy {
            question,
            your_answer,
            correct_answer,
            mode,
        } => serde_json::to_value(LegacyOut {
            question: question.as_ref().map(PersistedWord::from_word),
            your_answer_text: your_answer.clone(),
            correct_answer_text: correct_answer.clone(),
            mode: *mode,
        }),
    };
    value.map_err(ser)
}

/// A single wrong record never fails the whole snapshot: unreadable entries
/// become placeholders so the counters still line up.
fn decode_record(value: Value) -> WrongRecord {
    let decoded = serde_json::from_value::<PersistedWrongRecord>(value)
        .map_err(ser)
        .and_then(PersistedWrongRecord::into_record);
    match decoded {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(error = %err, "unreadable wrong-answer record, keeping placeholder");
            WrongRecord::unreadable()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSnapshot {
    #[serde(alias = "words")]
    ordered_words: Vec<PersistedWord>,
    #[serde(default, alias = "currentIndex")]
    cursor: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<QuizMode>,
    #[serde(default)]
    lesson_filter: Option<String>,
    #[serde(default)]
    furigana_visible: bool,
    #[serde(default)]
    correct_count: u32,
    #[serde(default)]
    wrong_count: u32,
    #[serde(default, alias = "wrongAnswers")]
    wrong_records: Vec<Value>,
    #[serde(default)]
    finished: bool,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// Encode a snapshot as the JSON stored in the progress slot.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_snapshot(snapshot: &SessionSnapshot) -> Result<String, StorageError> {
    let persisted = PersistedSnapshot {
        ordered_words: snapshot
            .ordered_words
            .iter()
            .map(PersistedWord::from_word)
            .collect(),
        cursor: snapshot.cursor,
        mode: snapshot.mode,
        lesson_filter: snapshot
            .lesson_filter
            .as_ref()
            .map(|l| l.as_str().to_owned()),
        furigana_visible: snapshot.furigana_visible,
        correct_count: snapshot.correct_count,
        wrong_count: snapshot.wrong_count,
        wrong_records: snapshot
            .wrong_records
            .iter()
            .map(encode_record)
            .collect::<Result<_, _>>()?,
        finished: snapshot.finished,
        saved_at: snapshot.saved_at,
    };
    serde_json::to_string(&persisted).map_err(ser)
}

/// Decode a progress slot payload, current or legacy.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload is not a snapshot,
/// e.g. when `orderedWords` is missing or a word cannot be read.
pub fn decode_snapshot(payload: &str) -> Result<SessionSnapshot, StorageError> {
    let persisted: PersistedSnapshot = serde_json::from_str(payload).map_err(ser)?;

    let ordered_words = persisted
        .ordered_words
        .into_iter()
        .map(PersistedWord::into_word)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SessionSnapshot {
        ordered_words,
        cursor: persisted.cursor,
        mode: persisted.mode,
        lesson_filter: persisted.lesson_filter.map(LessonId::new),
        furigana_visible: persisted.furigana_visible,
        correct_count: persisted.correct_count,
        wrong_count: persisted.wrong_count,
        wrong_records: persisted.wrong_records.into_iter().map(decode_record).collect(),
        finished: persisted.finished,
        saved_at: persisted.saved_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kotoba_core::model::{QuizSession, WordKey};
    use kotoba_core::time::fixed_now;

    fn word(id: u32, reading: Option<&str>) -> Word {
        Word::new(
            WordKey::new(format!("w{id}")),
            format!("語{id}"),
            reading.map(str::to_owned),
            format!("word {id}"),
            LessonId::new("5"),
        )
        .unwrap()
    }

    #[test]
    fn current_shape_round_trips() {
        let mut session = QuizSession::new(
            vec![word(1, Some("ご")), word(2, None), word(3, None)],
            QuizMode::MeaningToLexicon,
            Some(LessonId::new("5")),
            false,
        );
        session
            .record_wrong(WrongRecord::answered(
                word(1, Some("ご")),
                word(3, None),
                QuizMode::MeaningToLexicon,
            ))
            .unwrap();
        session.advance();
        let mut snap = session.to_snapshot(Some(fixed_now()));
        snap.wrong_records.push(WrongRecord::Legacy {
            question: Some(word(2, None)),
            your_answer: Some("x".into()),
            correct_answer: None,
            mode: None,
        });
        snap.wrong_count += 1;

        let decoded = decode_snapshot(&encode_snapshot(&snap).unwrap()).unwrap();
        assert_eq!(decoded, snap);
    }

    #[test]
    fn writes_never_use_legacy_field_names_for_new_records() {
        let session = QuizSession::new(vec![word(1, None)], QuizMode::LexiconToMeaning, None, false);
        let mut snap = session.to_snapshot(None);
        snap.wrong_records
            .push(WrongRecord::answered(word(1, None), word(1, None), QuizMode::LexiconToMeaning));
        let json = encode_snapshot(&snap).unwrap();

        assert!(json.contains("\"orderedWords\""));
        assert!(json.contains("\"mode\":\"lexiconToMeaning\""));
        assert!(!json.contains("yourAnswer"));
        assert!(!json.contains("kanji"));
    }

    #[test]
    fn reads_legacy_payload() {
        let payload = r#"{
            "currentIndex": 1,
            "correctCount": 0,
            "wrongCount": 2,
            "words": [
                {"kanji": "猫", "furigana": "ねこ", "indonesia": "kucing", "dai": "3"},
                {"kanji": "犬", "furigana": "いぬ", "indonesia": "anjing", "dai": "3"}
            ],
            "wrongAnswers": [
                {
                    "question": {"kanji": "猫", "furigana": "ねこ", "indonesia": "kucing", "dai": "3"},
                    "yourAnswer": "anjing",
                    "correctAnswer": "kucing"
                },
                {
                    "question": {"kanji": "猫", "furigana": "ねこ", "indonesia": "kucing", "dai": "3"},
                    "selected": {"kanji": "犬", "furigana": "いぬ", "indonesia": "anjing", "dai": "3"},
                    "quizMode": "jpToId"
                }
            ]
        }"#;

        let snap = decode_snapshot(payload).unwrap();
        assert_eq!(snap.cursor, 1);
        assert_eq!(snap.mode, None);
        assert_eq!(snap.ordered_words.len(), 2);
        assert_eq!(snap.ordered_words[0].key().as_str(), "3:猫");
        assert_eq!(snap.ordered_words[0].reading(), Some("ねこ"));

        match &snap.wrong_records[0] {
            WrongRecord::Legacy {
                your_answer,
                correct_answer,
                mode,
                ..
            } => {
                assert_eq!(your_answer.as_deref(), Some("anjing"));
                assert_eq!(correct_answer.as_deref(), Some("kucing"));
                assert_eq!(*mode, None);
            }
            other => panic!("expected legacy record, got {other:?}"),
        }
        assert_eq!(snap.wrong_records[1].mode(), Some(QuizMode::LexiconToMeaning));
        assert_eq!(snap.wrong_records[1].selected().unwrap().lexicon(), "犬");
    }

    #[test]
    fn structured_record_without_mode_keeps_selected_word() {
        let payload = r#"{
            "currentIndex": 1,
            "wrongCount": 1,
            "words": [{"kanji": "猫", "indonesia": "kucing", "dai": "3"}],
            "wrongAnswers": [{
                "question": {"kanji": "猫", "furigana": "ねこ", "indonesia": "kucing", "dai": "3"},
                "selected": {"kanji": "犬", "furigana": "いぬ", "indonesia": "anjing", "dai": "3"}
            }]
        }"#;

        let snap = decode_snapshot(payload).unwrap();
        let record = &snap.wrong_records[0];
        assert!(matches!(record, WrongRecord::Answered { mode: None, .. }));
        assert_eq!(record.question().unwrap().lexicon(), "猫");
        assert_eq!(record.selected().unwrap().lexicon(), "犬");
        assert_eq!(record.mode(), None);

        // Re-encoding keeps the record structured and still without a mode.
        let again = decode_snapshot(&encode_snapshot(&snap).unwrap()).unwrap();
        assert_eq!(again.wrong_records, snap.wrong_records);
    }

    #[test]
    fn unreadable_wrong_record_becomes_placeholder() {
        let payload = r#"{"orderedWords": [{"key": "a", "lexicon": "a", "meaning": "b", "lesson": "1"}],
            "wrongCount": 1, "wrongRecords": [42]}"#;
        let snap = decode_snapshot(payload).unwrap();
        assert_eq!(snap.wrong_records, vec![WrongRecord::unreadable()]);
    }

    #[test]
    fn missing_words_is_an_error() {
        assert!(matches!(
            decode_snapshot(r#"{"cursor": 0}"#),
            Err(StorageError::Serialization(_))
        ));
    }
}
