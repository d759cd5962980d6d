use kotoba_core::model::{QuizMode, QuizSession, ReviewEntry, ReviewReport, Word, WrongRecord};

/// Shown in place of a legacy record's missing answer text.
pub const NO_ANSWER: &str = "(no answer)";
/// Shown in place of a legacy record's missing correct-answer text.
pub const NO_CORRECT_ANSWER: &str = "(no correct answer)";
/// Shown when a record's question could not be decoded.
pub const UNKNOWN_QUESTION: &str = "(unknown question)";

/// Builds the end-of-session report from a session's counters and wrong records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewCollector;

impl ReviewCollector {
    #[must_use]
    pub fn compute_report(session: &QuizSession) -> ReviewReport {
        let total = session.total();
        let correct_count = session.correct_count();
        let entries = session
            .wrong_records()
            .iter()
            .map(|record| Self::entry(record, session.mode(), session.furigana_visible()))
            .collect();

        ReviewReport {
            percent: percent(correct_count, total),
            correct_count,
            wrong_count: session.wrong_count(),
            total,
            entries,
        }
    }

    /// Render one wrong record. Records without a stored mode use `fallback_mode`.
    #[must_use]
    pub fn entry(record: &WrongRecord, fallback_mode: QuizMode, furigana_visible: bool) -> ReviewEntry {
        let mode = record.mode().unwrap_or(fallback_mode);
        let question_display = record
            .question()
            .map_or_else(|| UNKNOWN_QUESTION.to_owned(), |q| mode.prompt_text(q, furigana_visible));
        let answer = |word: &Word| mode.answer_text(word, furigana_visible);

        match record {
            WrongRecord::Answered {
                question, selected, ..
            } => ReviewEntry {
                question_display,
                your_answer_display: answer(selected),
                correct_answer_display: answer(question),
            },
            WrongRecord::Legacy {
                your_answer,
                correct_answer,
                ..
            } => ReviewEntry {
                question_display,
                your_answer_display: non_empty_or(your_answer.as_deref(), NO_ANSWER),
                correct_answer_display: non_empty_or(correct_answer.as_deref(), NO_CORRECT_ANSWER),
            },
        }
    }
}

fn non_empty_or(text: Option<&str>, placeholder: &str) -> String {
    match text {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => placeholder.to_owned(),
    }
}

/// `round(correct / total * 100)`, 0 for an empty session.
fn percent(correct: u32, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = f64::from(correct) / total as f64;
    // Bounded to 0..=100 before the cast.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
    rounded
}
