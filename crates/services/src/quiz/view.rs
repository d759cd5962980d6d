use kotoba_core::model::{LessonId, QuizMode, ReviewReport, Word};
use serde::Serialize;

/// Label for an option whose answer text is empty.
pub const EMPTY_LABEL: &str = "(empty)";

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuizPhase {
    /// Not activated yet, or closed.
    Loading,
    /// The corpus could not be loaded or holds no words. Waits for `reload`.
    EmptyCorpus,
    /// A question is waiting for an answer.
    Ready,
    /// An answer was counted; the next question follows once the transition fires.
    Locked,
    Finished,
}

/// Transient result shown between an answer and the next question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub prompt: String,
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub lesson: LessonId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub label: String,
    pub word: Word,
}

impl OptionView {
    pub(crate) fn new(word: &Word, mode: QuizMode, furigana_visible: bool) -> Self {
        let label = mode.answer_text(word, furigana_visible);
        Self {
            label: if label.is_empty() {
                EMPTY_LABEL.to_owned()
            } else {
                label
            },
            word: word.clone(),
        }
    }
}

/// Read-only projection of the controller for the presentation layer.
///
/// Display strings are already rendered for the active mode and furigana
/// setting; `report` is present only once the session is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub phase: QuizPhase,
    pub mode: QuizMode,
    pub lesson_filter: Option<LessonId>,
    pub furigana_visible: bool,
    pub question: Option<QuestionView>,
    pub options: Vec<OptionView>,
    pub feedback: Option<AnswerFeedback>,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub finished: bool,
    pub report: Option<ReviewReport>,
}
