use crate::model::{LessonId, QuizMode};

/// User choices that outlive a single session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuizPreferences {
    pub mode: QuizMode,
    pub lesson_filter: Option<LessonId>,
    pub furigana_visible: bool,
}
