use serde::Serialize;

/// Display strings for one wrong answer on the end-of-session screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub question_display: String,
    pub your_answer_display: String,
    pub correct_answer_display: String,
}

/// End-of-session score and the wrong answers to go over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    /// Rounded share of correct answers over all words, 0 when there are none.
    pub percent: u8,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub total: usize,
    pub entries: Vec<ReviewEntry>,
}

impl ReviewReport {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.percent == 100 && self.entries.is_empty()
    }
}
