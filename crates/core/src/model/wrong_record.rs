use crate::model::mode::QuizMode;
use crate::model::word::Word;

/// One wrong answer recorded during play.
///
/// New answers always produce `Answered` with a mode. Records read back from
/// older payloads may lack the mode; review then renders them with the
/// session's mode. `Legacy` only comes out of the snapshot codec when it reads
/// records that stored display strings instead of the selected word; any field
/// it could not read is left `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrongRecord {
    Answered {
        question: Word,
        selected: Word,
        mode: Option<QuizMode>,
    },
    Legacy {
        question: Option<Word>,
        your_answer: Option<String>,
        correct_answer: Option<String>,
        mode: Option<QuizMode>,
    },
}

impl WrongRecord {
    #[must_use]
    pub fn answered(question: Word, selected: Word, mode: QuizMode) -> Self {
        Self::Answered {
            question,
            selected,
            mode: Some(mode),
        }
    }

    /// Placeholder for an entry that could not be decoded at all.
    #[must_use]
    pub fn unreadable() -> Self {
        Self::Legacy {
            question: None,
            your_answer: None,
            correct_answer: None,
            mode: None,
        }
    }

    #[must_use]
    pub fn question(&self) -> Option<&Word> {
        match self {
            WrongRecord::Answered { question, .. } => Some(question),
            WrongRecord::Legacy { question, .. } => question.as_ref(),
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Word> {
        match self {
            WrongRecord::Answered { selected, .. } => Some(selected),
            WrongRecord::Legacy { .. } => None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Option<QuizMode> {
        match self {
            WrongRecord::Answered { mode, .. } => *mode,
            WrongRecord::Legacy { mode, .. } => *mode,
        }
    }
}
