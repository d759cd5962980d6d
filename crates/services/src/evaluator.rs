use kotoba_core::model::{Advance, AnswerRejection, QuizSession, Word, WrongRecord};

/// Result of judging one submitted option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// Nothing was counted.
    Rejected(AnswerRejection),
}

impl AnswerOutcome {
    /// Whether the answer was counted (and a transition is now pending).
    #[must_use]
    pub fn is_counted(self) -> bool {
        !matches!(self, AnswerOutcome::Rejected(_))
    }
}

/// Judges answers against the current question and moves the session forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerEvaluator;

impl AnswerEvaluator {
    /// Judge `selected` under the session's mode and count it.
    ///
    /// A counted answer locks the session until [`AnswerEvaluator::apply_transition`].
    /// While locked or after finishing the session is left untouched.
    pub fn submit_answer(session: &mut QuizSession, selected: &Word) -> AnswerOutcome {
        let current = match session.accepting_answer() {
            Ok(word) => word.clone(),
            Err(reason) => return AnswerOutcome::Rejected(reason),
        };

        let mode = session.mode();
        let counted = if mode.matches(&current, selected) {
            session.record_correct().map(|()| AnswerOutcome::Correct)
        } else {
            let record = WrongRecord::answered(current, selected.clone(), mode);
            session.record_wrong(record).map(|()| AnswerOutcome::Incorrect)
        };
        counted.unwrap_or_else(AnswerOutcome::Rejected)
    }

    /// Apply the deferred step after an answer: next question, or finish on the last one.
    ///
    /// Returns `None` when no answer is pending.
    pub fn apply_transition(session: &mut QuizSession) -> Option<Advance> {
        session.advance()
    }
}
