//! The quiz state machine and what it shows to the presentation layer.

mod controller;
mod transition;
mod view;

pub use controller::{SessionController, Submission};
pub use transition::{PendingTransition, TransitionResult};
pub use view::{AnswerFeedback, EMPTY_LABEL, OptionView, QuestionView, QuizPhase, QuizView};
