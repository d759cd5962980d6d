#![forbid(unsafe_code)]

pub mod error;
pub mod evaluator;
pub mod quiz;
pub mod review;
pub mod sampler;

pub use kotoba_core::Clock;

pub use error::QuizError;
pub use evaluator::{AnswerEvaluator, AnswerOutcome};
pub use quiz::{
    AnswerFeedback, OptionView, PendingTransition, QuestionView, QuizPhase, QuizView,
    SessionController, Submission, TransitionResult,
};
pub use review::ReviewCollector;
pub use sampler::QuestionSampler;
