//! Shared error types for the services crate.

use thiserror::Error;

use kotoba_core::model::LessonId;

/// Errors emitted by `SessionController` commands.
///
/// Storage and corpus failures never show up here; the controller logs them
/// and keeps playing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no session is loaded")]
    NotReady,
    #[error("lesson {0} is not in the corpus")]
    UnknownLesson(LessonId),
}
