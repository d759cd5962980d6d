mod corpus;
mod ids;
mod mode;
mod preferences;
mod report;
mod session;
mod settings;
mod word;
mod wrong_record;

pub use corpus::{Corpus, CorpusEntry, Lesson, MISSING_LEXICON, MISSING_MEANING};
pub use ids::{LessonId, WordKey};
pub use mode::{ParseQuizModeError, QuizMode};
pub use preferences::QuizPreferences;
pub use report::{ReviewEntry, ReviewReport};
pub use session::{Advance, AnswerRejection, QuizSession, SessionSnapshot, SnapshotError};
pub use settings::{DEFAULT_FEEDBACK_DELAY, QuizSettings, QuizSettingsDraft, SettingsError};
pub use word::{Word, WordError};
pub use wrong_record::WrongRecord;
