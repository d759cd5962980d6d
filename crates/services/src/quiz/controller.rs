use kotoba_core::Clock;
use kotoba_core::model::{
    Advance, LessonId, QuizMode, QuizPreferences, QuizSession, QuizSettings, ReviewReport, Word,
};
use storage::repository::Storage;
use tracing::{debug, info, warn};

use super::transition::{PendingTransition, TransitionResult};
use super::view::{AnswerFeedback, OptionView, QuestionView, QuizPhase, QuizView};
use crate::error::QuizError;
use crate::evaluator::{AnswerEvaluator, AnswerOutcome};
use crate::review::ReviewCollector;
use crate::sampler::QuestionSampler;

/// Result of `SessionController::submit_answer`.
///
/// `pending` is set whenever the answer was counted; hand it back to
/// `complete_transition` once the feedback delay is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub outcome: AnswerOutcome,
    pub pending: Option<PendingTransition>,
}

#[derive(Debug, Clone)]
enum ControllerState {
    Loading,
    EmptyCorpus,
    Playing {
        session: QuizSession,
        options: Vec<Word>,
    },
}

/// Drives one quiz at a time on top of the storage ports.
///
/// The controller owns:
/// - the corpus pool and its lesson list
/// - the live `QuizSession` and the options for its current question
/// - the generation counter that invalidates stale transitions
///
/// Persistence is best effort. Every mutation saves a snapshot, preference
/// changes are saved separately, and any storage failure is logged and
/// otherwise ignored.
pub struct SessionController {
    storage: Storage,
    settings: QuizSettings,
    clock: Clock,
    sampler: QuestionSampler,
    state: ControllerState,
    pool: Vec<Word>,
    lessons: Vec<LessonId>,
    preferences: QuizPreferences,
    feedback: Option<AnswerFeedback>,
    generation: u64,
}

impl SessionController {
    #[must_use]
    pub fn new(storage: Storage, settings: QuizSettings) -> Self {
        let sampler = QuestionSampler::from_settings(&settings);
        Self {
            storage,
            settings,
            clock: Clock::default(),
            sampler,
            state: ControllerState::Loading,
            pool: Vec::new(),
            lessons: Vec::new(),
            preferences: QuizPreferences::default(),
            feedback: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Load the corpus and resume the saved session, or start a fresh one.
    ///
    /// Corpus failures end in [`QuizPhase::EmptyCorpus`]; progress and
    /// preference failures fall back to a fresh session with defaults.
    pub async fn activate(&mut self) -> QuizPhase {
        self.invalidate();
        self.state = ControllerState::Loading;
        self.feedback = None;

        self.pool = match self.load_pool().await {
            Some(pool) => pool,
            None => {
                self.lessons.clear();
                self.state = ControllerState::EmptyCorpus;
                return QuizPhase::EmptyCorpus;
            }
        };

        self.preferences = self.load_preferences().await;
        if let Some(stale) = self
            .preferences
            .lesson_filter
            .take_if(|lesson| !self.lessons.contains(lesson))
        {
            info!(lesson = %stale, "saved lesson filter no longer exists; using all lessons");
        }

        if let Some(session) = self.load_session().await {
            info!(
                cursor = session.cursor(),
                total = session.total(),
                "resuming saved session"
            );
            self.preferences = QuizPreferences {
                mode: session.mode(),
                lesson_filter: session.lesson_filter().cloned(),
                furigana_visible: session.furigana_visible(),
            };
            self.install(session);
            self.persist().await;
        } else {
            self.start_fresh().await;
        }
        self.phase()
    }

    /// Retry activation, e.g. after [`QuizPhase::EmptyCorpus`].
    pub async fn reload(&mut self) -> QuizPhase {
        debug!(generation = self.generation, "reloading");
        self.activate().await
    }

    /// End the containing UI session: drop the live session, invalidate
    /// pending transitions and clear the saved progress.
    pub async fn close(&mut self) {
        self.invalidate();
        self.state = ControllerState::Loading;
        self.feedback = None;
        if let Err(err) = self.storage.progress.clear_progress().await {
            warn!(error = %err, "failed to clear quiz progress");
        }
    }

    //
    // ─── PLAY ──────────────────────────────────────────────────────────────────
    //

    /// Judge `selected` against the current question.
    ///
    /// A counted answer locks the session, sets the feedback and returns a
    /// ticket for the deferred transition. Submitting while locked or after
    /// finishing is answered with [`AnswerOutcome::Rejected`] and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no session is loaded.
    pub async fn submit_answer(&mut self, selected: &Word) -> Result<Submission, QuizError> {
        let generation = self.generation;
        let delay = self.settings.feedback_delay();
        let ControllerState::Playing { session, .. } = &mut self.state else {
            return Err(QuizError::NotReady);
        };

        let correct_answer = session
            .current_word()
            .map(|word| session.mode().answer_text(word, session.furigana_visible()));
        let outcome = AnswerEvaluator::submit_answer(session, selected);
        if !outcome.is_counted() {
            debug!(?outcome, "answer not counted");
            return Ok(Submission {
                outcome,
                pending: None,
            });
        }

        let answered = session.answered_count();
        debug!(
            generation,
            cursor = session.cursor(),
            correct = outcome == AnswerOutcome::Correct,
            "answer counted"
        );
        self.feedback = Some(AnswerFeedback {
            correct: outcome == AnswerOutcome::Correct,
            correct_answer_display: correct_answer.unwrap_or_default(),
        });
        self.persist().await;

        Ok(Submission {
            outcome,
            pending: Some(PendingTransition::new(generation, answered, delay)),
        })
    }

    /// Apply a deferred transition if it still belongs to the live session.
    pub async fn complete_transition(&mut self, pending: PendingTransition) -> TransitionResult {
        if pending.generation() != self.generation {
            debug!(
                scheduled = pending.generation(),
                generation = self.generation,
                "dropping stale transition"
            );
            return TransitionResult::Stale;
        }
        let ControllerState::Playing { session, options } = &mut self.state else {
            return TransitionResult::Stale;
        };
        if !session.is_locked() || session.answered_count() != pending.answered() {
            return TransitionResult::Stale;
        }

        let result = match AnswerEvaluator::apply_transition(session) {
            Some(Advance::Next(cursor)) => {
                *options = self.sampler.generate_options(session.ordered_words(), cursor);
                TransitionResult::Advanced(cursor)
            }
            Some(Advance::Finished) => {
                options.clear();
                info!(
                    correct = session.correct_count(),
                    wrong = session.wrong_count(),
                    "session finished"
                );
                TransitionResult::Finished
            }
            None => return TransitionResult::Stale,
        };
        self.feedback = None;
        self.persist().await;
        result
    }

    /// Stop early, keeping the counters and wrong answers gathered so far.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no session is loaded.
    pub async fn give_up(&mut self) -> Result<(), QuizError> {
        let ControllerState::Playing { session, options } = &mut self.state else {
            return Err(QuizError::NotReady);
        };
        session.give_up();
        options.clear();
        self.invalidate();
        self.feedback = None;
        self.persist().await;
        Ok(())
    }

    /// Start over with the same words in a new order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no session is loaded.
    pub async fn restart(&mut self) -> Result<(), QuizError> {
        let ControllerState::Playing { session, .. } = &self.state else {
            return Err(QuizError::NotReady);
        };
        let words = session.ordered_words().to_vec();
        self.invalidate();
        let ordered = self.sampler.initialize_order(words);
        self.install(self.fresh_session(ordered));
        self.persist().await;
        Ok(())
    }

    //
    // ─── SETTINGS ──────────────────────────────────────────────────────────────
    //

    /// Restrict the quiz to one lesson, or lift the restriction with `None`.
    /// Always starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no corpus is loaded and
    /// `QuizError::UnknownLesson` if the lesson is not in the corpus.
    pub async fn set_lesson_filter(&mut self, lesson: Option<LessonId>) -> Result<(), QuizError> {
        self.ensure_loaded()?;
        if let Some(unknown) = lesson.as_ref().filter(|l| !self.lessons.contains(l)) {
            return Err(QuizError::UnknownLesson(unknown.clone()));
        }
        self.preferences.lesson_filter = lesson;
        self.save_preferences().await;
        self.start_fresh().await;
        Ok(())
    }

    /// Switch the quiz direction. Always starts a fresh session.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no corpus is loaded.
    pub async fn set_mode(&mut self, mode: QuizMode) -> Result<(), QuizError> {
        self.ensure_loaded()?;
        self.preferences.mode = mode;
        self.save_preferences().await;
        self.start_fresh().await;
        Ok(())
    }

    /// Show or hide readings. Does not touch progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotReady` if no session is loaded.
    pub async fn toggle_furigana(&mut self) -> Result<bool, QuizError> {
        let ControllerState::Playing { session, .. } = &mut self.state else {
            return Err(QuizError::NotReady);
        };
        let visible = !session.furigana_visible();
        session.set_furigana_visible(visible);
        self.preferences.furigana_visible = visible;
        self.save_preferences().await;
        self.persist().await;
        Ok(visible)
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        match &self.state {
            ControllerState::Loading => QuizPhase::Loading,
            ControllerState::EmptyCorpus => QuizPhase::EmptyCorpus,
            ControllerState::Playing { session, .. } if session.is_finished() => {
                QuizPhase::Finished
            }
            ControllerState::Playing { session, .. } if session.is_locked() => QuizPhase::Locked,
            ControllerState::Playing { .. } => QuizPhase::Ready,
        }
    }

    /// Bumped whenever the live session is replaced or dropped.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        match &self.state {
            ControllerState::Playing { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Options for the current question; empty when there is none.
    #[must_use]
    pub fn options(&self) -> &[Word] {
        match &self.state {
            ControllerState::Playing { options, .. } => options,
            _ => &[],
        }
    }

    /// Lessons in the loaded corpus, sorted and de-duplicated.
    #[must_use]
    pub fn lessons(&self) -> &[LessonId] {
        &self.lessons
    }

    #[must_use]
    pub fn preferences(&self) -> &QuizPreferences {
        &self.preferences
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&AnswerFeedback> {
        self.feedback.as_ref()
    }

    /// The end-of-session report, once finished.
    #[must_use]
    pub fn report(&self) -> Option<ReviewReport> {
        self.session()
            .filter(|session| session.is_finished())
            .map(ReviewCollector::compute_report)
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        let phase = self.phase();
        let Some(session) = self.session() else {
            return QuizView {
                phase,
                mode: self.preferences.mode,
                lesson_filter: self.preferences.lesson_filter.clone(),
                furigana_visible: self.preferences.furigana_visible,
                question: None,
                options: Vec::new(),
                feedback: None,
                correct_count: 0,
                wrong_count: 0,
                finished: false,
                report: None,
            };
        };

        let mode = session.mode();
        let furigana = session.furigana_visible();
        let question = session.current_word().map(|word| QuestionView {
            prompt: mode.prompt_text(word, furigana),
            number: session.cursor() + 1,
            total: session.total(),
            lesson: word.lesson().clone(),
        });

        QuizView {
            phase,
            mode,
            lesson_filter: session.lesson_filter().cloned(),
            furigana_visible: furigana,
            question,
            options: self
                .options()
                .iter()
                .map(|word| OptionView::new(word, mode, furigana))
                .collect(),
            feedback: self.feedback.clone(),
            correct_count: session.correct_count(),
            wrong_count: session.wrong_count(),
            finished: session.is_finished(),
            report: self.report(),
        }
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn ensure_loaded(&self) -> Result<(), QuizError> {
        match self.state {
            ControllerState::Playing { .. } => Ok(()),
            _ => Err(QuizError::NotReady),
        }
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    async fn load_pool(&mut self) -> Option<Vec<Word>> {
        let corpus = match self.storage.corpus.fetch_all().await {
            Ok(corpus) => corpus,
            Err(err) => {
                warn!(error = %err, "failed to load word corpus");
                return None;
            }
        };
        let pool = match corpus.words() {
            Ok(pool) => pool,
            Err(err) => {
                warn!(error = %err, "word corpus holds an unusable record");
                return None;
            }
        };
        if pool.is_empty() {
            warn!("word corpus is empty");
            return None;
        }
        self.lessons = corpus.lesson_ids();
        debug!(words = pool.len(), lessons = self.lessons.len(), "corpus loaded");
        Some(pool)
    }

    async fn load_preferences(&self) -> QuizPreferences {
        match self.storage.preferences.load_preferences().await {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to load quiz preferences");
                QuizPreferences::default()
            }
        }
    }

    async fn load_session(&self) -> Option<QuizSession> {
        let mut snapshot = match self.storage.progress.load_progress().await {
            Ok(snapshot) => snapshot?,
            Err(err) => {
                warn!(error = %err, "failed to load quiz progress");
                return None;
            }
        };
        if snapshot.ordered_words.is_empty() {
            return None;
        }
        // Older payloads kept the mode in the preferences slot.
        snapshot.mode.get_or_insert(self.preferences.mode);
        match QuizSession::from_snapshot(snapshot) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(error = %err, "discarding inconsistent quiz progress");
                None
            }
        }
    }

    async fn save_preferences(&self) {
        if let Err(err) = self
            .storage
            .preferences
            .save_preferences(&self.preferences)
            .await
        {
            warn!(error = %err, "failed to save quiz preferences");
        }
    }

    async fn persist(&self) {
        let Some(session) = self.session() else {
            return;
        };
        let snapshot = session.to_snapshot(Some(self.clock.now()));
        if let Err(err) = self.storage.progress.save_progress(&snapshot).await {
            warn!(error = %err, "failed to save quiz progress");
        }
    }

    /// Replace the live session with a new one built from the preferences.
    async fn start_fresh(&mut self) {
        self.invalidate();
        let filtered: Vec<Word> = match &self.preferences.lesson_filter {
            Some(lesson) => self
                .pool
                .iter()
                .filter(|word| word.lesson() == lesson)
                .cloned()
                .collect(),
            None => self.pool.clone(),
        };
        let ordered = self.sampler.initialize_order(filtered);
        debug!(
            generation = self.generation,
            total = ordered.len(),
            mode = %self.preferences.mode,
            "starting fresh session"
        );
        self.install(self.fresh_session(ordered));
        self.persist().await;
    }

    fn fresh_session(&self, ordered: Vec<Word>) -> QuizSession {
        QuizSession::new(
            ordered,
            self.preferences.mode,
            self.preferences.lesson_filter.clone(),
            self.preferences.furigana_visible,
        )
    }

    fn install(&mut self, session: QuizSession) {
        let options = if session.is_finished() {
            Vec::new()
        } else {
            self.sampler
                .generate_options(session.ordered_words(), session.cursor())
        };
        self.feedback = None;
        self.state = ControllerState::Playing { session, options };
    }
}
