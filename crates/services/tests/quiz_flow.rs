use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kotoba_core::model::{
    AnswerRejection, Corpus, CorpusEntry, LessonId, QuizMode, QuizPreferences, QuizSettings,
    QuizSettingsDraft, SessionSnapshot, Word, WrongRecord,
};
use kotoba_core::time::fixed_clock;
use services::{AnswerOutcome, QuizError, QuizPhase, SessionController, TransitionResult};
use storage::repository::{
    InMemoryRepository, PreferencesStore, ProgressStore, Storage, StorageError,
};

const LESSON_ONE: [(&str, &str, &str); 5] = [
    ("w1", "先生", "guru"),
    ("w2", "学生", "murid"),
    ("w3", "本", "buku"),
    ("w4", "水", "air"),
    ("w5", "人", "orang"),
];

const LESSON_TWO: [(&str, &str, &str); 3] = [
    ("w6", "山", "gunung"),
    ("w7", "川", "sungai"),
    ("w8", "木", "pohon"),
];

fn corpus(lessons: &[(&str, &[(&str, &str, &str)])]) -> Corpus {
    let mut corpus = Corpus::default();
    for (lesson, words) in lessons {
        for (id, lexicon, meaning) in *words {
            corpus.push_entry(
                LessonId::new(*lesson),
                CorpusEntry {
                    id: Some((*id).to_string()),
                    lexicon: Some((*lexicon).to_string()),
                    reading: None,
                    meaning: Some((*meaning).to_string()),
                },
            );
        }
    }
    corpus
}

fn one_lesson() -> Corpus {
    corpus(&[("1", &LESSON_ONE[..])])
}

fn two_lessons() -> Corpus {
    corpus(&[("1", &LESSON_ONE[..]), ("2", &LESSON_TWO[..])])
}

fn settings(seed: u64) -> QuizSettings {
    QuizSettingsDraft {
        feedback_delay_ms: Some(50),
        shuffle_seed: Some(seed),
    }
    .validate()
    .unwrap()
}

async fn activated(storage: Storage, seed: u64) -> SessionController {
    let mut controller =
        SessionController::new(storage, settings(seed)).with_clock(fixed_clock());
    controller.activate().await;
    controller
}

fn current(controller: &SessionController) -> Word {
    controller
        .session()
        .and_then(|s| s.current_word())
        .cloned()
        .expect("a current question")
}

fn correct_option(controller: &SessionController) -> Word {
    let current = current(controller);
    controller
        .options()
        .iter()
        .find(|w| w.key() == current.key())
        .cloned()
        .expect("options contain the current word")
}

fn wrong_option(controller: &SessionController) -> Word {
    let current = current(controller);
    controller
        .options()
        .iter()
        .find(|w| w.key() != current.key())
        .cloned()
        .expect("options contain a distractor")
}

/// Submit and immediately apply the transition.
async fn answer(controller: &mut SessionController, selected: &Word) -> AnswerOutcome {
    let submission = controller.submit_answer(selected).await.unwrap();
    let pending = submission.pending.expect("counted answer");
    let result = controller.complete_transition(pending).await;
    assert_ne!(result, TransitionResult::Stale);
    submission.outcome
}

fn key_set(words: &[Word]) -> HashSet<String> {
    words.iter().map(|w| w.key().to_string()).collect()
}

fn assert_counts_follow_cursor(controller: &SessionController) {
    let session = controller.session().unwrap();
    assert_eq!(session.wrong_records().len(), session.wrong_count() as usize);
    if session.is_finished() {
        assert_eq!(session.cursor(), session.total());
        assert_eq!(session.answered_count(), session.total());
    } else if session.is_locked() {
        assert_eq!(session.answered_count(), session.cursor() + 1);
    } else {
        assert_eq!(session.answered_count(), session.cursor());
    }
}

#[tokio::test]
async fn scenario_a_counts_correct_and_wrong_answers() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    repo.save_preferences(&QuizPreferences {
        mode: QuizMode::LexiconToMeaning,
        ..QuizPreferences::default()
    })
    .await
    .unwrap();
    let mut controller = activated(Storage::from_repository(repo), 1).await;
    assert_eq!(controller.phase(), QuizPhase::Ready);
    assert_eq!(controller.session().unwrap().mode(), QuizMode::LexiconToMeaning);

    let right = correct_option(&controller);
    let submission = controller.submit_answer(&right).await.unwrap();
    assert_eq!(submission.outcome, AnswerOutcome::Correct);
    assert_eq!(controller.phase(), QuizPhase::Locked);
    let session = controller.session().unwrap();
    assert_eq!((session.correct_count(), session.wrong_count()), (1, 0));
    assert!(session.wrong_records().is_empty());
    assert!(controller.feedback().unwrap().correct);

    let result = controller
        .complete_transition(submission.pending.unwrap())
        .await;
    assert_eq!(result, TransitionResult::Advanced(1));
    assert_eq!(controller.phase(), QuizPhase::Ready);
    assert!(controller.feedback().is_none());

    let question = current(&controller);
    let wrong = wrong_option(&controller);
    assert_eq!(controller.submit_answer(&wrong).await.unwrap().outcome, AnswerOutcome::Incorrect);
    let session = controller.session().unwrap();
    assert_eq!(session.wrong_count(), 1);
    assert_eq!(
        session.wrong_records(),
        &[WrongRecord::answered(question.clone(), wrong, QuizMode::LexiconToMeaning)]
    );
    let feedback = controller.feedback().unwrap();
    assert!(!feedback.correct);
    assert_eq!(feedback.correct_answer_display, question.meaning());
}

#[tokio::test]
async fn scenario_b_three_of_five_scores_sixty() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 2).await;

    for i in 0..5 {
        let selected = if i < 3 {
            correct_option(&controller)
        } else {
            wrong_option(&controller)
        };
        answer(&mut controller, &selected).await;
        assert_counts_follow_cursor(&controller);
    }

    assert_eq!(controller.phase(), QuizPhase::Finished);
    assert!(controller.options().is_empty());
    let view = controller.view();
    assert!(view.finished);
    assert!(view.question.is_none());
    let report = view.report.expect("report once finished");
    assert_eq!(report.percent, 60);
    assert_eq!((report.correct_count, report.wrong_count, report.total), (3, 2, 5));
    assert_eq!(report.entries.len(), 2);
}

#[tokio::test]
async fn scenario_c_resume_reproduces_current_question() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    let mut first = activated(Storage::from_repository(repo.clone()), 3).await;
    let right = correct_option(&first);
    answer(&mut first, &right).await;
    let wrong = wrong_option(&first);
    answer(&mut first, &wrong).await;

    let saved = first.session().unwrap().clone();
    assert_eq!(saved.cursor(), 2);
    let saved_question = current(&first);

    let resumed = activated(Storage::from_repository(repo), 99).await;
    let session = resumed.session().unwrap();
    assert_eq!(session.cursor(), 2);
    assert_eq!(session.ordered_words(), saved.ordered_words());
    assert_eq!(session.wrong_records(), saved.wrong_records());
    assert_eq!(current(&resumed), saved_question);

    let pool = key_set(session.ordered_words());
    assert!(resumed.options().iter().any(|w| w.key() == saved_question.key()));
    assert!(key_set(resumed.options()).is_subset(&pool));
    assert_eq!(resumed.phase(), QuizPhase::Ready);
}

#[tokio::test]
async fn submissions_while_locked_count_once() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 4).await;
    let right = correct_option(&controller);

    let first = controller.submit_answer(&right).await.unwrap();
    let second = controller.submit_answer(&right).await.unwrap();
    assert_eq!(first.outcome, AnswerOutcome::Correct);
    assert_eq!(second.outcome, AnswerOutcome::Rejected(AnswerRejection::Locked));
    assert!(second.pending.is_none());
    assert_eq!(controller.session().unwrap().answered_count(), 1);

    let pending = first.pending.unwrap();
    assert_eq!(controller.complete_transition(pending).await, TransitionResult::Advanced(1));
    // Replaying an applied ticket does nothing.
    assert_eq!(controller.complete_transition(pending).await, TransitionResult::Stale);
    assert_eq!(controller.session().unwrap().cursor(), 1);
}

#[tokio::test]
async fn reset_invalidates_pending_transition() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 5).await;
    let right = correct_option(&controller);
    let pending = controller
        .submit_answer(&right)
        .await
        .unwrap()
        .pending
        .unwrap();
    let before = controller.generation();

    controller.set_mode(QuizMode::LexiconToMeaning).await.unwrap();
    assert!(controller.generation() > before);
    assert_eq!(controller.complete_transition(pending).await, TransitionResult::Stale);

    let session = controller.session().unwrap();
    assert_eq!((session.cursor(), session.answered_count()), (0, 0));
    assert_eq!(controller.phase(), QuizPhase::Ready);
}

#[tokio::test]
async fn changing_filter_or_mode_resets_the_session() {
    let repo = InMemoryRepository::with_corpus(two_lessons());
    let mut controller = activated(Storage::from_repository(repo.clone()), 6).await;
    assert_eq!(controller.lessons(), &[LessonId::new("1"), LessonId::new("2")]);
    assert_eq!(controller.session().unwrap().total(), 8);

    let wrong = wrong_option(&controller);
    answer(&mut controller, &wrong).await;

    controller
        .set_lesson_filter(Some(LessonId::new("2")))
        .await
        .unwrap();
    let session = controller.session().unwrap();
    assert_eq!((session.cursor(), session.correct_count(), session.wrong_count()), (0, 0, 0));
    assert!(session.wrong_records().is_empty());
    assert_eq!(
        key_set(session.ordered_words()),
        HashSet::from(["w6".to_string(), "w7".to_string(), "w8".to_string()])
    );
    assert!(session.ordered_words().iter().all(|w| w.lesson().as_str() == "2"));

    let right = correct_option(&controller);
    answer(&mut controller, &right).await;
    controller.set_mode(QuizMode::LexiconToMeaning).await.unwrap();
    let session = controller.session().unwrap();
    assert_eq!(session.answered_count(), 0);
    assert_eq!(session.total(), 3);
    assert_eq!(session.mode(), QuizMode::LexiconToMeaning);

    controller.set_lesson_filter(None).await.unwrap();
    assert_eq!(controller.session().unwrap().total(), 8);

    assert_eq!(
        controller.set_lesson_filter(Some(LessonId::new("9"))).await,
        Err(QuizError::UnknownLesson(LessonId::new("9")))
    );

    let saved = repo.load_preferences().await.unwrap().unwrap();
    assert_eq!(saved.mode, QuizMode::LexiconToMeaning);
    assert_eq!(saved.lesson_filter, None);
}

#[tokio::test]
async fn give_up_and_restart() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 7).await;
    let right = correct_option(&controller);
    answer(&mut controller, &right).await;
    let wrong = wrong_option(&controller);
    answer(&mut controller, &wrong).await;

    controller.give_up().await.unwrap();
    assert_eq!(controller.phase(), QuizPhase::Finished);
    let report = controller.report().unwrap();
    assert_eq!((report.correct_count, report.wrong_count, report.total), (1, 1, 5));
    assert_eq!(report.percent, 20);
    let any = wrong_option_from_pool(&controller);
    assert_eq!(
        controller.submit_answer(&any).await.unwrap().outcome,
        AnswerOutcome::Rejected(AnswerRejection::AlreadyFinished)
    );

    let words = key_set(controller.session().unwrap().ordered_words());
    controller.restart().await.unwrap();
    assert_eq!(controller.phase(), QuizPhase::Ready);
    let session = controller.session().unwrap();
    assert_eq!(session.answered_count(), 0);
    assert_eq!(key_set(session.ordered_words()), words);
    assert!(controller.report().is_none());
}

#[tokio::test]
async fn give_up_invalidates_pending_transition() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 8).await;
    let right = correct_option(&controller);
    let pending = controller
        .submit_answer(&right)
        .await
        .unwrap()
        .pending
        .unwrap();
    let before = controller.generation();

    controller.give_up().await.unwrap();
    assert!(controller.generation() > before);
    assert_eq!(controller.complete_transition(pending).await, TransitionResult::Stale);
    assert_eq!(controller.phase(), QuizPhase::Finished);
    assert_eq!(controller.session().unwrap().correct_count(), 1);
}

fn wrong_option_from_pool(controller: &SessionController) -> Word {
    controller.session().unwrap().ordered_words()[0].clone()
}

#[tokio::test]
async fn empty_corpus_waits_for_reload() {
    let repo = InMemoryRepository::new();
    let mut controller = activated(Storage::from_repository(repo.clone()), 8).await;
    assert_eq!(controller.phase(), QuizPhase::EmptyCorpus);
    assert!(controller.lessons().is_empty());
    assert!(controller.view().question.is_none());
    assert_eq!(
        controller.set_mode(QuizMode::LexiconToMeaning).await,
        Err(QuizError::NotReady)
    );

    repo.set_corpus(one_lesson()).unwrap();
    assert_eq!(controller.reload().await, QuizPhase::Ready);
    assert_eq!(controller.session().unwrap().total(), 5);
}

struct BrokenStore;

#[async_trait]
impl ProgressStore for BrokenStore {
    async fn save_progress(&self, _snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn load_progress(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        Err(StorageError::Connection("disk gone".into()))
    }

    async fn clear_progress(&self) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk gone".into()))
    }
}

#[async_trait]
impl PreferencesStore for BrokenStore {
    async fn load_preferences(&self) -> Result<Option<QuizPreferences>, StorageError> {
        Err(StorageError::Connection("disk gone".into()))
    }

    async fn save_preferences(&self, _preferences: &QuizPreferences) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }
}

#[tokio::test]
async fn storage_failures_do_not_interrupt_play() {
    let storage = Storage {
        corpus: Arc::new(InMemoryRepository::with_corpus(one_lesson())),
        progress: Arc::new(BrokenStore),
        preferences: Arc::new(BrokenStore),
    };
    let mut controller = activated(storage, 9).await;
    assert_eq!(controller.phase(), QuizPhase::Ready);

    while controller.phase() == QuizPhase::Ready {
        let right = correct_option(&controller);
        answer(&mut controller, &right).await;
    }
    assert_eq!(controller.phase(), QuizPhase::Finished);
    assert_eq!(controller.report().unwrap().percent, 100);
    assert!(controller.toggle_furigana().await.unwrap());
    controller.close().await;
    assert_eq!(controller.phase(), QuizPhase::Loading);
}

#[tokio::test]
async fn malformed_progress_starts_fresh() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    repo.put_raw_progress("{\"currentIndex\": 3}").unwrap();

    let controller = activated(Storage::from_repository(repo.clone()), 10).await;
    let session = controller.session().unwrap();
    assert_eq!(session.cursor(), 0);
    assert_eq!(session.total(), 5);
    // The fresh session replaced the bad payload.
    assert!(repo.load_progress().await.unwrap().is_some());
}

#[tokio::test]
async fn legacy_progress_takes_mode_from_preferences() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    repo.save_preferences(&QuizPreferences {
        mode: QuizMode::LexiconToMeaning,
        ..QuizPreferences::default()
    })
    .await
    .unwrap();
    repo.put_raw_progress(
        r#"{
            "currentIndex": 1,
            "correctCount": 1,
            "words": [
                {"kanji": "先生", "indonesia": "guru", "dai": "1"},
                {"kanji": "本", "indonesia": "buku", "dai": "1"}
            ]
        }"#,
    )
    .unwrap();

    let controller = activated(Storage::from_repository(repo.clone()), 15).await;
    let session = controller.session().unwrap();
    assert_eq!((session.cursor(), session.total()), (1, 2));
    assert_eq!(session.mode(), QuizMode::LexiconToMeaning);
    assert_eq!(controller.preferences().mode, QuizMode::LexiconToMeaning);

    // The rewritten payload now carries the mode itself.
    let saved = repo.load_progress().await.unwrap().unwrap();
    assert_eq!(saved.mode, Some(QuizMode::LexiconToMeaning));
}

#[tokio::test]
async fn answer_saved_mid_transition_is_not_asked_again() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    let mut first = activated(Storage::from_repository(repo.clone()), 11).await;
    let asked = current(&first);
    let right = correct_option(&first);
    let submission = first.submit_answer(&right).await.unwrap();
    assert!(submission.pending.is_some());

    let resumed = activated(Storage::from_repository(repo), 12).await;
    let session = resumed.session().unwrap();
    assert_eq!((session.cursor(), session.correct_count()), (1, 1));
    assert_eq!(resumed.phase(), QuizPhase::Ready);
    assert_ne!(current(&resumed).key(), asked.key());
}

#[tokio::test]
async fn preferences_seed_a_fresh_session() {
    let repo = InMemoryRepository::with_corpus(two_lessons());
    repo.save_preferences(&QuizPreferences {
        mode: QuizMode::LexiconToMeaning,
        lesson_filter: Some(LessonId::new("2")),
        furigana_visible: true,
    })
    .await
    .unwrap();

    let controller = activated(Storage::from_repository(repo.clone()), 13).await;
    let session = controller.session().unwrap();
    assert_eq!(session.total(), 3);
    assert!(session.furigana_visible());
    assert_eq!(controller.view().lesson_filter, Some(LessonId::new("2")));

    // A filter naming a lesson that is gone falls back to all lessons.
    repo.clear_progress().await.unwrap();
    repo.save_preferences(&QuizPreferences {
        lesson_filter: Some(LessonId::new("7")),
        ..QuizPreferences::default()
    })
    .await
    .unwrap();
    let controller = activated(Storage::from_repository(repo), 14).await;
    assert_eq!(controller.session().unwrap().total(), 8);
    assert_eq!(controller.preferences().lesson_filter, None);
}

#[tokio::test]
async fn toggling_furigana_keeps_progress() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    let mut controller = activated(Storage::from_repository(repo.clone()), 15).await;
    let right = correct_option(&controller);
    answer(&mut controller, &right).await;
    let generation = controller.generation();

    assert!(controller.toggle_furigana().await.unwrap());
    assert_eq!(controller.generation(), generation);
    assert_eq!(controller.session().unwrap().cursor(), 1);
    assert!(controller.view().furigana_visible);
    assert!(repo.load_preferences().await.unwrap().unwrap().furigana_visible);
    assert!(repo.load_progress().await.unwrap().unwrap().furigana_visible);

    assert!(!controller.toggle_furigana().await.unwrap());
}

#[tokio::test]
async fn view_projects_question_and_options() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 16).await;
    let view = controller.view();
    assert_eq!(view.phase, QuizPhase::Ready);
    assert_eq!(view.mode, QuizMode::MeaningToLexicon);

    let question = view.question.unwrap();
    let word = current(&controller);
    assert_eq!(question.prompt, word.meaning());
    assert_eq!((question.number, question.total), (1, 5));
    assert_eq!(question.lesson, LessonId::new("1"));
    assert_eq!(view.options.len(), 3);
    for option in &view.options {
        assert_eq!(option.label, option.word.lexicon());
    }

    let right = correct_option(&controller);
    answer(&mut controller, &right).await;
    assert_eq!(controller.view().question.unwrap().number, 2);
}

#[tokio::test]
async fn close_clears_saved_progress() {
    let repo = InMemoryRepository::with_corpus(one_lesson());
    let mut controller = activated(Storage::from_repository(repo.clone()), 17).await;
    let right = correct_option(&controller);
    let pending = controller
        .submit_answer(&right)
        .await
        .unwrap()
        .pending
        .unwrap();
    assert!(repo.raw_progress().unwrap().is_some());

    controller.close().await;
    assert_eq!(controller.phase(), QuizPhase::Loading);
    assert!(repo.raw_progress().unwrap().is_none());
    assert_eq!(controller.complete_transition(pending).await, TransitionResult::Stale);
    assert_eq!(controller.submit_answer(&right).await, Err(QuizError::NotReady));
}

#[tokio::test(start_paused = true)]
async fn pending_transition_fires_after_the_feedback_delay() {
    let mut controller = activated(Storage::in_memory(one_lesson()), 18).await;
    let start = tokio::time::Instant::now();
    let right = correct_option(&controller);
    let pending = controller
        .submit_answer(&right)
        .await
        .unwrap()
        .pending
        .unwrap();
    assert_eq!(pending.delay(), Duration::from_millis(50));

    pending.wait().await;
    assert!(tokio::time::Instant::now() - start >= Duration::from_millis(50));
    assert_eq!(
        controller.complete_transition(pending).await,
        TransitionResult::Advanced(1)
    );
}
