use std::fmt::Write as _;

use kotoba_core::model::{LessonId, QuizMode, ReviewReport};
use services::{QuizPhase, QuizView, SessionController, TransitionResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

/// One line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based option number.
    Pick(usize),
    ToggleFurigana,
    GiveUp,
    Restart,
    SwitchMode,
    /// `None` clears the filter.
    Lesson(Option<LessonId>),
    Reload,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Ok(number) = line.parse::<usize>() {
        return (number > 0).then_some(Command::Pick(number));
    }

    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));
    match (head, rest) {
        ("f", "") => Some(Command::ToggleFurigana),
        ("g", "") => Some(Command::GiveUp),
        ("r", "") => Some(Command::Restart),
        ("m", "") => Some(Command::SwitchMode),
        ("l", "") => Some(Command::Lesson(None)),
        ("l", lesson) => Some(Command::Lesson(Some(LessonId::new(lesson)))),
        ("reload", "") => Some(Command::Reload),
        ("h" | "?", "") => Some(Command::Help),
        ("q", "") => Some(Command::Quit),
        _ => None,
    }
}

const HELP: &str = "\
commands:
  <n>         pick option n
  f           show/hide readings
  g           give up
  r           restart with the same words
  m           switch quiz direction
  l <lesson>  quiz one lesson (l alone: all lessons)
  reload      reload the corpus
  q           quit";

fn mode_label(mode: QuizMode) -> &'static str {
    match mode {
        QuizMode::LexiconToMeaning => "word -> meaning",
        QuizMode::MeaningToLexicon => "meaning -> word",
    }
}

fn render_report(out: &mut String, report: &ReviewReport) {
    let _ = writeln!(out, "score: {}%", report.percent);
    let _ = writeln!(
        out,
        "{} words, {} correct, {} wrong",
        report.total, report.correct_count, report.wrong_count
    );
    if report.is_perfect() {
        let _ = writeln!(out, "perfect!");
    }
    if !report.entries.is_empty() {
        let _ = writeln!(out, "review:");
        for entry in &report.entries {
            let _ = writeln!(out, "  {}", entry.question_display);
            let _ = writeln!(out, "    you:     {}", entry.your_answer_display);
            let _ = writeln!(out, "    correct: {}", entry.correct_answer_display);
        }
    }
}

/// Text for the current state of the quiz.
pub fn render(view: &QuizView, lessons: &[LessonId]) -> String {
    let mut out = String::new();
    match view.phase {
        QuizPhase::Loading => {
            let _ = writeln!(out, "loading...");
            return out;
        }
        QuizPhase::EmptyCorpus => {
            let _ = writeln!(out, "no words to quiz. fix the corpus and type `reload`.");
            return out;
        }
        QuizPhase::Ready | QuizPhase::Locked | QuizPhase::Finished => {}
    }

    let filter = view
        .lesson_filter
        .as_ref()
        .map_or_else(|| "all".to_owned(), ToString::to_string);
    let lesson_list = lessons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        out,
        "[{}] lesson: {filter} (of {lesson_list})  correct: {}  wrong: {}",
        mode_label(view.mode),
        view.correct_count,
        view.wrong_count
    );

    if let Some(report) = &view.report {
        render_report(&mut out, report);
        let _ = writeln!(out, "r to play again, q to quit");
        return out;
    }

    if let Some(question) = &view.question {
        let _ = writeln!(
            out,
            "question {}/{} (lesson {})",
            question.number, question.total, question.lesson
        );
        let _ = writeln!(out, "  {}", question.prompt);
    }
    for (index, option) in view.options.iter().enumerate() {
        let _ = writeln!(out, "  {}) {}", index + 1, option.label);
    }
    if let Some(feedback) = &view.feedback {
        if feedback.correct {
            let _ = writeln!(out, "correct!");
        } else {
            let _ = writeln!(out, "wrong. answer: {}", feedback.correct_answer_display);
        }
    }
    out
}

async fn show(stdout: &mut Stdout, text: &str) -> std::io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await
}

/// Play until the player quits or input ends.
///
/// # Errors
///
/// Returns an I/O error if the terminal cannot be read or written.
pub async fn run(controller: &mut SessionController) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show(&mut stdout, &render(&controller.view(), controller.lessons())).await?;
    show(&mut stdout, "h for help\n> ").await?;

    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            show(&mut stdout, "unknown command, h for help\n> ").await?;
            continue;
        };

        let outcome = match command {
            Command::Quit => {
                if controller.phase() == QuizPhase::Finished {
                    controller.close().await;
                }
                return Ok(());
            }
            Command::Help => {
                show(&mut stdout, HELP).await?;
                show(&mut stdout, "\n> ").await?;
                continue;
            }
            Command::Reload => {
                controller.reload().await;
                Ok(())
            }
            Command::Pick(number) => match controller.options().get(number - 1).cloned() {
                None => {
                    show(&mut stdout, "no such option\n> ").await?;
                    continue;
                }
                Some(word) => match controller.submit_answer(&word).await {
                    Ok(submission) => {
                        if let Some(pending) = submission.pending {
                            show(&mut stdout, &render(&controller.view(), controller.lessons()))
                                .await?;
                            pending.wait().await;
                            if controller.complete_transition(pending).await
                                == TransitionResult::Stale
                            {
                                tracing::debug!("transition superseded");
                            }
                        }
                        Ok(())
                    }
                    Err(err) => Err(err),
                },
            },
            Command::ToggleFurigana => controller.toggle_furigana().await.map(|_| ()),
            Command::GiveUp => controller.give_up().await,
            Command::Restart => controller.restart().await,
            Command::SwitchMode => {
                let next = match controller.preferences().mode {
                    QuizMode::LexiconToMeaning => QuizMode::MeaningToLexicon,
                    QuizMode::MeaningToLexicon => QuizMode::LexiconToMeaning,
                };
                controller.set_mode(next).await
            }
            Command::Lesson(lesson) => controller.set_lesson_filter(lesson).await,
        };

        if let Err(err) = outcome {
            show(&mut stdout, &format!("{err}\n")).await?;
        }
        show(&mut stdout, &render(&controller.view(), controller.lessons())).await?;
        show(&mut stdout, "> ").await?;
    }
    Ok(())
}
