use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use kotoba_core::model::{QuizSettings, QuizSettingsDraft};
use services::{Clock, SessionController};
use storage::corpus_json::JsonCorpusFile;
use storage::repository::Storage;

mod logging;
mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDelay { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDelay { raw } => write!(f, "invalid --delay-ms value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    corpus: Option<PathBuf>,
    delay_ms: Option<u64>,
    seed: Option<u64>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     Progress and corpus database (default: sqlite:kotoba.sqlite3)");
    eprintln!("  --corpus <path>       Read words from a JSON export instead of the database");
    eprintln!("  --delay-ms <ms>       Pause after each answer (default: 1200)");
    eprintln!("  --seed <n>            Fixed shuffle seed");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  KOTOBA_DB_URL, KOTOBA_CORPUS, KOTOBA_FEEDBACK_DELAY_MS, KOTOBA_SEED");
    eprintln!("  KOTOBA_LOG   tracing filter (default: warn)");
}

fn parse_u64(raw: String, err: fn(String) -> ArgsError) -> Result<u64, ArgsError> {
    raw.trim().parse::<u64>().map_err(|_| err(raw))
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            std::env::var("KOTOBA_DB_URL").unwrap_or_else(|_| "sqlite:kotoba.sqlite3".into()),
        );
        let mut corpus = std::env::var("KOTOBA_CORPUS").ok().map(PathBuf::from);
        let mut delay_ms = std::env::var("KOTOBA_FEEDBACK_DELAY_MS")
            .ok()
            .map(|raw| parse_u64(raw, |raw| ArgsError::InvalidDelay { raw }))
            .transpose()?;
        let mut seed = std::env::var("KOTOBA_SEED")
            .ok()
            .map(|raw| parse_u64(raw, |raw| ArgsError::InvalidSeed { raw }))
            .transpose()?;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--corpus" => {
                    let value = require_value(&mut args, "--corpus")?;
                    corpus = Some(PathBuf::from(value));
                }
                "--delay-ms" => {
                    let value = require_value(&mut args, "--delay-ms")?;
                    delay_ms = Some(parse_u64(value, |raw| ArgsError::InvalidDelay { raw })?);
                }
                "--seed" => {
                    let value = require_value(&mut args, "--seed")?;
                    seed = Some(parse_u64(value, |raw| ArgsError::InvalidSeed { raw })?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            corpus,
            delay_ms,
            seed,
        })
    }

    fn settings(&self) -> Result<QuizSettings, kotoba_core::Error> {
        let settings = QuizSettingsDraft {
            feedback_delay_ms: self.delay_ms,
            shuffle_seed: self.seed,
        }
        .validate()?;
        Ok(settings)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// `SQLite` will not create a missing database file on its own.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let log_level =
        std::env::var("KOTOBA_LOG").unwrap_or_else(|_| logging::DEFAULT_LOG_LEVEL.into());
    logging::init_tracing(&log_level);

    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = args.settings()?;

    // Open + migrate SQLite here so core/services stay free of I/O setup.
    prepare_sqlite_file(&args.db_url)?;
    let mut storage = Storage::sqlite(&args.db_url).await?;
    if let Some(path) = &args.corpus {
        tracing::info!(path = %path.display(), "reading corpus from JSON export");
        storage = storage.with_corpus_loader(Arc::new(JsonCorpusFile::new(path)));
    }

    let mut controller = SessionController::new(storage, settings).with_clock(Clock::System);
    controller.activate().await;
    terminal::run(&mut controller).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = Args::parse(args(&[
            "--db",
            "sqlite::memory:",
            "--corpus",
            "words.json",
            "--delay-ms",
            "300",
            "--seed",
            "42",
        ]))
        .unwrap();

        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert_eq!(parsed.corpus, Some(PathBuf::from("words.json")));
        assert_eq!(parsed.delay_ms, Some(300));
        assert_eq!(parsed.seed, Some(42));

        let settings = parsed.settings().unwrap();
        assert_eq!(settings.feedback_delay().as_millis(), 300);
        assert_eq!(settings.shuffle_seed(), Some(42));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Args::parse(args(&["--seed", "abc"])),
            Err(ArgsError::InvalidSeed { .. })
        ));
        assert!(matches!(
            Args::parse(args(&["--delay-ms"])),
            Err(ArgsError::MissingValue { flag: "--delay-ms" })
        ));
        assert!(matches!(
            Args::parse(args(&["--db", " "])),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
        assert!(matches!(
            Args::parse(args(&["--verbose"])),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn out_of_range_delay_fails_validation() {
        let parsed = Args::parse(args(&["--delay-ms", "0"])).unwrap();
        assert!(matches!(
            parsed.settings(),
            Err(kotoba_core::Error::Settings(_))
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/kotoba.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/kotoba.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
