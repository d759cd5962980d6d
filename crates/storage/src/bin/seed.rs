use std::fmt;
use std::path::PathBuf;

use storage::corpus_json::JsonCorpusFile;
use storage::repository::WordCorpusLoader;
use storage::sqlite::SqliteRepository;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    corpus: PathBuf,
    root: Option<String>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCorpus,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCorpus => write!(f, "--corpus (or KOTOBA_CORPUS) is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("KOTOBA_DB_URL").unwrap_or_else(|_| "sqlite:kotoba.sqlite3?mode=rwc".into());
        let mut corpus = std::env::var("KOTOBA_CORPUS").ok().map(PathBuf::from);
        let mut root = std::env::var("KOTOBA_CORPUS_ROOT").ok();

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--corpus" => {
                    let value = require_value(&mut args, "--corpus")?;
                    corpus = Some(PathBuf::from(value));
                }
                "--root" => {
                    let value = require_value(&mut args, "--root")?;
                    root = Some(value);
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
            corpus: corpus.ok_or(ArgsError::MissingCorpus)?,
            root,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- --corpus <file.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:kotoba.sqlite3?mode=rwc)");
    eprintln!("  --corpus <path>           JSON corpus export to import");
    eprintln!("  --root <key>              Top-level key the lessons are nested under");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  KOTOBA_DB_URL, KOTOBA_CORPUS, KOTOBA_CORPUS_ROOT");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut source = JsonCorpusFile::new(&args.corpus);
    if let Some(root) = &args.root {
        source = source.with_root(root.clone());
    }
    let corpus = source.fetch_all().await?;

    let repo = SqliteRepository::connect(&args.db_url).await?;
    repo.migrate().await?;
    let written = repo.import_corpus(&corpus).await?;

    println!(
        "Imported {written} words in {} lessons from {} into {}",
        corpus.lessons().len(),
        args.corpus.display(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
