use std::fmt;

use services::{AppServices, QuizConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

mod render;
mod shell;

use shell::Shell;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    Conflict,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Conflict => write!(f, "--db and --in-memory cannot be combined"),
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

#[derive(Debug, PartialEq, Eq)]
enum Backend {
    Sqlite(Option<String>),
    InMemory,
}

#[derive(Debug, PartialEq, Eq)]
enum Args {
    Play(Backend),
    Help,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url> | --in-memory]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://trivia.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_API_URL, QUIZ_AMOUNT, QUIZ_CATEGORY, QUIZ_DIFFICULTY,");
    eprintln!("  QUIZ_TIME_LIMIT_SECS, QUIZ_FETCH_ATTEMPTS, QUIZ_FETCH_BACKOFF_MS,");
    eprintln!("  QUIZ_REQUEST_TIMEOUT_SECS, QUIZ_SHUFFLE_SEED, RUST_LOG");
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = None;
        let mut in_memory = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--in-memory" => in_memory = true,
                "--help" | "-h" => return Ok(Self::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match (db_url, in_memory) {
            (Some(_), true) => Err(ArgsError::Conflict),
            (db_url, false) => Ok(Self::Play(Backend::Sqlite(db_url))),
            (None, true) => Ok(Self::Play(Backend::InMemory)),
        }
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// The store creates its database file but not the directory holding it.
fn ensure_parent_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
        _ => {}
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let backend = match args {
        Args::Help => {
            print_usage();
            return Ok(());
        }
        Args::Play(backend) => backend,
    };

    let mut config = QuizConfig::from_env()?;
    let services = match backend {
        Backend::InMemory => {
            info!("using in-memory profile store; progress is lost on exit");
            AppServices::new_in_memory(&config)
        }
        Backend::Sqlite(db_url) => {
            if let Some(db_url) = db_url {
                config.db_url = db_url;
            }
            ensure_parent_dir(&config.db_url)?;
            info!(db_url = %config.db_url, "opening profile store");
            AppServices::new_sqlite(&config).await?
        }
    };

    Shell::new(services).run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    log_fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(raw.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn no_flags_uses_configured_sqlite() {
        assert_eq!(args(&[]).unwrap(), Args::Play(Backend::Sqlite(None)));
    }

    #[test]
    fn db_flag_is_normalized() {
        let parsed = args(&["--db", "sqlite:///tmp/quiz.sqlite3"]).unwrap();
        assert_eq!(
            parsed,
            Args::Play(Backend::Sqlite(Some("sqlite:///tmp/quiz.sqlite3".into())))
        );

        let Args::Play(Backend::Sqlite(Some(url))) = args(&["--db", "quiz.db"]).unwrap() else {
            panic!("expected sqlite backend");
        };
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("quiz.db"));
    }

    #[test]
    fn parent_dir_needs_a_path() {
        assert!(ensure_parent_dir("sqlite::memory:").is_ok());
        assert!(ensure_parent_dir("sqlite://trivia.sqlite3").is_ok());
        assert!(matches!(
            ensure_parent_dir("sqlite://?mode=rwc")
                .unwrap_err()
                .downcast_ref::<ArgsError>(),
            Some(ArgsError::InvalidDbUrl { .. })
        ));
    }

    #[test]
    fn bad_flags_are_rejected() {
        assert!(matches!(
            args(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(args(&["--nope"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            args(&["--in-memory", "--db", "x.db"]),
            Err(ArgsError::Conflict)
        ));
        assert_eq!(args(&["--in-memory"]).unwrap(), Args::Play(Backend::InMemory));
        assert_eq!(args(&["-h"]).unwrap(), Args::Help);
    }
}
