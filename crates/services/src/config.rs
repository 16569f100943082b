use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::error::ConfigError;
use crate::fetch_policy::FetchPolicy;
use crate::question_source::{DEFAULT_API_URL, Difficulty, QuestionQuery};
use crate::sessions::{DEFAULT_TIME_LIMIT_SECS, QuizSettings};

/// Default on-disk profile store.
pub const DEFAULT_DB_URL: &str = "sqlite://trivia.sqlite3";

/// Runtime configuration, read from `QUIZ_*` environment variables.
#[derive(Clone, Debug)]
pub struct QuizConfig {
    pub api_url: Url,
    pub db_url: String,
    pub request_timeout: Duration,
    pub quiz: QuizSettings,
}

impl QuizConfig {
    /// Read configuration from the environment, falling back to defaults for
    /// unset variables.
    ///
    /// | variable | default |
    /// |---|---|
    /// | `QUIZ_API_URL` | Open Trivia DB |
    /// | `QUIZ_DB_URL` | `sqlite://trivia.sqlite3` |
    /// | `QUIZ_AMOUNT` | 10 |
    /// | `QUIZ_CATEGORY` | 27 (`0` for any) |
    /// | `QUIZ_DIFFICULTY` | easy (`any` for any) |
    /// | `QUIZ_TIME_LIMIT_SECS` | 30 |
    /// | `QUIZ_FETCH_ATTEMPTS` | 3 |
    /// | `QUIZ_FETCH_BACKOFF_MS` | 1000 |
    /// | `QUIZ_REQUEST_TIMEOUT_SECS` | 10 |
    /// | `QUIZ_SHUFFLE_SEED` | random |
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a value that is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`QuizConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a value that is set but does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = match lookup("QUIZ_API_URL") {
            Some(raw) => Url::parse(raw.trim())?,
            None => Url::parse(DEFAULT_API_URL)?,
        };
        let db_url = lookup("QUIZ_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.to_string());

        let amount: u32 = load(&lookup, "QUIZ_AMOUNT", 10)?;
        if amount == 0 {
            return Err(invalid("QUIZ_AMOUNT", "0", "must be at least 1"));
        }
        let category: u32 = load(&lookup, "QUIZ_CATEGORY", 27)?;
        let difficulty = match lookup("QUIZ_DIFFICULTY") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("any") => None,
            Some(raw) => Some(
                raw.parse::<Difficulty>()
                    .map_err(|reason| invalid("QUIZ_DIFFICULTY", &raw, reason))?,
            ),
            None => Some(Difficulty::Easy),
        };

        let time_limit_secs: u32 = load(&lookup, "QUIZ_TIME_LIMIT_SECS", DEFAULT_TIME_LIMIT_SECS)?;
        if time_limit_secs == 0 {
            return Err(invalid("QUIZ_TIME_LIMIT_SECS", "0", "must be at least 1"));
        }

        let attempts: u32 = load(&lookup, "QUIZ_FETCH_ATTEMPTS", 3)?;
        let backoff_ms: u64 = load(&lookup, "QUIZ_FETCH_BACKOFF_MS", 1000)?;
        let initial_backoff = Duration::from_millis(backoff_ms);
        let fetch_policy = FetchPolicy::new(attempts, initial_backoff, initial_backoff * 8);

        let timeout_secs: u64 = load(&lookup, "QUIZ_REQUEST_TIMEOUT_SECS", 10)?;
        let shuffle_seed = match lookup("QUIZ_SHUFFLE_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| invalid("QUIZ_SHUFFLE_SEED", &raw, e))?,
            ),
            None => None,
        };

        Ok(Self {
            api_url,
            db_url,
            request_timeout: Duration::from_secs(timeout_secs),
            quiz: QuizSettings {
                query: QuestionQuery {
                    amount,
                    category: (category != 0).then_some(category),
                    difficulty,
                },
                fetch_policy,
                time_limit_secs,
                shuffle_seed,
            },
        })
    }
}

fn load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => {
            debug!(key, value = %raw, "config override");
            raw.trim().parse().map_err(|e| invalid(key, &raw, e))
        }
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
