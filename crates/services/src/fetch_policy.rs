use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use trivia_core::model::AnswerBatch;

use crate::error::FetchError;
use crate::question_source::{QuestionQuery, QuestionSource};

/// Bounded retry with exponential backoff around a `QuestionSource`.
///
/// Every failed attempt (transport error, API error code, empty or wrong-sized
/// result, invalid question) waits `initial_backoff * 2^(n-1)`, capped at
/// `max_backoff`, before the next one. After `max_attempts` the last error is
/// returned wrapped in `FetchError::Exhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl FetchPolicy {
    /// At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff)
    }

    /// Obtain one complete, validated batch or give up.
    ///
    /// Dropping the returned future cancels any pending retry.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Exhausted` once every attempt has failed.
    pub async fn fetch_batch<R: Rng + ?Sized>(
        &self,
        source: &dyn QuestionSource,
        query: &QuestionQuery,
        rng: &mut R,
    ) -> Result<AnswerBatch, FetchError> {
        let mut attempt = 1;
        loop {
            match self.attempt(source, query, rng).await {
                Ok(batch) => {
                    info!(attempt, questions = batch.len(), "question batch loaded");
                    return Ok(batch);
                }
                Err(err) if attempt >= self.max_attempts => {
                    warn!(attempt, error = %err, "giving up on question batch");
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff_after(attempt);
                    warn!(attempt, error = %err, ?delay, "question batch attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt<R: Rng + ?Sized>(
        &self,
        source: &dyn QuestionSource,
        query: &QuestionQuery,
        rng: &mut R,
    ) -> Result<AnswerBatch, FetchError> {
        let drafts = source.fetch(query).await?;
        if drafts.is_empty() {
            return Err(FetchError::Empty);
        }

        let expected = usize::try_from(query.amount).unwrap_or(usize::MAX);
        if drafts.len() != expected {
            return Err(FetchError::WrongSize {
                expected,
                found: drafts.len(),
            });
        }

        Ok(AnswerBatch::from_drafts(drafts, rng)?)
    }
}
