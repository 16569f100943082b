use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use storage::{LoadedSession, QuizStore};
use trivia_core::ScoreSummary;
use trivia_core::model::{Advance, QuizPhase, SessionState, UserAnswer};

use super::view::QuizView;
use crate::error::QuizError;
use crate::fetch_policy::FetchPolicy;
use crate::question_source::{QuestionQuery, QuestionSource};

/// Message shown when the question bank could not be reached.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load questions. Please try again later.";

/// Default per-question time limit in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u32 = 30;

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Knobs for one quiz engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    pub query: QuestionQuery,
    pub fetch_policy: FetchPolicy,
    pub time_limit_secs: u32,
    /// Seed for answer shuffling. `None` draws one from the thread RNG.
    pub shuffle_seed: Option<u64>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            query: QuestionQuery::default(),
            fetch_policy: FetchPolicy::default(),
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            shuffle_seed: None,
        }
    }
}

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// What an event did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event did not apply to the current phase or question.
    Ignored,
    Ticked { remaining: u32 },
    Advanced { index: usize },
    Completed,
}

impl From<Advance> for Transition {
    fn from(value: Advance) -> Self {
        match value {
            Advance::Next { index } => Self::Advanced { index },
            Advance::Completed => Self::Completed,
        }
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Owns the authoritative quiz state and writes every change through to the
/// profile store before reporting it.
///
/// All transitions take `&mut self`, so they run to completion one at a
/// time. Events that do not fit the current phase are ignored.
pub struct QuizEngine {
    store: QuizStore,
    source: Arc<dyn QuestionSource>,
    settings: QuizSettings,
    rng: StdRng,
    phase: QuizPhase,
    state: SessionState,
}

impl QuizEngine {
    #[must_use]
    pub fn new(store: QuizStore, source: Arc<dyn QuestionSource>, settings: QuizSettings) -> Self {
        let seed = settings
            .shuffle_seed
            .unwrap_or_else(|| rand::rng().random());
        Self {
            store,
            source,
            settings,
            rng: StdRng::seed_from_u64(seed),
            phase: QuizPhase::Idle,
            state: SessionState::empty(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.settings.time_limit_secs
    }

    /// Resume a persisted session or load a fresh batch.
    ///
    /// Only acts from `Idle`; otherwise returns the current phase unchanged.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the profile store fails.
    pub async fn start(&mut self) -> Result<QuizPhase, QuizError> {
        if self.phase != QuizPhase::Idle {
            return Ok(self.phase.clone());
        }

        match self.store.load_session(self.time_limit()).await? {
            LoadedSession::Present(state) => {
                self.phase = if state.is_complete() {
                    QuizPhase::Complete
                } else {
                    QuizPhase::Active
                };
                info!(
                    current_index = state.current_index(),
                    answered = state.questions_answered(),
                    total = state.total_questions(),
                    time_remaining = state.time_remaining(),
                    "resumed persisted quiz"
                );
                self.state = state;
                Ok(self.phase.clone())
            }
            LoadedSession::Corrupt { reason } => {
                warn!(%reason, "discarding corrupt quiz state");
                self.store.clear_session().await?;
                self.load_fresh().await
            }
            LoadedSession::Missing => self.load_fresh().await,
        }
    }

    /// Record `answer` for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the new state cannot be persisted; the
    /// in-memory state is left unchanged in that case.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<Transition, QuizError> {
        self.record(UserAnswer::answered(answer)).await
    }

    /// Countdown progress for `question`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the new state cannot be persisted.
    pub async fn tick(&mut self, question: usize, seconds_left: u32) -> Result<Transition, QuizError> {
        if !self.accepts_timer_for(question) {
            return Ok(Transition::Ignored);
        }

        let mut next = self.state.clone();
        next.set_time_remaining(seconds_left, self.time_limit());
        self.commit(next).await?;
        Ok(Transition::Ticked {
            remaining: self.state.time_remaining(),
        })
    }

    /// Countdown for `question` ran out; records `NoAnswer` and moves on.
    ///
    /// A late expiry for a question that has already been answered is ignored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the new state cannot be persisted.
    pub async fn expire(&mut self, question: usize) -> Result<Transition, QuizError> {
        if !self.accepts_timer_for(question) {
            debug!(question, "ignoring stale expiry");
            return Ok(Transition::Ignored);
        }
        self.record(UserAnswer::NoAnswer).await
    }

    /// Throw the current session away and load a new batch.
    ///
    /// Allowed from every phase.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the profile store fails.
    pub async fn restart(&mut self) -> Result<QuizPhase, QuizError> {
        self.store.clear_session().await?;
        self.state = SessionState::empty();
        self.phase = QuizPhase::Idle;
        info!("quiz restarted");
        self.load_fresh().await
    }

    /// Forget the session without loading a new one (return to login).
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the profile store fails.
    pub async fn reset(&mut self) -> Result<(), QuizError> {
        self.store.clear_session().await?;
        self.state = SessionState::empty();
        self.phase = QuizPhase::Idle;
        Ok(())
    }

    /// Snapshot for rendering.
    #[must_use]
    pub fn view(&self) -> QuizView {
        QuizView {
            phase: self.phase.clone(),
            current_index: self.state.current_index(),
            question: self.state.current_question().cloned(),
            time_remaining: self.state.time_remaining(),
            answered: self.state.questions_answered(),
            total: self.state.total_questions(),
        }
    }

    /// Final score, once the quiz is complete.
    #[must_use]
    pub fn score(&self) -> Option<ScoreSummary> {
        self.phase
            .is_complete()
            .then(|| ScoreSummary::from_session(&self.state))
    }

    fn accepts_timer_for(&self, question: usize) -> bool {
        self.phase.is_active() && self.state.current_index() == question
    }

    async fn record(&mut self, answer: UserAnswer) -> Result<Transition, QuizError> {
        if !self.phase.is_active() {
            return Ok(Transition::Ignored);
        }

        let mut next = self.state.clone();
        let Some(advance) = next.record(answer, self.time_limit()) else {
            return Ok(Transition::Ignored);
        };
        self.commit(next).await?;

        if advance == Advance::Completed {
            self.phase = QuizPhase::Complete;
            info!(total = self.state.total_questions(), "quiz complete");
        } else {
            debug!(index = self.state.current_index(), "advanced to next question");
        }
        Ok(advance.into())
    }

    async fn load_fresh(&mut self) -> Result<QuizPhase, QuizError> {
        self.phase = QuizPhase::Loading;

        let fetched = self
            .settings
            .fetch_policy
            .fetch_batch(self.source.as_ref(), &self.settings.query, &mut self.rng)
            .await;

        match fetched {
            Ok(batch) => {
                let state = SessionState::fresh(batch, self.time_limit());
                if let Err(err) = self.commit(state).await {
                    // Back to Idle so a later `start` fetches again.
                    self.phase = QuizPhase::Idle;
                    return Err(err);
                }
                self.phase = QuizPhase::Active;
            }
            Err(err) => {
                warn!(error = %err, "question bank unavailable");
                self.phase = QuizPhase::Error {
                    message: LOAD_FAILED_MESSAGE.to_string(),
                };
            }
        }
        Ok(self.phase.clone())
    }

    /// Persist first, then adopt, so memory never runs ahead of the store.
    async fn commit(&mut self, next: SessionState) -> Result<(), QuizError> {
        self.store.save_session(&next).await?;
        self.state = next;
        Ok(())
    }
}

impl fmt::Debug for QuizEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizEngine")
            .field("phase", &self.phase)
            .field("current_index", &self.state.current_index())
            .field("answered", &self.state.questions_answered())
            .field("total", &self.state.total_questions())
            .field("time_remaining", &self.state.time_remaining())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
