use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::{AnswerBatch, Question, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Structural problems found in a rehydrated session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("session has no questions")]
    EmptyBatch,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },

    #[error("current index {index} is out of range for {total} questions")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("expected {expected} answers, found {found}")]
    AnswerCountMismatch { expected: usize, found: usize },

    #[error("completed session still has {remaining}s on the clock")]
    CompletedWithTimeLeft { remaining: u32 },
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// What the user did with one question.
///
/// `NoAnswer` is recorded when the countdown runs out. It serializes as a
/// bare tag, so it can never be confused with an answer string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAnswer {
    Answered(String),
    NoAnswer,
}

impl UserAnswer {
    #[must_use]
    pub fn answered(text: impl Into<String>) -> Self {
        Self::Answered(text.into())
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Answered(text) => Some(text),
            Self::NoAnswer => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NoAnswer)
    }
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of the quiz engine.
///
/// Only `Active` accepts answers and runs the countdown. `Error` is reached
/// from `Loading` once the fetch policy gives up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuizPhase {
    #[default]
    Idle,
    Loading,
    Active,
    Complete,
    Error {
        message: String,
    },
}

impl QuizPhase {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Outcome of recording an answer against the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved on to the question at `index`.
    Next { index: usize },
    /// That was the last question.
    Completed,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// The persisted quiz aggregate.
///
/// While active, `answers.len() == current_index`. Once complete the clock
/// reads zero and `answers.len() == batch.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    batch: AnswerBatch,
    current_index: usize,
    answers: Vec<UserAnswer>,
    complete: bool,
    time_remaining: u32,
}

impl SessionState {
    /// An unloaded session.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A session positioned on the first question with a full clock.
    #[must_use]
    pub fn fresh(batch: AnswerBatch, time_limit: u32) -> Self {
        Self {
            batch,
            current_index: 0,
            answers: Vec::new(),
            complete: false,
            time_remaining: time_limit,
        }
    }

    #[must_use]
    pub fn batch(&self) -> &AnswerBatch {
        &self.batch
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.batch.is_empty()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.batch.len()
    }

    #[must_use]
    pub fn questions_answered(&self) -> usize {
        self.answers.len()
    }

    /// The question awaiting an answer, if the session is still running.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.complete {
            return None;
        }
        self.batch.get(self.current_index)
    }

    /// Record `answer` for the current question and move on.
    ///
    /// Returns `None` (and changes nothing) when there is no current question.
    pub fn record(&mut self, answer: UserAnswer, time_limit: u32) -> Option<Advance> {
        self.current_question()?;

        self.answers.push(answer);
        if self.current_index + 1 >= self.batch.len() {
            self.complete = true;
            self.time_remaining = 0;
            Some(Advance::Completed)
        } else {
            self.current_index += 1;
            self.time_remaining = time_limit;
            Some(Advance::Next {
                index: self.current_index,
            })
        }
    }

    /// Update the clock for the current question. Ignored once complete.
    pub fn set_time_remaining(&mut self, seconds: u32, time_limit: u32) {
        if self.complete {
            return;
        }
        self.time_remaining = seconds.min(time_limit);
    }

    /// Pull a saved clock down to `time_limit`. A session saved under a
    /// longer limit keeps its answers and position.
    pub fn fit_clock(&mut self, time_limit: u32) {
        self.set_time_remaining(self.time_remaining, time_limit);
    }

    /// Check that a rehydrated session is internally consistent.
    ///
    /// The clock is not checked here; see [`SessionState::fit_clock`].
    ///
    /// # Errors
    ///
    /// Returns the first `SessionStateError` found.
    pub fn validate(&self) -> Result<(), SessionStateError> {
        let total = self.batch.len();
        if total == 0 {
            return Err(SessionStateError::EmptyBatch);
        }

        for (index, question) in self.batch.iter().enumerate() {
            question
                .check()
                .map_err(|source| SessionStateError::InvalidQuestion { index, source })?;
        }

        if self.complete {
            if self.answers.len() != total {
                return Err(SessionStateError::AnswerCountMismatch {
                    expected: total,
                    found: self.answers.len(),
                });
            }
            if self.time_remaining != 0 {
                return Err(SessionStateError::CompletedWithTimeLeft {
                    remaining: self.time_remaining,
                });
            }
            return Ok(());
        }

        if self.current_index >= total {
            return Err(SessionStateError::IndexOutOfRange {
                index: self.current_index,
                total,
            });
        }
        if self.answers.len() != self.current_index {
            return Err(SessionStateError::AnswerCountMismatch {
                expected: self.current_index,
                found: self.answers.len(),
            });
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionDraft;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const LIMIT: u32 = 30;

    fn batch(n: usize) -> AnswerBatch {
        let mut rng = StdRng::seed_from_u64(5);
        let drafts = (0..n)
            .map(|i| QuestionDraft {
                prompt: format!("Q{i}"),
                correct_answer: format!("A{i}"),
                incorrect_answers: vec![format!("W{i}")],
            })
            .collect();
        AnswerBatch::from_drafts(drafts, &mut rng).unwrap()
    }

    #[test]
    fn record_advances_then_completes() {
        let mut state = SessionState::fresh(batch(2), LIMIT);
        state.set_time_remaining(4, LIMIT);

        assert_eq!(
            state.record(UserAnswer::answered("A0"), LIMIT),
            Some(Advance::Next { index: 1 })
        );
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.time_remaining(), LIMIT);

        assert_eq!(state.record(UserAnswer::NoAnswer, LIMIT), Some(Advance::Completed));
        assert!(state.is_complete());
        assert_eq!(state.time_remaining(), 0);
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.answers().len(), 2);

        assert_eq!(state.record(UserAnswer::answered("late"), LIMIT), None);
        assert_eq!(state.answers().len(), 2);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn empty_session_accepts_nothing() {
        let mut state = SessionState::empty();
        assert_eq!(state.record(UserAnswer::NoAnswer, LIMIT), None);
        assert_eq!(state.validate(), Err(SessionStateError::EmptyBatch));
    }

    #[test]
    fn clock_is_clamped_and_frozen_when_complete() {
        let mut state = SessionState::fresh(batch(1), LIMIT);
        state.set_time_remaining(99, LIMIT);
        assert_eq!(state.time_remaining(), LIMIT);

        state.record(UserAnswer::NoAnswer, LIMIT);
        state.set_time_remaining(10, LIMIT);
        assert_eq!(state.time_remaining(), 0);
    }

    #[test]
    fn clock_saved_under_longer_limit_is_fitted_not_rejected() {
        let mut state = SessionState::fresh(batch(3), 60);
        state.record(UserAnswer::answered("A0"), 60);
        state.set_time_remaining(45, 60);

        assert_eq!(state.validate(), Ok(()));
        state.fit_clock(20);
        assert_eq!(state.time_remaining(), 20);
        assert_eq!(state.current_index(), 1);
        assert_eq!(state.answers(), &[UserAnswer::answered("A0")]);

        state.fit_clock(30);
        assert_eq!(state.time_remaining(), 20);
    }

    #[test]
    fn no_answer_serializes_as_a_tag() {
        let json = serde_json::to_string(&vec![
            UserAnswer::answered("no_answer"),
            UserAnswer::NoAnswer,
        ])
        .unwrap();
        assert_eq!(json, r#"[{"answered":"no_answer"},"no_answer"]"#);

        let back: Vec<UserAnswer> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], UserAnswer::answered("no_answer"));
        assert!(back[1].is_timeout());
    }

    #[test]
    fn validate_rejects_inconsistent_counts() {
        let state = SessionState::fresh(batch(3), LIMIT);
        let mut value = serde_json::to_value(&state).unwrap();
        value["current_index"] = serde_json::json!(2);
        let broken: SessionState = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(
            broken.validate(),
            Err(SessionStateError::AnswerCountMismatch {
                expected: 2,
                found: 0
            })
        );

        value["current_index"] = serde_json::json!(7);
        let broken: SessionState = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(
            broken.validate(),
            Err(SessionStateError::IndexOutOfRange { index: 7, total: 3 })
        );

        value["current_index"] = serde_json::json!(0);
        value["time_remaining"] = serde_json::json!(45);
        let longer_clock: SessionState = serde_json::from_value(value).unwrap();
        assert_eq!(longer_clock.validate(), Ok(()));
    }
}
