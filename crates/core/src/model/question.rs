use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::text::decode_entities;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,

    #[error("question needs at least one incorrect answer")]
    NoIncorrectAnswers,

    #[error("incorrect answer {index} is empty")]
    EmptyIncorrectAnswer { index: usize },

    #[error("answer options do not match the question's answers")]
    OptionsMismatch,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BatchError {
    #[error("question batch is empty")]
    Empty,

    #[error("question {index} is invalid: {source}")]
    InvalidQuestion {
        index: usize,
        #[source]
        source: QuestionError,
    },
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Raw question text as delivered by the question bank, still entity-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl QuestionDraft {
    /// Decode, validate and fix the presentation order of the answers.
    ///
    /// The answer order is shuffled once here with the caller's `rng`; it is
    /// stored on the question so a reload shows the same order.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any answer is blank after
    /// decoding, or if there are no incorrect answers.
    pub fn validate<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Question, QuestionError> {
        let prompt = decode_entities(self.prompt.trim());
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let correct_answer = decode_entities(self.correct_answer.trim());
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer);
        }

        if self.incorrect_answers.is_empty() {
            return Err(QuestionError::NoIncorrectAnswers);
        }

        let mut incorrect_answers = Vec::with_capacity(self.incorrect_answers.len());
        for (index, raw) in self.incorrect_answers.iter().enumerate() {
            let decoded = decode_entities(raw.trim());
            if decoded.trim().is_empty() {
                return Err(QuestionError::EmptyIncorrectAnswer { index });
            }
            incorrect_answers.push(decoded);
        }

        let mut options = Vec::with_capacity(incorrect_answers.len() + 1);
        options.push(correct_answer.clone());
        options.extend(incorrect_answers.iter().cloned());
        options.shuffle(rng);

        Ok(Question {
            prompt,
            correct_answer,
            incorrect_answers,
            options,
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A decoded multiple-choice question with a fixed answer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
    options: Vec<String>,
}

impl Question {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[String] {
        &self.incorrect_answers
    }

    /// All answers in presentation order.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Structural check for questions rehydrated from storage.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a field is blank or `options` is not exactly
    /// the correct answer plus the incorrect answers.
    pub fn check(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer);
        }
        if self.incorrect_answers.is_empty() {
            return Err(QuestionError::NoIncorrectAnswers);
        }
        if let Some(index) = self
            .incorrect_answers
            .iter()
            .position(|answer| answer.trim().is_empty())
        {
            return Err(QuestionError::EmptyIncorrectAnswer { index });
        }

        let mut expected: Vec<&str> = self
            .incorrect_answers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.correct_answer.as_str()))
            .collect();
        let mut actual: Vec<&str> = self.options.iter().map(String::as_str).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        if expected != actual {
            return Err(QuestionError::OptionsMismatch);
        }

        Ok(())
    }
}

//
// ─── BATCH ─────────────────────────────────────────────────────────────────────
//

/// The ordered set of questions for one quiz session.
///
/// Built atomically: either every question is valid or no batch exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerBatch(Vec<Question>);

impl AnswerBatch {
    /// # Errors
    ///
    /// Returns `BatchError::Empty` for an empty list.
    pub fn new(questions: Vec<Question>) -> Result<Self, BatchError> {
        if questions.is_empty() {
            return Err(BatchError::Empty);
        }
        Ok(Self(questions))
    }

    /// Validate every draft and build a batch, or fail as a whole.
    ///
    /// # Errors
    ///
    /// Returns `BatchError::Empty` for no drafts, or `BatchError::InvalidQuestion`
    /// for the first draft that fails validation.
    pub fn from_drafts<R: Rng + ?Sized>(
        drafts: Vec<QuestionDraft>,
        rng: &mut R,
    ) -> Result<Self, BatchError> {
        let questions = drafts
            .into_iter()
            .enumerate()
            .map(|(index, draft)| {
                draft
                    .validate(rng)
                    .map_err(|source| BatchError::InvalidQuestion { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.0.get(index)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.0.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
