use crate::model::{AnswerBatch, SessionState, UserAnswer};

/// How one question went, for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub prompt: String,
    pub chosen: UserAnswer,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Score for a finished quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    total: usize,
    correct: usize,
    incorrect: usize,
    percentage: f64,
    outcomes: Vec<QuestionOutcome>,
}

impl ScoreSummary {
    /// Score `answers` against `batch` by exact comparison with the decoded
    /// correct answer. A missing answer or `NoAnswer` counts as incorrect.
    #[must_use]
    pub fn compute(batch: &AnswerBatch, answers: &[UserAnswer]) -> Self {
        let outcomes: Vec<QuestionOutcome> = batch
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let chosen = answers.get(index).cloned().unwrap_or(UserAnswer::NoAnswer);
                let is_correct = chosen
                    .as_text()
                    .is_some_and(|text| question.is_correct(text));
                QuestionOutcome {
                    prompt: question.prompt().to_owned(),
                    chosen,
                    correct_answer: question.correct_answer().to_owned(),
                    is_correct,
                }
            })
            .collect();

        let total = outcomes.len();
        let correct = outcomes.iter().filter(|o| o.is_correct).count();

        Self {
            total,
            correct,
            incorrect: total - correct,
            percentage: percentage(correct, total),
            outcomes,
        }
    }

    #[must_use]
    pub fn from_session(state: &SessionState) -> Self {
        Self::compute(state.batch(), state.answers())
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.incorrect
    }

    /// Percentage of correct answers, rounded to two decimals.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn outcomes(&self) -> &[QuestionOutcome] {
        &self.outcomes
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = correct as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
