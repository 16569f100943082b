use trivia_core::model::{Question, QuizPhase};

/// Presentation-agnostic snapshot of the engine.
///
/// No pre-formatted strings: the shell decides how to render progress and
/// the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub phase: QuizPhase,
    pub current_index: usize,
    /// The question awaiting an answer; `None` unless the quiz is active.
    pub question: Option<Question>,
    pub time_remaining: u32,
    pub answered: usize,
    pub total: usize,
}

impl QuizView {
    /// One-based question number for display.
    #[must_use]
    pub fn question_number(&self) -> usize {
        self.current_index + 1
    }
}
