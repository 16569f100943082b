use super::engine::{QuizEngine, Transition};
use super::timer::{CountdownTimer, TimerEvent};
use super::view::QuizView;
use crate::error::QuizError;
use trivia_core::ScoreSummary;
use trivia_core::model::QuizPhase;

/// Couples a `QuizEngine` with its countdown.
///
/// This is the only path by which timer callbacks reach the engine. After
/// every transition the timer is re-synchronized: running for the current
/// question while the quiz is active, stopped otherwise.
#[derive(Debug)]
pub struct QuizDriver {
    engine: QuizEngine,
    timer: CountdownTimer,
}

impl QuizDriver {
    #[must_use]
    pub fn new(engine: QuizEngine, timer: CountdownTimer) -> Self {
        Self { engine, timer }
    }

    #[must_use]
    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    #[must_use]
    pub fn view(&self) -> QuizView {
        self.engine.view()
    }

    #[must_use]
    pub fn score(&self) -> Option<ScoreSummary> {
        self.engine.score()
    }

    /// Resume or load the quiz and start the clock when active.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the profile store fails.
    pub async fn start(&mut self) -> Result<QuizPhase, QuizError> {
        let phase = self.engine.start().await?;
        self.sync_timer();
        Ok(phase)
    }

    /// # Errors
    ///
    /// Returns `QuizError` if the profile store fails.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<Transition, QuizError> {
        let transition = self.engine.submit_answer(answer).await?;
        self.sync_timer();
        Ok(transition)
    }

    /// # Errors
    ///
    /// Returns `QuizError` if the profile store fails.
    pub async fn restart(&mut self) -> Result<QuizPhase, QuizError> {
        self.timer.stop();
        let phase = self.engine.restart().await?;
        self.sync_timer();
        Ok(phase)
    }

    /// Stop the clock and forget the session (return to login).
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the profile store fails.
    pub async fn reset(&mut self) -> Result<(), QuizError> {
        self.timer.stop();
        self.engine.reset().await
    }

    /// Next event from the current countdown run.
    ///
    /// Pending forever while no countdown is running.
    pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
        self.timer.next_event().await
    }

    /// Route a countdown event into the engine.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the profile store fails.
    pub async fn handle_timer_event(&mut self, event: TimerEvent) -> Result<Transition, QuizError> {
        if !self.timer.accepts(&event) {
            return Ok(Transition::Ignored);
        }

        let transition = match event {
            TimerEvent::Tick {
                question,
                remaining,
                ..
            } => self.engine.tick(question, remaining).await?,
            TimerEvent::Expired { question, .. } => self.engine.expire(question).await?,
        };
        self.sync_timer();
        Ok(transition)
    }

    fn sync_timer(&mut self) {
        if !self.engine.phase().is_active() {
            self.timer.stop();
            return;
        }

        let state = self.engine.state();
        let index = state.current_index();
        if !self.timer.is_running_for(index) {
            self.timer.start(index, state.time_remaining());
        }
    }
}
