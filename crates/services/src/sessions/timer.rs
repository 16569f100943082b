use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::debug;

use trivia_core::{Countdown, CountdownStep};

/// Notification from a running countdown.
///
/// `run` identifies the `start` call that produced it, so events from a
/// cancelled run can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick {
        run: u64,
        question: usize,
        remaining: u32,
    },
    Expired {
        run: u64,
        question: usize,
    },
}

impl TimerEvent {
    #[must_use]
    pub fn run(&self) -> u64 {
        match self {
            Self::Tick { run, .. } | Self::Expired { run, .. } => *run,
        }
    }

    #[must_use]
    pub fn question(&self) -> usize {
        match self {
            Self::Tick { question, .. } | Self::Expired { question, .. } => *question,
        }
    }
}

/// Restartable per-question countdown on a tokio task.
///
/// Must be used inside a tokio runtime. Starting a new run aborts the old
/// task; dropping the timer aborts whatever is running.
#[derive(Debug)]
pub struct CountdownTimer {
    period: Duration,
    tx: UnboundedSender<TimerEvent>,
    rx: UnboundedReceiver<TimerEvent>,
    run: u64,
    question: Option<usize>,
    task: Option<JoinHandle<()>>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    /// A timer that ticks once per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    #[must_use]
    pub fn with_period(period: Duration) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            period,
            tx,
            rx,
            run: 0,
            question: None,
            task: None,
        }
    }

    /// Count down `seconds` for `question`, cancelling any previous run.
    pub fn start(&mut self, question: usize, seconds: u32) {
        self.stop();
        self.run += 1;
        self.question = Some(question);

        let run = self.run;
        let period = self.period;
        let tx = self.tx.clone();
        debug!(run, question, seconds, "countdown started");

        self.task = Some(tokio::spawn(async move {
            let mut countdown = Countdown::new(seconds);
            loop {
                tokio::time::sleep(period).await;
                let event = match countdown.step() {
                    CountdownStep::Tick(remaining) => TimerEvent::Tick {
                        run,
                        question,
                        remaining,
                    },
                    CountdownStep::Expired => TimerEvent::Expired { run, question },
                    CountdownStep::Finished => break,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    /// Cancel the current run, if any. Pending events from it are discarded.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.question = None;
    }

    /// True if a run was started for `question` and has not been stopped.
    #[must_use]
    pub fn is_running_for(&self, question: usize) -> bool {
        self.task.is_some() && self.question == Some(question)
    }

    /// Whether `event` belongs to the current, un-stopped run.
    #[must_use]
    pub fn accepts(&self, event: &TimerEvent) -> bool {
        self.task.is_some() && event.run() == self.run
    }

    /// Wait for the next event of the current run.
    ///
    /// Never resolves while the timer is stopped, which makes it safe to use
    /// as one arm of a `select!`.
    pub async fn next_event(&mut self) -> Option<TimerEvent> {
        loop {
            let event = self.rx.recv().await?;
            if self.accepts(&event) {
                return Some(event);
            }
            debug!(run = event.run(), current = self.run, "dropping stale timer event");
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
