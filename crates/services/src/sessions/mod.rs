mod driver;
mod engine;
mod timer;
mod view;

// Public API of the quiz session subsystem.
pub use crate::error::QuizError;
pub use driver::QuizDriver;
pub use engine::{
    DEFAULT_TIME_LIMIT_SECS, LOAD_FAILED_MESSAGE, QuizEngine, QuizSettings, Transition,
};
pub use timer::{CountdownTimer, TimerEvent};
pub use view::QuizView;
