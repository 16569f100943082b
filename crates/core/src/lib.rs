#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod scoring;
pub mod timer;

pub use error::Error;
pub use scoring::{QuestionOutcome, ScoreSummary};
pub use timer::{Countdown, CountdownStep};
