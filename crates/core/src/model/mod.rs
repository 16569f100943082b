mod question;
mod session;
pub mod text;
mod user;

pub use question::{AnswerBatch, BatchError, Question, QuestionDraft, QuestionError};
pub use session::{Advance, QuizPhase, SessionState, SessionStateError, UserAnswer};
pub use user::{MAX_USERNAME_CHARS, Username, UsernameError};
