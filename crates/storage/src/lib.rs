#![forbid(unsafe_code)]

pub mod quiz_store;
pub mod repository;
pub mod sqlite;

pub use quiz_store::{LoadedSession, QuizStore, QUIZ_STATE_KEY, USERNAME_KEY};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
