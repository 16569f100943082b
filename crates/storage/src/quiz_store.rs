use std::sync::Arc;

use tracing::warn;
use trivia_core::model::{SessionState, Username};

use crate::repository::{KeyValueStore, StorageError};

/// Key holding the serialized quiz session.
pub const QUIZ_STATE_KEY: &str = "quizState";
/// Key holding the display name.
pub const USERNAME_KEY: &str = "username";

/// Result of reading the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedSession {
    Missing,
    /// Present but unreadable or inconsistent; callers treat it as missing.
    Corrupt { reason: String },
    Present(SessionState),
}

/// Typed access to the two keys the quiz uses.
#[derive(Clone)]
pub struct QuizStore {
    kv: Arc<dyn KeyValueStore>,
}

impl QuizStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read and structurally check the persisted session, fitting its clock
    /// to `time_limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend fails; a bad blob is
    /// reported as `LoadedSession::Corrupt`.
    pub async fn load_session(&self, time_limit: u32) -> Result<LoadedSession, StorageError> {
        let Some(blob) = self.kv.read(QUIZ_STATE_KEY).await? else {
            return Ok(LoadedSession::Missing);
        };

        let mut state: SessionState = match serde_json::from_str(&blob) {
            Ok(state) => state,
            Err(err) => {
                return Ok(LoadedSession::Corrupt {
                    reason: err.to_string(),
                });
            }
        };

        match state.validate() {
            Ok(()) => {
                state.fit_clock(time_limit);
                Ok(LoadedSession::Present(state))
            }
            Err(err) => Ok(LoadedSession::Corrupt {
                reason: err.to_string(),
            }),
        }
    }

    /// Persist the full session. Complete once this returns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub async fn save_session(&self, state: &SessionState) -> Result<(), StorageError> {
        let blob =
            serde_json::to_string(state).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.write(QUIZ_STATE_KEY, &blob).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn clear_session(&self) -> Result<(), StorageError> {
        self.kv.clear(QUIZ_STATE_KEY).await
    }

    /// Read the stored display name. An invalid stored name reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn load_username(&self) -> Result<Option<Username>, StorageError> {
        let Some(raw) = self.kv.read(USERNAME_KEY).await? else {
            return Ok(None);
        };
        match Username::parse(&raw) {
            Ok(name) => Ok(Some(name)),
            Err(err) => {
                warn!(%err, "ignoring stored username");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    pub async fn save_username(&self, name: &Username) -> Result<(), StorageError> {
        self.kv.write(USERNAME_KEY, name.as_str()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    pub async fn clear_username(&self) -> Result<(), StorageError> {
        self.kv.clear(USERNAME_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use trivia_core::model::{AnswerBatch, QuestionDraft, UserAnswer};

    const LIMIT: u32 = 30;

    fn session() -> SessionState {
        let mut rng = StdRng::seed_from_u64(1);
        let drafts = vec![
            QuestionDraft {
                prompt: "Q1".into(),
                correct_answer: "A".into(),
                incorrect_answers: vec!["B".into(), "C".into()],
            },
            QuestionDraft {
                prompt: "Q2".into(),
                correct_answer: "D".into(),
                incorrect_answers: vec!["E".into()],
            },
        ];
        let batch = AnswerBatch::from_drafts(drafts, &mut rng).unwrap();
        SessionState::fresh(batch, LIMIT)
    }

    #[tokio::test]
    async fn session_round_trips() {
        let kv = InMemoryStore::new();
        let store = QuizStore::new(Arc::new(kv));
        assert_eq!(store.load_session(LIMIT).await.unwrap(), LoadedSession::Missing);

        let mut state = session();
        state.record(UserAnswer::answered("A"), LIMIT);
        state.set_time_remaining(12, LIMIT);
        store.save_session(&state).await.unwrap();

        assert_eq!(
            store.load_session(LIMIT).await.unwrap(),
            LoadedSession::Present(state)
        );

        store.clear_session().await.unwrap();
        assert_eq!(store.load_session(LIMIT).await.unwrap(), LoadedSession::Missing);
    }

    #[tokio::test]
    async fn lower_limit_keeps_progress_and_shortens_clock() {
        let store = QuizStore::new(Arc::new(InMemoryStore::new()));
        let mut state = session();
        state.record(UserAnswer::answered("A"), LIMIT);
        state.set_time_remaining(25, LIMIT);
        store.save_session(&state).await.unwrap();

        let LoadedSession::Present(resumed) = store.load_session(20).await.unwrap() else {
            panic!("session saved under a longer limit must still load");
        };
        assert_eq!(resumed.current_index(), 1);
        assert_eq!(resumed.answers(), &[UserAnswer::answered("A")]);
        assert_eq!(resumed.time_remaining(), 20);
    }

    #[tokio::test]
    async fn garbage_blob_is_corrupt() {
        let kv = InMemoryStore::new();
        kv.write(QUIZ_STATE_KEY, "{not json").await.unwrap();
        let store = QuizStore::new(Arc::new(kv));
        assert!(matches!(
            store.load_session(LIMIT).await.unwrap(),
            LoadedSession::Corrupt { .. }
        ));
    }

    #[tokio::test]
    async fn empty_batch_blob_is_corrupt() {
        let kv = InMemoryStore::new();
        let blob = serde_json::to_string(&SessionState::empty()).unwrap();
        kv.write(QUIZ_STATE_KEY, &blob).await.unwrap();
        let store = QuizStore::new(Arc::new(kv));
        assert!(matches!(
            store.load_session(LIMIT).await.unwrap(),
            LoadedSession::Corrupt { .. }
        ));
    }

    #[tokio::test]
    async fn username_keys_are_independent() {
        let kv = InMemoryStore::new();
        let store = QuizStore::new(Arc::new(kv.clone()));
        let name = Username::parse("ada").unwrap();

        store.save_username(&name).await.unwrap();
        store.save_session(&session()).await.unwrap();
        store.clear_session().await.unwrap();

        assert_eq!(store.load_username().await.unwrap(), Some(name));
        kv.write(USERNAME_KEY, "   ").await.unwrap();
        assert_eq!(store.load_username().await.unwrap(), None);
    }
}
