use std::sync::Arc;

use storage::{QuizStore, Storage};

use crate::config::QuizConfig;
use crate::error::AppServicesError;
use crate::login_service::LoginService;
use crate::question_source::{OpenTdbSource, QuestionSource};
use crate::sessions::{CountdownTimer, QuizDriver, QuizEngine, QuizSettings};

/// Assembles app-facing services over one profile store.
#[derive(Clone)]
pub struct AppServices {
    store: QuizStore,
    source: Arc<dyn QuestionSource>,
    settings: QuizSettings,
    login: Arc<LoginService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the configured question bank.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: &QuizConfig) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Ok(Self::from_parts(storage, open_tdb(config), config.quiz.clone()))
    }

    /// Build services over a throwaway in-memory store.
    #[must_use]
    pub fn new_in_memory(config: &QuizConfig) -> Self {
        Self::from_parts(Storage::in_memory(), open_tdb(config), config.quiz.clone())
    }

    /// Assemble from explicit parts (tests inject their own source here).
    #[must_use]
    pub fn from_parts(
        storage: Storage,
        source: Arc<dyn QuestionSource>,
        settings: QuizSettings,
    ) -> Self {
        let store = QuizStore::new(Arc::clone(&storage.kv));
        let login = Arc::new(LoginService::new(store.clone()));
        Self {
            store,
            source,
            settings,
            login,
        }
    }

    #[must_use]
    pub fn login(&self) -> Arc<LoginService> {
        Arc::clone(&self.login)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// A fresh engine in `Idle`; call `start` to resume or load.
    #[must_use]
    pub fn quiz_engine(&self) -> QuizEngine {
        QuizEngine::new(
            self.store.clone(),
            Arc::clone(&self.source),
            self.settings.clone(),
        )
    }

    /// An engine wired to a one-second countdown.
    #[must_use]
    pub fn quiz_driver(&self) -> QuizDriver {
        QuizDriver::new(self.quiz_engine(), CountdownTimer::new())
    }
}

fn open_tdb(config: &QuizConfig) -> Arc<dyn QuestionSource> {
    Arc::new(OpenTdbSource::new(
        config.api_url.clone(),
        config.request_timeout,
    ))
}
