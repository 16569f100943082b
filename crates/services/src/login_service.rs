use tracing::info;

use storage::QuizStore;
use trivia_core::model::Username;

use crate::error::LoginError;

/// Display-name login backed by the profile store.
#[derive(Clone)]
pub struct LoginService {
    store: QuizStore,
}

impl LoginService {
    #[must_use]
    pub fn new(store: QuizStore) -> Self {
        Self { store }
    }

    /// Remember `raw` as the player name and drop any quiz left over from a
    /// previous player.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Username` for a blank or overlong name, or
    /// `LoginError::Storage` if the store fails.
    pub async fn login(&self, raw: &str) -> Result<Username, LoginError> {
        let name = Username::parse(raw)?;
        self.store.clear_session().await?;
        self.store.save_username(&name).await?;
        info!(user = %name, "logged in");
        Ok(name)
    }

    /// # Errors
    ///
    /// Returns `LoginError::Storage` if the store fails.
    pub async fn current_user(&self) -> Result<Option<Username>, LoginError> {
        Ok(self.store.load_username().await?)
    }

    /// Back to the login screen: forget both the quiz and the player.
    ///
    /// # Errors
    ///
    /// Returns `LoginError::Storage` if the store fails.
    pub async fn logout(&self) -> Result<(), LoginError> {
        self.store.clear_session().await?;
        self.store.clear_username().await?;
        info!("logged out");
        Ok(())
    }
}
