use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{config::AppConfig, error::AppError, services::trips::TripStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub trips: TripStore,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, trips: TripStore) -> Self {
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            trips,
            cookie_key,
        }
    }

    /// Runs a blocking store operation off the async runtime.
    pub async fn with_trips<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&TripStore) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let trips = self.trips.clone();
        tokio::task::spawn_blocking(move || op(&trips))
            .await
            .map_err(|err| AppError::Other(err.into()))?
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
