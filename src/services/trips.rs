use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::AppError,
    models::{
        trip::{TripDraft, TripPatch, TripRecord},
        user::UserIdentity,
    },
    services::storage::KeyValueStore,
};

const TRIPS_KEY_PREFIX: &str = "trips_";

/// Per-user trip lists on top of a [`KeyValueStore`].
///
/// Every mutation is a read-modify-write of the user's whole list. Two sessions
/// for the same user that interleave those steps lose one of the updates: the
/// last save wins and nothing detects it. That is accepted for single-session
/// use.
#[derive(Clone)]
pub struct TripStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TripStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn derive_key(identity: &UserIdentity) -> String {
        format!("{TRIPS_KEY_PREFIX}{}", identity.as_str())
    }

    /// Loads the user's list. Missing or undecodable data yields an empty list.
    pub fn load(&self, identity: &UserIdentity) -> Result<Vec<TripRecord>, AppError> {
        let key = Self::derive_key(identity);
        let Some(raw) = self.backend.get(&key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<TripRecord>>(&raw) {
            Ok(trips) => Ok(trips),
            Err(err) => {
                warn!("discarding undecodable trip list under {key}: {err}");
                Ok(Vec::new())
            }
        }
    }

    pub fn save(&self, identity: &UserIdentity, trips: &[TripRecord]) -> Result<(), AppError> {
        let data = serde_json::to_string(trips).map_err(|err| AppError::Other(err.into()))?;
        self.backend.set(&Self::derive_key(identity), &data)
    }

    /// Stores an empty list for a user seen for the first time.
    pub fn ensure_list(&self, identity: &UserIdentity) -> Result<(), AppError> {
        let key = Self::derive_key(identity);
        if self.backend.get(&key)?.is_none() {
            self.backend.set(&key, "[]")?;
            info!("created trip list for {identity}");
        }
        Ok(())
    }

    pub fn find(&self, identity: &UserIdentity, id: i64) -> Result<Option<TripRecord>, AppError> {
        Ok(self.load(identity)?.into_iter().find(|trip| trip.id == id))
    }

    pub fn add(&self, identity: &UserIdentity, draft: &TripDraft) -> Result<TripRecord, AppError> {
        self.add_with_seed(identity, draft, Utc::now().timestamp_millis())
    }

    fn add_with_seed(
        &self,
        identity: &UserIdentity,
        draft: &TripDraft,
        seed: i64,
    ) -> Result<TripRecord, AppError> {
        let fields = draft.validate()?;
        let mut trips = self.load(identity)?;
        let record = fields.into_record(unique_id(&trips, seed));
        trips.push(record.clone());
        self.save(identity, &trips)?;
        debug!("added trip {} for {identity}", record.id);
        Ok(record)
    }

    pub fn update(
        &self,
        identity: &UserIdentity,
        id: i64,
        patch: TripPatch,
    ) -> Result<TripRecord, AppError> {
        let mut trips = self.load(identity)?;
        let slot = trips
            .iter_mut()
            .find(|trip| trip.id == id)
            .ok_or(AppError::NotFound)?;
        let updated = patch.apply(slot)?;
        *slot = updated.clone();
        self.save(identity, &trips)?;
        debug!("updated trip {id} for {identity}");
        Ok(updated)
    }

    /// Deleting an unknown id is a successful no-op.
    pub fn remove(&self, identity: &UserIdentity, id: i64) -> Result<(), AppError> {
        let mut trips = self.load(identity)?;
        let before = trips.len();
        trips.retain(|trip| trip.id != id);
        if trips.len() == before {
            debug!("trip {id} for {identity} already gone");
        }
        self.save(identity, &trips)
    }
}

/// Starts from `seed` and steps forward past ids already in use.
fn unique_id(trips: &[TripRecord], seed: i64) -> i64 {
    let mut id = seed;
    while trips.iter().any(|trip| trip.id == id) {
        id = id.wrapping_add(1);
    }
    id
}
