//! In-process profile store with one lock per contributor.
//!
//! The outer map lock is held only long enough to find or create an entry.
//! Each profile sits behind its own mutex, so a scoring call serializes with
//! other calls for the same contributor while different contributors
//! proceed in parallel.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info};

use super::error::{ScoringError, ScoringResult};
use super::profile::{ContributorProfile, ProfileRecord, DEFAULT_HISTORY_LIMIT};

/// Shared handle to a single contributor's profile.
pub(crate) type ProfileHandle = Arc<Mutex<ContributorProfile>>;

/// Shared reference to a ProfileStore
pub type SharedProfileStore = Arc<ProfileStore>;

/// Keyed mapping from contributor id to profile.
#[derive(Default)]
pub struct ProfileStore {
    profiles: RwLock<HashMap<String, ProfileHandle>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedProfileStore {
        Arc::new(self)
    }

    /// Load profiles from a JSON file of export records, keeping the
    /// default number of history entries. Returns an empty store if the
    /// file doesn't exist.
    pub fn load(path: &Path) -> ScoringResult<Self> {
        Self::load_with_limit(path, DEFAULT_HISTORY_LIMIT)
    }

    /// Like [`load`](Self::load), trimming each history to `history_limit`.
    pub fn load_with_limit(path: &Path, history_limit: usize) -> ScoringResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No profile file; starting empty");
            return Ok(Self::new());
        }
        let data = std::fs::read_to_string(path).map_err(|e| ScoringError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let records: Vec<ProfileRecord> = serde_json::from_str(&data)?;

        let profiles = records
            .into_iter()
            .map(|record| {
                let profile = ContributorProfile::from_record(record, history_limit);
                (profile.id.clone(), Arc::new(Mutex::new(profile)))
            })
            .collect::<HashMap<_, _>>();

        info!(path = %path.display(), count = profiles.len(), "Loaded profiles");
        Ok(Self {
            profiles: RwLock::new(profiles),
        })
    }

    /// Persist every profile as a JSON array of export records, ordered by id.
    pub fn save(&self, path: &Path) -> ScoringResult<()> {
        let mut records: Vec<ProfileRecord> = self
            .snapshot_all()?
            .iter()
            .map(ContributorProfile::to_record)
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        let data = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, data).map_err(|e| ScoringError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(path = %path.display(), count = records.len(), "Saved profiles");
        Ok(())
    }

    /// Find the profile for `id`, creating an empty one on first use.
    pub(crate) fn get_or_create(&self, id: &str) -> ScoringResult<ProfileHandle> {
        if let Some(handle) = self.handle(id)? {
            return Ok(handle);
        }

        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| ScoringError::LockPoisoned("profile map".to_string()))?;
        let handle = profiles.entry(id.to_string()).or_insert_with(|| {
            debug!(contributor = %id, "Creating profile");
            Arc::new(Mutex::new(ContributorProfile::new(id)))
        });
        Ok(Arc::clone(handle))
    }

    /// Install `profile`, replacing any existing entry with the same id.
    pub(crate) fn insert(&self, profile: ContributorProfile) -> ScoringResult<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| ScoringError::LockPoisoned("profile map".to_string()))?;
        profiles.insert(profile.id.clone(), Arc::new(Mutex::new(profile)));
        Ok(())
    }

    /// Copy of the profile for `id`, if one exists.
    pub fn get(&self, id: &str) -> ScoringResult<Option<ContributorProfile>> {
        match self.handle(id)? {
            Some(handle) => {
                let profile = handle
                    .lock()
                    .map_err(|_| ScoringError::LockPoisoned(id.to_string()))?;
                Ok(Some(profile.clone()))
            }
            None => Ok(None),
        }
    }

    /// Copies of every profile, in no particular order.
    pub fn snapshot_all(&self) -> ScoringResult<Vec<ContributorProfile>> {
        let handles: Vec<(String, ProfileHandle)> = {
            let profiles = self
                .profiles
                .read()
                .map_err(|_| ScoringError::LockPoisoned("profile map".to_string()))?;
            profiles
                .iter()
                .map(|(id, handle)| (id.clone(), Arc::clone(handle)))
                .collect()
        };

        handles
            .into_iter()
            .map(|(id, handle)| {
                handle
                    .lock()
                    .map(|profile| profile.clone())
                    .map_err(|_| ScoringError::LockPoisoned(id))
            })
            .collect()
    }

    pub fn contains(&self, id: &str) -> ScoringResult<bool> {
        Ok(self.handle(id)?.is_some())
    }

    pub fn len(&self) -> ScoringResult<usize> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| ScoringError::LockPoisoned("profile map".to_string()))?;
        Ok(profiles.len())
    }

    pub fn is_empty(&self) -> ScoringResult<bool> {
        Ok(self.len()? == 0)
    }

    fn handle(&self, id: &str) -> ScoringResult<Option<ProfileHandle>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| ScoringError::LockPoisoned("profile map".to_string()))?;
        Ok(profiles.get(id).cloned())
    }
}
