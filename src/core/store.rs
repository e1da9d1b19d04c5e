use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::{HealthError, Result};
use super::profile::UserProfile;

pub type Profiles = BTreeMap<String, UserProfile>;

/// Single JSON file mapping username to profile.
///
/// Every mutation reloads the whole file, applies the change and rewrites
/// it. The mutex serialises load-mutate-save within one process; separate
/// processes sharing the file still race and the last writer wins.
pub struct ProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole mapping. A missing or blank file is an empty mapping.
    pub fn load(&self) -> Result<Profiles> {
        if !self.path.exists() {
            return Ok(Profiles::new());
        }

        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Profiles::new());
        }

        Ok(serde_json::from_str(&data)?)
    }

    /// Overwrite the file with `profiles`.
    pub fn save(&self, profiles: &Profiles) -> Result<()> {
        let json = serde_json::to_string_pretty(profiles)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), profiles = profiles.len(), "profile store written");
        Ok(())
    }

    pub fn get(&self, username: &str) -> Result<Option<UserProfile>> {
        let username = normalize_username(username)?;
        Ok(self.load()?.remove(&username))
    }

    /// Fetch a profile, creating and persisting an empty one on first login.
    pub fn get_or_create(&self, username: &str) -> Result<UserProfile> {
        let username = normalize_username(username)?;
        let _guard = self.lock.lock().map_err(|_| HealthError::LockPoisoned)?;

        let mut profiles = self.load()?;
        if let Some(profile) = profiles.get(&username) {
            return Ok(profile.clone());
        }

        let profile = UserProfile::new();
        profiles.insert(username.clone(), profile.clone());
        self.save(&profiles)?;
        tracing::info!(user = %username, "created profile");
        Ok(profile)
    }

    /// Apply `mutate` to one profile and persist the result.
    pub fn update<F>(&self, username: &str, mutate: F) -> Result<UserProfile>
    where
        F: FnOnce(&mut UserProfile),
    {
        let username = normalize_username(username)?;
        let _guard = self.lock.lock().map_err(|_| HealthError::LockPoisoned)?;

        let mut profiles = self.load()?;
        let profile = profiles.entry(username).or_default();
        mutate(profile);
        let updated = profile.clone();
        self.save(&profiles)?;
        Ok(updated)
    }

    pub fn usernames(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

/// Usernames are trimmed; blank ones are rejected.
pub fn normalize_username(username: &str) -> Result<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(HealthError::InvalidUsername(username.to_string()));
    }
    Ok(trimmed.to_string())
}
