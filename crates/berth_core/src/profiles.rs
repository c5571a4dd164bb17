//! Profile management: creation, activation, and safe deletion.

use tracing::debug;

use crate::boxes::BoxHandle;
use crate::error::{StoreError, StoreResult};
use crate::models::{Profile, SettingRecord};
use crate::record::BoxRecord;
use crate::settings::{keys, SettingValue};
use crate::types::BoxKey;

fn active_profile_key() -> BoxKey {
    BoxKey::text(keys::ACTIVE_PROFILE.name())
}

/// Manages the profiles box and the active-profile setting together.
///
/// Exactly one profile is active at a time, tracked by the
/// `active_profile` setting; the empty string means none. Deletion of
/// the active profile reassigns the setting in the same critical
/// section, so no reader ever observes an active name with no backing
/// profile.
#[derive(Clone)]
pub struct ProfileManager {
    profiles: BoxHandle<Profile>,
    settings: BoxHandle<SettingRecord>,
}

impl ProfileManager {
    pub(crate) fn new(
        profiles: BoxHandle<Profile>,
        settings: BoxHandle<SettingRecord>,
    ) -> Self {
        Self { profiles, settings }
    }

    /// Creates a profile keyed by its name.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::DuplicateName`] when a profile with the
    /// same name exists, or if the store is closed.
    pub fn create(&self, profile: Profile) -> StoreResult<()> {
        self.profiles.raw().ensure_open()?;
        let mut state = self.profiles.raw().lock_state();
        let key = BoxKey::text(&profile.name);
        if state.records.contains_key(&key) {
            return Err(StoreError::duplicate_name(&profile.name));
        }
        debug!(profile = %profile.name, "profile created");
        self.profiles
            .raw()
            .write_locked(&mut state, key, profile.to_fields())
    }

    /// Reads a profile by name.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn get(&self, name: &str) -> StoreResult<Option<Profile>> {
        self.profiles.read(&BoxKey::text(name))
    }

    /// Names of all profiles, sorted.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn list_names(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .profiles
            .read_all()?
            .into_iter()
            .filter_map(|(key, _)| key.as_text().map(str::to_string))
            .collect())
    }

    /// Makes the named profile active.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::NotFound`] when no such profile exists,
    /// or if the store is closed.
    pub fn set_active(&self, name: &str) -> StoreResult<()> {
        self.settings.raw().ensure_open()?;
        // Cross-box locks are taken in box-name order, profiles before
        // settings, matching export and restore.
        let profiles_state = self.profiles.raw().read_state();
        if !profiles_state.records.contains_key(&BoxKey::text(name)) {
            return Err(StoreError::not_found(name));
        }
        let mut settings_state = self.settings.raw().lock_state();
        debug!(profile = name, "profile activated");
        self.settings.raw().write_locked(
            &mut settings_state,
            active_profile_key(),
            SettingRecord::of_text(name).to_fields(),
        )
    }

    /// The active profile, or `None` when no profile is active.
    ///
    /// Re-checks that the named profile exists; a dangling active name
    /// reads as `None` rather than an error.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn current(&self) -> StoreResult<Option<Profile>> {
        let active = self
            .settings
            .read(&active_profile_key())?
            .and_then(|record| String::from_record(&record))
            .unwrap_or_else(|| keys::ACTIVE_PROFILE.default_value());
        if active == keys::NO_ACTIVE_PROFILE {
            return Ok(None);
        }
        self.get(&active)
    }

    /// Deletes a profile. Returns whether it existed.
    ///
    /// When the deleted profile is the active one, the active-profile
    /// setting is reassigned in the same critical section: to the
    /// lexicographically first remaining profile, or to the no-profile
    /// sentinel when none remain.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed or a backend write fails.
    pub fn delete(&self, name: &str) -> StoreResult<bool> {
        self.profiles.raw().ensure_open()?;
        // Box-name lock order: profiles before settings.
        let mut profiles_state = self.profiles.raw().lock_state();
        let mut settings_state = self.settings.raw().lock_state();

        let key = BoxKey::text(name);
        if !profiles_state.records.contains_key(&key) {
            return Ok(false);
        }

        let active = settings_state
            .records
            .get(&active_profile_key())
            .map(SettingRecord::from_fields)
            .and_then(|record| record.text_value)
            .unwrap_or_else(|| keys::ACTIVE_PROFILE.default_value());

        if active == name {
            let replacement = profiles_state
                .records
                .keys()
                .filter_map(BoxKey::as_text)
                .find(|remaining| *remaining != name)
                .unwrap_or(keys::NO_ACTIVE_PROFILE)
                .to_string();
            debug!(
                deleted = name,
                reassigned = %replacement,
                "active profile reassigned"
            );
            self.settings.raw().write_locked(
                &mut settings_state,
                active_profile_key(),
                SettingRecord::of_text(replacement).to_fields(),
            )?;
        }

        self.profiles.raw().delete_locked(&mut profiles_state, &key)?;
        debug!(profile = name, "profile deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceConfig;
    use crate::store::Store;

    fn manager() -> (Store, ProfileManager) {
        let store = Store::open_in_memory().unwrap();
        let profiles = store.profiles().unwrap();
        (store, profiles)
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let (_store, profiles) = manager();

        profiles.create(Profile::new("prod")).unwrap();
        let result = profiles.create(Profile::new("prod"));
        assert!(matches!(result, Err(StoreError::DuplicateName { .. })));
    }

    #[test]
    fn list_names_is_sorted() {
        let (_store, profiles) = manager();

        profiles.create(Profile::new("zeta")).unwrap();
        profiles.create(Profile::new("alpha")).unwrap();

        assert_eq!(
            profiles.list_names().unwrap(),
            vec!["alpha", "default", "zeta"]
        );
    }

    #[test]
    fn set_active_unknown_profile_fails() {
        let (_store, profiles) = manager();

        let result = profiles.set_active("ghost");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn activation_round_trip() {
        let (_store, profiles) = manager();

        let mut prod = Profile::new("prod");
        prod.radarr = ServiceConfig {
            enabled: true,
            host: "http://r:7878".to_string(),
            api_key: "abc".to_string(),
            headers: Vec::new(),
        };
        profiles.create(prod.clone()).unwrap();
        profiles.set_active("prod").unwrap();

        assert_eq!(profiles.current().unwrap(), Some(prod));
    }

    #[test]
    fn deleting_active_profile_reassigns_to_first_remaining() {
        let (_store, profiles) = manager();

        profiles.create(Profile::new("alpha")).unwrap();
        profiles.create(Profile::new("beta")).unwrap();
        profiles.set_active("beta").unwrap();

        assert!(profiles.delete("beta").unwrap());

        // Lexicographically first remaining name wins.
        assert_eq!(profiles.current().unwrap().unwrap().name, "alpha");
    }

    #[test]
    fn deleting_last_profile_leaves_no_active() {
        let (store, profiles) = manager();

        assert!(profiles.delete("default").unwrap());

        assert_eq!(profiles.current().unwrap(), None);
        let settings = store.settings().unwrap();
        assert_eq!(
            settings.read(&keys::ACTIVE_PROFILE).unwrap(),
            keys::NO_ACTIVE_PROFILE
        );
    }

    #[test]
    fn deleting_inactive_profile_keeps_active() {
        let (_store, profiles) = manager();

        profiles.create(Profile::new("spare")).unwrap();
        profiles.set_active("default").unwrap();

        assert!(profiles.delete("spare").unwrap());
        assert_eq!(profiles.current().unwrap().unwrap().name, "default");
    }

    #[test]
    fn delete_missing_profile_is_not_an_error() {
        let (_store, profiles) = manager();
        assert!(!profiles.delete("ghost").unwrap());
    }

    #[test]
    fn export_runs_concurrently_with_profile_churn() {
        use std::sync::{mpsc, Arc};
        use std::thread;
        use std::time::Duration;

        let store = Arc::new(Store::open_in_memory().unwrap());

        let exporter = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    store.export().unwrap();
                }
            })
        };
        let churner = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let profiles = store.profiles().unwrap();
                for i in 0..200 {
                    let name = format!("p{i}");
                    profiles.create(Profile::new(name.clone())).unwrap();
                    profiles.set_active(&name).unwrap();
                    profiles.delete(&name).unwrap();
                }
            })
        };

        // Joined through a channel so a lock-order regression fails the
        // test instead of wedging it.
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            exporter.join().unwrap();
            churner.join().unwrap();
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(Duration::from_secs(60))
            .expect("export and profile churn threads did not finish");
    }
}
