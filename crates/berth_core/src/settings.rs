//! Typed settings over the settings box.
//!
//! The set of settings is closed: each one is a [`SettingKey`] constant
//! in [`keys`], carrying its name, default, and optional validator.
//! Reading a setting that was never written returns its default.

use crate::boxes::BoxHandle;
use crate::error::{StoreError, StoreResult};
use crate::models::SettingRecord;
use crate::types::BoxKey;

/// A value type a setting can hold.
///
/// Implementations pick one slot of [`SettingRecord`]; `from_record`
/// returns `None` when the stored record does not carry that slot, in
/// which case reads fall back to the key's default.
pub trait SettingValue: Sized {
    /// Projects the value into a setting record.
    fn to_record(&self) -> SettingRecord;
    /// Extracts the value from a setting record, if the matching slot
    /// is set.
    fn from_record(record: &SettingRecord) -> Option<Self>;
}

impl SettingValue for bool {
    fn to_record(&self) -> SettingRecord {
        SettingRecord::of_bool(*self)
    }

    fn from_record(record: &SettingRecord) -> Option<Self> {
        record.bool_value
    }
}

impl SettingValue for i64 {
    fn to_record(&self) -> SettingRecord {
        SettingRecord::of_integer(*self)
    }

    fn from_record(record: &SettingRecord) -> Option<Self> {
        record.integer_value
    }
}

impl SettingValue for String {
    fn to_record(&self) -> SettingRecord {
        SettingRecord::of_text(self.clone())
    }

    fn from_record(record: &SettingRecord) -> Option<Self> {
        record.text_value.clone()
    }
}

/// Declaration of one setting: name, default, optional validator.
///
/// Defaults and validators are plain function pointers so keys can be
/// `const` items.
pub struct SettingKey<T: SettingValue> {
    name: &'static str,
    default: fn() -> T,
    validator: Option<fn(&T) -> Result<(), String>>,
}

impl<T: SettingValue> SettingKey<T> {
    /// Declares a setting.
    #[must_use]
    pub const fn new(
        name: &'static str,
        default: fn() -> T,
        validator: Option<fn(&T) -> Result<(), String>>,
    ) -> Self {
        Self {
            name,
            default,
            validator,
        }
    }

    /// The setting's name, which is also its box key.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The setting's default value.
    #[must_use]
    pub fn default_value(&self) -> T {
        (self.default)()
    }

    fn validate(&self, value: &T) -> Result<(), String> {
        match self.validator {
            Some(validator) => validator(value),
            None => Ok(()),
        }
    }
}

/// The declared settings.
pub mod keys {
    use super::SettingKey;

    /// Value of [`ACTIVE_PROFILE`] when no profile is active.
    pub const NO_ACTIVE_PROFILE: &str = "";

    fn default_active_profile() -> String {
        "default".to_string()
    }

    /// Name of the active connection profile. The empty string means no
    /// profile is active.
    pub const ACTIVE_PROFILE: SettingKey<String> =
        SettingKey::new("active_profile", default_active_profile, None);

    fn default_theme() -> String {
        "night".to_string()
    }

    fn validate_theme(value: &String) -> Result<(), String> {
        match value.as_str() {
            "day" | "night" | "black" => Ok(()),
            other => Err(format!("unknown theme {other:?}, expected day, night, or black")),
        }
    }

    /// UI color theme.
    pub const THEME: SettingKey<String> =
        SettingKey::new("theme", default_theme, Some(validate_theme));

    fn default_false() -> bool {
        false
    }

    /// Whether timestamps render in 24-hour form.
    pub const USE_24_HOUR_TIME: SettingKey<bool> =
        SettingKey::new("use_24_hour_time", default_false, None);

    /// Whether quick-action shortcuts are shown.
    pub const QUICK_ACTIONS: SettingKey<bool> =
        SettingKey::new("quick_actions", default_false, None);

    fn default_max_log_count() -> i64 {
        500
    }

    fn validate_positive(value: &i64) -> Result<(), String> {
        if *value > 0 {
            Ok(())
        } else {
            Err(format!("must be positive, got {value}"))
        }
    }

    /// Upper bound on retained log entries. Consumed by the caller's
    /// log pruning; the store itself never prunes.
    pub const MAX_LOG_COUNT: SettingKey<i64> =
        SettingKey::new("max_log_count", default_max_log_count, Some(validate_positive));
}

/// Typed read/update surface over the settings box.
#[derive(Clone)]
pub struct Settings {
    handle: BoxHandle<SettingRecord>,
}

impl Settings {
    pub(crate) fn new(handle: BoxHandle<SettingRecord>) -> Self {
        Self { handle }
    }

    /// Reads a setting, falling back to its default when it was never
    /// written or its stored record does not carry the declared type.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn read<T: SettingValue>(&self, key: &SettingKey<T>) -> StoreResult<T> {
        let value = self
            .handle
            .read(&BoxKey::text(key.name()))?
            .and_then(|record| T::from_record(&record));
        Ok(value.unwrap_or_else(|| key.default_value()))
    }

    /// Validates and writes a setting. Durable when this returns.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::InvalidSettingValue`] when the value
    /// does not satisfy the key's validator, or if the store is closed.
    pub fn update<T: SettingValue>(&self, key: &SettingKey<T>, value: T) -> StoreResult<()> {
        key.validate(&value)
            .map_err(|message| StoreError::invalid_setting(key.name(), message))?;
        self.handle.write(key.name(), &value.to_record())
    }
}
