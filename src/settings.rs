//! Persisted editor toggles.
//!
//! Nine named booleans, saved as one JSON object under `editorSettings` in
//! the host's key-value storage (browser `localStorage` in production). The
//! blob is read once at startup and rewritten after every change.
//!
//! Saved values are read with JavaScript truthiness (`1`, `"yes"` and
//! `true` all count as on) so blobs written by older clients still load. A
//! blob that does not parse, or that names a toggle this build does not
//! know, is treated as corrupt: it is removed from storage and the defaults
//! are used.
//!
//! Some toggles change the scene immediately. [`Settings::set`] reports that
//! as a [`SettingEffect`] for the engine to apply.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

/// Storage key of the settings blob.
pub const SETTINGS_KEY: &str = "editorSettings";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings blob is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown setting: {0}")]
    UnknownKey(String),
    #[error("settings storage failed: {0}")]
    Storage(String),
}

/// Host key-value storage (the browser's `localStorage` shape).
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;

    fn remove_item(&mut self, key: &str);
}

/// In-memory [`KeyValueStorage`] for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, like a full or blocked `localStorage`.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        if self.read_only {
            return Err(SettingsError::Storage(format!("cannot write {key}: storage is read-only")));
        }
        self.items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}

// =============================================================================
// Keys
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    ShowDeletion,
    ShowTooltips,
    DisableBackground,
    HideGround,
    ShowObjectInfo,
    DisableObjectOutline,
    HideDecoObjects,
    ShowDanger,
    HideMenu,
}

/// Scene change a toggle requires right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingEffect {
    Ground,
    DecoObjects,
    DangerObjects,
    SelectionOutline,
    Tooltips,
}

impl SettingKey {
    /// Every key, in menu order.
    pub const ALL: [Self; 9] = [
        Self::ShowDeletion,
        Self::ShowTooltips,
        Self::DisableBackground,
        Self::HideGround,
        Self::ShowObjectInfo,
        Self::DisableObjectOutline,
        Self::HideDecoObjects,
        Self::ShowDanger,
        Self::HideMenu,
    ];

    /// Name used in the saved blob.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ShowDeletion => "showDeletion",
            Self::ShowTooltips => "showTooltips",
            Self::DisableBackground => "disableBG",
            Self::HideGround => "hideGround",
            Self::ShowObjectInfo => "showObjInfo",
            Self::DisableObjectOutline => "disableObjectOutline",
            Self::HideDecoObjects => "hideDecoObjects",
            Self::ShowDanger => "showDanger",
            Self::HideMenu => "hideMenu",
        }
    }

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ShowDeletion => "Show who deleted an object",
            Self::ShowTooltips => "Show who placed an object",
            Self::DisableBackground => "Disable background colors",
            Self::HideGround => "Hide ground",
            Self::ShowObjectInfo => "Show object info on select",
            Self::DisableObjectOutline => "Hide selection outline",
            Self::HideDecoObjects => "Hide decoration objects",
            Self::ShowDanger => "Reveal dangerous objects",
            Self::HideMenu => "Hide menu",
        }
    }

    #[must_use]
    pub fn default_enabled(self) -> bool {
        matches!(self, Self::ShowDeletion | Self::ShowTooltips)
    }

    #[must_use]
    pub fn effect(self) -> Option<SettingEffect> {
        match self {
            Self::HideGround => Some(SettingEffect::Ground),
            Self::HideDecoObjects => Some(SettingEffect::DecoObjects),
            Self::ShowDanger => Some(SettingEffect::DangerObjects),
            Self::DisableObjectOutline => Some(SettingEffect::SelectionOutline),
            Self::ShowTooltips => Some(SettingEffect::Tooltips),
            Self::ShowDeletion | Self::DisableBackground | Self::ShowObjectInfo | Self::HideMenu => None,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_owned()))
    }
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<SettingKey, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self { values: SettingKey::ALL.into_iter().map(|key| (key, key.default_enabled())).collect() }
    }
}

impl Settings {
    /// Read the saved blob, falling back to defaults. A corrupt blob is
    /// removed from storage.
    pub fn load(storage: &mut impl KeyValueStorage) -> Self {
        let Some(raw) = storage.get_item(SETTINGS_KEY) else {
            return Self::default();
        };
        if raw.is_empty() {
            return Self::default();
        }
        match Self::parse(&raw) {
            Ok(settings) => {
                debug!("settings loaded");
                settings
            }
            Err(err) => {
                warn!(error = %err, "discarding corrupt settings");
                storage.remove_item(SETTINGS_KEY);
                Self::default()
            }
        }
    }

    /// Apply a saved blob on top of the defaults. Keys the blob omits keep
    /// their default.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not a JSON object or names an unknown
    /// setting.
    pub fn parse(raw: &str) -> Result<Self, SettingsError> {
        let saved: serde_json::Map<String, Value> = serde_json::from_str(raw)?;
        let mut settings = Self::default();
        for (name, value) in &saved {
            let key: SettingKey = name.parse()?;
            settings.values.insert(key, is_truthy(value));
        }
        Ok(settings)
    }

    /// The blob written to storage: every key with its current value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        let blob: BTreeMap<&str, bool> = self.values.iter().map(|(key, enabled)| (key.name(), *enabled)).collect();
        Ok(serde_json::to_string(&blob)?)
    }

    /// # Errors
    ///
    /// Returns an error if the storage rejects the write.
    pub fn save(&self, storage: &mut impl KeyValueStorage) -> Result<(), SettingsError> {
        storage.set_item(SETTINGS_KEY, &self.to_json()?)
    }

    #[must_use]
    pub fn get(&self, key: SettingKey) -> bool {
        self.values.get(&key).copied().unwrap_or_else(|| key.default_enabled())
    }

    /// Change one toggle and save. Returns the scene effect to apply, if the
    /// value changed and the toggle has one. A failed save is logged; the
    /// in-memory value still changes.
    pub fn set(&mut self, storage: &mut impl KeyValueStorage, key: SettingKey, enabled: bool) -> Option<SettingEffect> {
        let previous = self.values.insert(key, enabled);
        if let Err(err) = self.save(storage) {
            warn!(setting = %key, error = %err, "failed to save settings");
        }
        if previous == Some(enabled) {
            return None;
        }
        debug!(setting = %key, enabled, "setting changed");
        key.effect()
    }

    /// Flip one toggle and save.
    pub fn toggle(&mut self, storage: &mut impl KeyValueStorage, key: SettingKey) -> Option<SettingEffect> {
        let enabled = !self.get(key);
        self.set(storage, key, enabled)
    }

    /// `(key, label, enabled)` in menu order.
    pub fn entries(&self) -> impl Iterator<Item = (SettingKey, &'static str, bool)> + '_ {
        SettingKey::ALL.into_iter().map(|key| (key, key.label(), self.get(key)))
    }
}

/// JavaScript `!!value`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
