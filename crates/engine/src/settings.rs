//! System-wide settings storage.
//!
//! Settings are stored as string key/value pairs and parsed by typed
//! accessors at read time, so the schema never changes when a new knob is
//! added. The two retry-relevant keys are [`KEY_RETRY_LIMIT_ENABLED`] and
//! [`KEY_MAX_RETRIES`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether retry limits are enforced at all. Default: `true`.
pub const KEY_RETRY_LIMIT_ENABLED: &str = "transcription.retry_limit_enabled";

/// Maximum retry attempts per file. Default: `3`; `0` means unlimited.
pub const KEY_MAX_RETRIES: &str = "transcription.max_retries";

/// A single system setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    /// Unique, namespaced key (e.g. `transcription.max_retries`).
    pub key: String,
    /// Raw stored value; parse via the typed accessors.
    pub value: String,
    /// Free-text explanation for admin surfaces. Never interpreted.
    pub description: Option<String>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    /// Parse the value as a bool. `None` when malformed.
    pub fn as_bool(&self) -> Option<bool> {
        match self.value.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Parse the value as an unsigned integer. `None` when malformed
    /// (including negative numbers).
    pub fn as_u32(&self) -> Option<u32> {
        self.value.trim().parse().ok()
    }
}

/// Settings store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("setting key must be non-empty")]
    EmptyKey,
    #[error("settings storage unavailable: {0}")]
    Unavailable(String),
}

/// Settings store abstraction.
///
/// The batch operations are the torn-read/torn-write seam: `get_many` reads
/// all keys under one consistent view, `set_many` writes all pairs as one
/// atomic unit. A database-backed implementation maps them onto a single
/// transaction.
pub trait SettingsStore: Send + Sync {
    /// Get a setting by key. `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<Setting>, SettingsError>;

    /// Create or overwrite a setting. Overwrites keep the description and
    /// bump `updated_at`. Idempotent.
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    /// Get several settings under one consistent view, in key order.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Setting>>, SettingsError>;

    /// Create or overwrite several settings as one atomic unit.
    fn set_many(&self, pairs: &[(&str, String)]) -> Result<(), SettingsError>;
}

/// In-memory settings store for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: RwLock<HashMap<String, Setting>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn upsert(settings: &mut HashMap<String, Setting>, key: &str, value: &str) {
        let now = Utc::now();
        settings
            .entry(key.to_string())
            .and_modify(|s| {
                s.value = value.to_string();
                s.updated_at = now;
            })
            .or_insert_with(|| Setting {
                key: key.to_string(),
                value: value.to_string(),
                description: None,
                updated_at: now,
            });
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let settings = self.settings.read().unwrap();
        Ok(settings.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::EmptyKey);
        }
        let mut settings = self.settings.write().unwrap();
        Self::upsert(&mut settings, key, value);
        Ok(())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Setting>>, SettingsError> {
        let settings = self.settings.read().unwrap();
        Ok(keys.iter().map(|k| settings.get(*k).cloned()).collect())
    }

    fn set_many(&self, pairs: &[(&str, String)]) -> Result<(), SettingsError> {
        if pairs.iter().any(|(k, _)| k.is_empty()) {
            return Err(SettingsError::EmptyKey);
        }
        // Single write-lock acquisition makes the whole batch atomic.
        let mut settings = self.settings.write().unwrap();
        for (key, value) in pairs {
            Self::upsert(&mut settings, key, value);
        }
        Ok(())
    }
}

impl SettingsStore for Arc<InMemorySettingsStore> {
    fn get(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        (**self).set(key, value)
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Setting>>, SettingsError> {
        (**self).get_many(keys)
    }

    fn set_many(&self, pairs: &[(&str, String)]) -> Result<(), SettingsError> {
        (**self).set_many(pairs)
    }
}
