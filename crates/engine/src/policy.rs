//! System-wide retry policy: a typed, cached view over the settings store.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{RetryError, RetryResult};
use crate::settings::{Setting, SettingsStore, KEY_MAX_RETRIES, KEY_RETRY_LIMIT_ENABLED};

/// Default for [`KEY_RETRY_LIMIT_ENABLED`] when absent or malformed.
pub const DEFAULT_ENABLED: bool = true;

/// Default for [`KEY_MAX_RETRIES`] when absent or malformed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound accepted by [`PolicyView::update`].
pub const MAX_ATTEMPTS_CEILING: u32 = 99;

/// How long a cached snapshot may be served before re-reading the store.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Point-in-time view of the retry policy. Derived, never persisted.
///
/// `max_attempts == 0` means "unlimited" and is equivalent to
/// `enabled == false` for admission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicySnapshot {
    pub enabled: bool,
    pub max_attempts: u32,
}

impl Default for RetryPolicySnapshot {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicySnapshot {
    /// True when the policy actually constrains retries.
    pub fn limits_active(&self) -> bool {
        self.enabled && self.max_attempts > 0
    }
}

/// Partial policy update: only the provided fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyUpdate {
    pub enabled: Option<bool>,
    pub max_attempts: Option<u32>,
}

impl PolicyUpdate {
    pub fn enabled(value: bool) -> Self {
        Self {
            enabled: Some(value),
            ..Self::default()
        }
    }

    pub fn max_attempts(value: u32) -> Self {
        Self {
            max_attempts: Some(value),
            ..Self::default()
        }
    }
}

struct CachedSnapshot {
    snapshot: RetryPolicySnapshot,
    fetched_at: Instant,
}

/// Staleness-bounded, typed view of the two retry-relevant settings keys.
///
/// Readers are served a cached snapshot until it is older than the TTL, then
/// the view re-reads both keys under one consistent store view. An update
/// through this view refreshes its cache immediately, so a caller always
/// reads its own writes.
pub struct PolicyView {
    store: Arc<dyn SettingsStore>,
    cache: Mutex<Option<CachedSnapshot>>,
    ttl: Duration,
}

impl PolicyView {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_ttl(store, DEFAULT_CACHE_TTL)
    }

    /// A TTL of zero disables caching entirely (every read hits the store).
    pub fn with_ttl(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
            ttl,
        }
    }

    /// Current policy snapshot, at most `ttl` stale.
    pub fn current(&self) -> RetryResult<RetryPolicySnapshot> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.snapshot);
            }
        }

        let snapshot = self.load()?;
        *cache = Some(CachedSnapshot {
            snapshot,
            fetched_at: Instant::now(),
        });
        Ok(snapshot)
    }

    /// Apply a partial update and return the resulting full snapshot.
    ///
    /// Validates `max_attempts` against `[0, MAX_ATTEMPTS_CEILING]` before
    /// touching storage; a rejection leaves the stored policy unchanged.
    /// Both keys are written as one atomic unit, so concurrent readers never
    /// observe a half-applied update. Concurrent updates resolve
    /// last-write-wins at the granularity of a single call.
    pub fn update(&self, update: PolicyUpdate) -> RetryResult<RetryPolicySnapshot> {
        if let Some(max_attempts) = update.max_attempts {
            if max_attempts > MAX_ATTEMPTS_CEILING {
                return Err(RetryError::InvalidPolicyValue {
                    field: "max_attempts",
                    value: i64::from(max_attempts),
                    min: 0,
                    max: MAX_ATTEMPTS_CEILING,
                });
            }
        }

        // Hold the cache lock across read-merge-write so two updates through
        // this view cannot interleave between load and set_many.
        let mut cache = self.cache.lock().unwrap();
        let base = self.load()?;
        let next = RetryPolicySnapshot {
            enabled: update.enabled.unwrap_or(base.enabled),
            max_attempts: update.max_attempts.unwrap_or(base.max_attempts),
        };

        self.store.set_many(&[
            (KEY_RETRY_LIMIT_ENABLED, next.enabled.to_string()),
            (KEY_MAX_RETRIES, next.max_attempts.to_string()),
        ])?;

        *cache = Some(CachedSnapshot {
            snapshot: next,
            fetched_at: Instant::now(),
        });
        Ok(next)
    }

    fn load(&self) -> RetryResult<RetryPolicySnapshot> {
        let batch = self
            .store
            .get_many(&[KEY_RETRY_LIMIT_ENABLED, KEY_MAX_RETRIES])?;

        let enabled = batch[0]
            .as_ref()
            .and_then(Setting::as_bool)
            .unwrap_or(DEFAULT_ENABLED);
        // Stored values beyond the ceiling count as malformed: the snapshot
        // invariant must hold regardless of raw storage contents.
        let max_attempts = batch[1]
            .as_ref()
            .and_then(Setting::as_u32)
            .filter(|m| *m <= MAX_ATTEMPTS_CEILING)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);

        Ok(RetryPolicySnapshot {
            enabled,
            max_attempts,
        })
    }
}
