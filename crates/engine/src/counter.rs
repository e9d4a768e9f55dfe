//! Per-file retry attempt counters.
//!
//! The counter is the only field of the file record this engine touches.
//! Mutations on one file serialize on that file's lock; different files
//! never contend (no global counter lock).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use retrygate_core::{Entity, FileId};

/// Retry state owned by a file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCounter {
    pub file_id: FileId,
    /// Attempts already consumed. Starts at 0, +1 per consumed retry,
    /// reset to 0 only by an explicit privileged reset — never by policy
    /// changes.
    pub attempt_count: u32,
    pub updated_at: DateTime<Utc>,
}

impl FileCounter {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            attempt_count: 0,
            updated_at: Utc::now(),
        }
    }
}

impl Entity for FileCounter {
    type Id = FileId;

    fn id(&self) -> &Self::Id {
        &self.file_id
    }
}

/// Counter store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CounterError {
    /// No retry state tracked for this file. Distinct from a count of 0.
    #[error("no retry state for file {0}")]
    NotFound(FileId),
    #[error("counter storage unavailable: {0}")]
    Unavailable(String),
}

/// Attempt counter abstraction.
///
/// `increment` must be linearizable with respect to concurrent `increment`/
/// `reset` calls on the same file id: two concurrent callers must never both
/// observe count N and both write N+1.
pub trait AttemptStore: Send + Sync {
    /// Register retry state for a newly created file, at count 0.
    /// Idempotent: an already-tracked file keeps its accumulated count.
    fn create(&self, file_id: FileId) -> Result<(), CounterError>;

    /// Current attempt count.
    fn read(&self, file_id: FileId) -> Result<u32, CounterError>;

    /// Consume one attempt; returns the new count.
    fn increment(&self, file_id: FileId) -> Result<u32, CounterError>;

    /// Set the count unconditionally to 0. Idempotent.
    fn reset(&self, file_id: FileId) -> Result<(), CounterError>;
}

/// In-memory attempt store: a lock table keyed by file id.
///
/// The outer `RwLock` only guards the table structure; each counter sits
/// behind its own `Mutex`, taken after the table lock is released. No lock
/// here is ever held across a settings-store call, so no ordering cycle can
/// form.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    counters: RwLock<HashMap<FileId, Arc<Mutex<FileCounter>>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn entry(&self, file_id: FileId) -> Result<Arc<Mutex<FileCounter>>, CounterError> {
        let counters = self.counters.read().unwrap();
        counters
            .get(&file_id)
            .cloned()
            .ok_or(CounterError::NotFound(file_id))
    }
}

impl AttemptStore for InMemoryAttemptStore {
    fn create(&self, file_id: FileId) -> Result<(), CounterError> {
        let mut counters = self.counters.write().unwrap();
        counters
            .entry(file_id)
            .or_insert_with(|| Arc::new(Mutex::new(FileCounter::new(file_id))));
        Ok(())
    }

    fn read(&self, file_id: FileId) -> Result<u32, CounterError> {
        let entry = self.entry(file_id)?;
        let counter = entry.lock().unwrap();
        Ok(counter.attempt_count)
    }

    fn increment(&self, file_id: FileId) -> Result<u32, CounterError> {
        let entry = self.entry(file_id)?;
        let mut counter = entry.lock().unwrap();
        counter.attempt_count += 1;
        counter.updated_at = Utc::now();
        Ok(counter.attempt_count)
    }

    fn reset(&self, file_id: FileId) -> Result<(), CounterError> {
        let entry = self.entry(file_id)?;
        let mut counter = entry.lock().unwrap();
        counter.attempt_count = 0;
        counter.updated_at = Utc::now();
        Ok(())
    }
}

impl AttemptStore for Arc<InMemoryAttemptStore> {
    fn create(&self, file_id: FileId) -> Result<(), CounterError> {
        (**self).create(file_id)
    }

    fn read(&self, file_id: FileId) -> Result<u32, CounterError> {
        (**self).read(file_id)
    }

    fn increment(&self, file_id: FileId) -> Result<u32, CounterError> {
        (**self).increment(file_id)
    }

    fn reset(&self, file_id: FileId) -> Result<(), CounterError> {
        (**self).reset(file_id)
    }
}
