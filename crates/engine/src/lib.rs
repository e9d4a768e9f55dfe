//! `retrygate-engine` — the retry-policy engine.
//!
//! Governs whether a previously-failed processing job for a file may be
//! retried, and lets a privileged caller override that decision. The engine
//! combines a per-file attempt counter with a mutable, system-wide policy
//! (enabled/disabled, maximum attempts) into an admission decision. It never
//! dispatches work itself: callers ask for a verdict via
//! [`RetryService::decide_admission`] and charge the counter with
//! [`RetryService::consume_attempt`] only once dispatch actually happened.

pub mod admin;
pub mod admission;
pub mod counter;
pub mod error;
pub mod policy;
pub mod service;
pub mod settings;

#[cfg(test)]
mod integration_tests;

pub use admin::{ResetOutcome, RetryAdmin};
pub use admission::{decide, AdmissionDecision, AdmissionReason};
pub use counter::{AttemptStore, CounterError, FileCounter, InMemoryAttemptStore};
pub use error::{RetryError, RetryResult};
pub use policy::{PolicyUpdate, PolicyView, RetryPolicySnapshot};
pub use service::RetryService;
pub use settings::{InMemorySettingsStore, Setting, SettingsError, SettingsStore};
