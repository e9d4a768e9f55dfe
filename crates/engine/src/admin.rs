//! Privileged admin operations: policy updates and counter resets.
//!
//! Authorization happens upstream; by the time these are called the caller
//! is already known to be privileged.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use retrygate_core::{ActorId, FileId};

use crate::admission::{decide, AdmissionDecision};
use crate::counter::AttemptStore;
use crate::error::RetryResult;
use crate::policy::{PolicyUpdate, PolicyView, RetryPolicySnapshot};

/// State returned to the caller after a counter reset, ready to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub file_id: FileId,
    pub attempt_count: u32,
    /// Recomputed against the current policy (non-privileged view, since the
    /// point of a reset is to let ordinary retries through again).
    pub decision: AdmissionDecision,
}

/// Privileged mutations over the retry engine's state.
pub struct RetryAdmin {
    policy: Arc<PolicyView>,
    counters: Arc<dyn AttemptStore>,
}

impl RetryAdmin {
    pub fn new(policy: Arc<PolicyView>, counters: Arc<dyn AttemptStore>) -> Self {
        Self { policy, counters }
    }

    /// Reset a file's attempt counter to 0 and report the resulting state.
    ///
    /// Succeeds even when the count is already 0.
    pub fn reset_counter(&self, actor: ActorId, file_id: FileId) -> RetryResult<ResetOutcome> {
        self.counters.reset(file_id)?;
        let policy = self.policy.current()?;
        let decision = decide(&policy, 0, false);

        info!(%actor, %file_id, "retry counter reset");
        Ok(ResetOutcome {
            file_id,
            attempt_count: 0,
            decision,
        })
    }

    /// Apply a partial policy update; returns the new full snapshot.
    ///
    /// Concurrent updates from two admins resolve last-write-wins per call.
    pub fn update_policy(
        &self,
        actor: ActorId,
        update: PolicyUpdate,
    ) -> RetryResult<RetryPolicySnapshot> {
        match self.policy.update(update) {
            Ok(snapshot) => {
                info!(
                    %actor,
                    enabled = snapshot.enabled,
                    max_attempts = snapshot.max_attempts,
                    "retry policy updated"
                );
                Ok(snapshot)
            }
            Err(err) => {
                warn!(%actor, error = %err, "retry policy update rejected");
                Err(err)
            }
        }
    }
}
