//! Service facade: the inbound boundary the reprocessing workflow calls.

use std::sync::Arc;

use tracing::debug;

use retrygate_core::FileId;

use crate::admin::RetryAdmin;
use crate::admission::{decide, AdmissionDecision};
use crate::counter::AttemptStore;
use crate::error::RetryResult;
use crate::policy::{PolicyView, RetryPolicySnapshot};
use crate::settings::SettingsStore;

/// The retry engine's public surface.
///
/// `decide_admission` and `consume_attempt` are deliberately two calls: the
/// workflow asks for a verdict before dispatch and charges the counter only
/// once dispatch actually happened, so a verdict that was never acted upon
/// never inflates the count.
pub struct RetryService {
    policy: Arc<PolicyView>,
    counters: Arc<dyn AttemptStore>,
    admin: RetryAdmin,
}

impl RetryService {
    pub fn new(settings: Arc<dyn SettingsStore>, counters: Arc<dyn AttemptStore>) -> Self {
        Self::with_policy_view(Arc::new(PolicyView::new(settings)), counters)
    }

    pub fn with_policy_view(policy: Arc<PolicyView>, counters: Arc<dyn AttemptStore>) -> Self {
        let admin = RetryAdmin::new(policy.clone(), counters.clone());
        Self {
            policy,
            counters,
            admin,
        }
    }

    /// Verdict for one retry attempt, computed fresh from the current policy
    /// and the file's counter.
    ///
    /// Storage unavailability propagates as an error: "couldn't read policy"
    /// is never interpreted as "limits disabled" or "limits reached".
    pub fn decide_admission(
        &self,
        file_id: FileId,
        privileged: bool,
    ) -> RetryResult<AdmissionDecision> {
        let policy = self.policy.current()?;
        let count = self.counters.read(file_id)?;
        let decision = decide(&policy, count, privileged);

        if !decision.admitted {
            debug!(
                %file_id,
                count,
                limit = decision.effective_limit,
                "retry denied"
            );
        }
        Ok(decision)
    }

    /// Current policy snapshot, for rendering by the host.
    pub fn current_policy(&self) -> RetryResult<RetryPolicySnapshot> {
        self.policy.current()
    }

    /// Charge one attempt against the file; returns the new count.
    ///
    /// Call only after dispatch was actually initiated.
    pub fn consume_attempt(&self, file_id: FileId) -> RetryResult<u32> {
        Ok(self.counters.increment(file_id)?)
    }

    /// The privileged surface (policy updates, counter resets).
    pub fn admin(&self) -> &RetryAdmin {
        &self.admin
    }
}
