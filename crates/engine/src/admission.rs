//! Admission decision: may this file's job be retried right now?

use serde::{Deserialize, Serialize};

use crate::policy::RetryPolicySnapshot;

/// Why an admission decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionReason {
    /// Under the limit (or privileged bypass).
    Allowed,
    /// The attempt count has reached the configured limit.
    LimitReached,
    /// Limits are disabled, or the limit is 0 (unlimited).
    LimitsDisabled,
}

impl core::fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            AdmissionReason::Allowed => "retry allowed",
            AdmissionReason::LimitReached => "retry limit reached",
            AdmissionReason::LimitsDisabled => "retry limits disabled",
        };
        f.write_str(s)
    }
}

/// Verdict for a single retry attempt. Computed fresh per request, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub admitted: bool,
    pub reason: AdmissionReason,
    /// The limit in force when the decision was made (the policy's
    /// `max_attempts`), so callers can render "N of M" without a second
    /// policy read.
    pub effective_limit: u32,
}

/// Decide whether a retry may be admitted.
///
/// Pure and deterministic: mutating the counter after an admitted verdict is
/// the caller's separate step, so other validation can run between "may
/// retry" and "has retried" without double-charging the counter.
///
/// Privileged callers always pass — a deliberate escape valve, threaded in
/// as an explicit capability flag so the retry math stays free of
/// authorization concerns.
pub fn decide(
    policy: &RetryPolicySnapshot,
    current_count: u32,
    privileged: bool,
) -> AdmissionDecision {
    if privileged {
        return AdmissionDecision {
            admitted: true,
            reason: AdmissionReason::Allowed,
            effective_limit: policy.max_attempts,
        };
    }

    if !policy.limits_active() {
        return AdmissionDecision {
            admitted: true,
            reason: AdmissionReason::LimitsDisabled,
            effective_limit: policy.max_attempts,
        };
    }

    if current_count >= policy.max_attempts {
        return AdmissionDecision {
            admitted: false,
            reason: AdmissionReason::LimitReached,
            effective_limit: policy.max_attempts,
        };
    }

    AdmissionDecision {
        admitted: true,
        reason: AdmissionReason::Allowed,
        effective_limit: policy.max_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(enabled: bool, max_attempts: u32) -> RetryPolicySnapshot {
        RetryPolicySnapshot {
            enabled,
            max_attempts,
        }
    }

    #[test]
    fn under_the_limit_is_allowed() {
        let decision = decide(&policy(true, 3), 2, false);
        assert!(decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::Allowed);
        assert_eq!(decision.effective_limit, 3);
    }

    #[test]
    fn at_the_limit_is_denied() {
        let decision = decide(&policy(true, 3), 3, false);
        assert!(!decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::LimitReached);
        assert_eq!(decision.effective_limit, 3);
    }

    #[test]
    fn disabled_limits_admit_any_count() {
        let decision = decide(&policy(false, 3), 100, false);
        assert!(decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::LimitsDisabled);
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let decision = decide(&policy(true, 0), 50, false);
        assert!(decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::LimitsDisabled);
    }

    #[test]
    fn privileged_bypasses_a_reached_limit() {
        let decision = decide(&policy(true, 3), 3, true);
        assert!(decision.admitted);
        assert_eq!(decision.reason, AdmissionReason::Allowed);
    }

    #[test]
    fn reason_serializes_snake_case() {
        let value = serde_json::to_value(AdmissionReason::LimitReached).unwrap();
        assert_eq!(value, serde_json::json!("limit_reached"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: with limits enabled, admission is exactly
            /// `max == 0 || count < max`.
            #[test]
            fn admission_matches_the_limit_predicate(
                max_attempts in 0u32..=99,
                count in 0u32..=200,
            ) {
                let decision = decide(&policy(true, max_attempts), count, false);
                let expected = max_attempts == 0 || count < max_attempts;
                prop_assert_eq!(decision.admitted, expected);
                if !decision.admitted {
                    prop_assert_eq!(decision.reason, AdmissionReason::LimitReached);
                    prop_assert_eq!(decision.effective_limit, max_attempts);
                }
            }

            /// Property: privileged callers are always admitted.
            #[test]
            fn privileged_is_always_admitted(
                enabled in proptest::bool::ANY,
                max_attempts in 0u32..=99,
                count in 0u32..=200,
            ) {
                let decision = decide(&policy(enabled, max_attempts), count, true);
                prop_assert!(decision.admitted);
                prop_assert_eq!(decision.reason, AdmissionReason::Allowed);
            }

            /// Property: deciding is deterministic — same inputs, same verdict.
            #[test]
            fn decide_is_deterministic(
                enabled in proptest::bool::ANY,
                max_attempts in 0u32..=99,
                count in 0u32..=200,
                privileged in proptest::bool::ANY,
            ) {
                let p = policy(enabled, max_attempts);
                prop_assert_eq!(
                    decide(&p, count, privileged),
                    decide(&p, count, privileged)
                );
            }
        }
    }
}
