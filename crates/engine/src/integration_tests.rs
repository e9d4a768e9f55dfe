//! Integration tests for the full retry-admission flow.
//!
//! Tests: settings store → policy view → admission → counter, plus the
//! privileged admin surface, the way a reprocessing workflow drives them.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use retrygate_core::{ActorId, FileId};

    use crate::admission::AdmissionReason;
    use crate::counter::{AttemptStore, InMemoryAttemptStore};
    use crate::policy::{PolicyUpdate, PolicyView};
    use crate::service::RetryService;
    use crate::settings::InMemorySettingsStore;

    fn setup() -> (Arc<InMemoryAttemptStore>, RetryService) {
        retrygate_observability::init();
        let settings = InMemorySettingsStore::arc();
        let counters = InMemoryAttemptStore::arc();
        let policy = Arc::new(PolicyView::with_ttl(settings, Duration::ZERO));
        let service = RetryService::with_policy_view(policy, counters.clone());
        (counters, service)
    }

    #[test]
    fn reprocessing_workflow_end_to_end() {
        let (counters, service) = setup();
        let admin = ActorId::new();
        let file_id = FileId::new();
        counters.create(file_id).unwrap();

        // Tighten the limit to 2, then burn through it.
        service
            .admin()
            .update_policy(admin, PolicyUpdate::max_attempts(2))
            .unwrap();

        for attempt in 1..=2 {
            let decision = service.decide_admission(file_id, false).unwrap();
            assert!(decision.admitted);
            assert_eq!(service.consume_attempt(file_id).unwrap(), attempt);
        }

        let denied = service.decide_admission(file_id, false).unwrap();
        assert!(!denied.admitted);
        assert_eq!(denied.reason, AdmissionReason::LimitReached);
        assert_eq!(denied.effective_limit, 2);

        // A support admin unblocks the file without touching the policy.
        let outcome = service.admin().reset_counter(admin, file_id).unwrap();
        assert_eq!(outcome.attempt_count, 0);
        assert!(service.decide_admission(file_id, false).unwrap().admitted);

        // And the global limit is still 2.
        assert_eq!(service.current_policy().unwrap().max_attempts, 2);
    }

    #[test]
    fn concurrent_workflows_never_undercount_consumed_attempts() {
        let (counters, service) = setup();
        let service = Arc::new(service);
        let file_id = FileId::new();
        counters.create(file_id).unwrap();

        // Unlimited retries so every consume goes through.
        service
            .admin()
            .update_policy(ActorId::new(), PolicyUpdate::max_attempts(0))
            .unwrap();

        let threads: u32 = 4;
        let per_thread: u32 = 50;
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let service = service.clone();
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        let decision = service.decide_admission(file_id, false).unwrap();
                        assert!(decision.admitted);
                        service.consume_attempt(file_id).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.read(file_id).unwrap(), threads * per_thread);
    }

    #[test]
    fn admins_racing_on_policy_leave_a_coherent_snapshot() {
        let (_counters, service) = setup();
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || {
                    let update = if i % 2 == 0 {
                        PolicyUpdate::max_attempts(i)
                    } else {
                        PolicyUpdate::enabled(i % 4 == 1)
                    };
                    service.admin().update_policy(ActorId::new(), update).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Last write wins per call; whatever won, the snapshot is readable
        // and in range.
        let snapshot = service.current_policy().unwrap();
        assert!(snapshot.max_attempts <= 99);
    }
}
