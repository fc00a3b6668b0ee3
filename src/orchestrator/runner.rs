//! PhaseOrchestrator: sequential phase runner with retry and criticality

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::errors::OrchestrationError;
use super::phase::{Phase, PhaseImplementation, PhaseImplementations, PhaseValue};
use super::retry::{AttemptResult, Delay, PhaseState, RetryPolicy, TokioDelay, Transition};
use super::state::{generate_session_id, OrchestrationState, PhaseOutcome};
use crate::validation::panic_message;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Retries after the first failed attempt
    pub retry_attempts: u32,
    /// Backoff unit in milliseconds
    pub base_delay_ms: u64,
    /// Cumulative budget per phase, retries included
    pub phase_timeout_ms: Option<u64>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            base_delay_ms: 1000,
            phase_timeout_ms: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            phase_timeout: self.phase_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Terminal result of driving one phase
struct PhaseRun {
    state: PhaseState,
    value: Option<PhaseValue>,
    last_error: Option<String>,
    attempts: u32,
    duration: Duration,
}

/// Executes phases in priority order
pub struct PhaseOrchestrator {
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl PhaseOrchestrator {
    /// Create orchestrator sleeping on the tokio timer between retries
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_delay(policy, Arc::new(TokioDelay))
    }

    /// Create orchestrator with a custom backoff wait
    pub fn with_delay(policy: RetryPolicy, delay: Arc<dyn Delay>) -> Self {
        Self { policy, delay }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute phases under a freshly generated session id
    pub async fn execute(
        &self,
        phases: &[Phase],
        enabled: &HashSet<String>,
        implementations: &PhaseImplementations,
    ) -> Result<OrchestrationState, OrchestrationError> {
        self.execute_in_session(generate_session_id(), phases, enabled, implementations)
            .await
    }

    /// Execute phases under a caller-supplied session id
    ///
    /// Returns the final state unless a critical phase exhausts its retries,
    /// in which case the error carries the state up to the abort.
    pub async fn execute_in_session(
        &self,
        session_id: impl Into<String>,
        phases: &[Phase],
        enabled: &HashSet<String>,
        implementations: &PhaseImplementations,
    ) -> Result<OrchestrationState, OrchestrationError> {
        let ordered = order_phases(phases)?;

        // Contract check up front so no phase runs against a broken wiring
        for phase in &ordered {
            if enabled.contains(&phase.id) && !implementations.contains(&phase.id) {
                return Err(OrchestrationError::MissingImplementation(phase.id.clone()));
            }
        }

        let mut state = OrchestrationState::new(session_id);
        info!(
            session = %state.session_id,
            phases = ordered.len(),
            enabled = enabled.len(),
            "orchestration started"
        );

        for phase in ordered {
            let initial = PhaseState::start(enabled.contains(&phase.id));
            if initial == PhaseState::Skipped {
                debug!(phase = %phase.id, "phase skipped");
                state.skip(&phase.id);
                continue;
            }

            let implementation = implementations
                .get(&phase.id)
                .ok_or_else(|| OrchestrationError::MissingImplementation(phase.id.clone()))?;

            info!(phase = %phase.id, critical = phase.is_critical, "phase running");
            let run = self.run_phase(phase, implementation.as_ref(), initial).await;
            let duration_ms = run.duration.as_millis() as u64;

            match run.state {
                PhaseState::Succeeded { retry_count } => {
                    info!(phase = %phase.id, retry_count, duration_ms, "phase succeeded");
                    state.record(PhaseOutcome::succeeded(
                        &phase.id,
                        run.value.unwrap_or(PhaseValue::Null),
                        duration_ms,
                        retry_count,
                    ));
                }
                other => {
                    let retry_count = other.retry_count();
                    let last_error = run
                        .last_error
                        .unwrap_or_else(|| "phase failed".to_string());
                    state.record(PhaseOutcome::failed(
                        &phase.id,
                        last_error.clone(),
                        duration_ms,
                        retry_count,
                        run.attempts,
                    ));

                    if phase.is_critical {
                        error!(
                            phase = %phase.id,
                            attempts = run.attempts,
                            error = %last_error,
                            "critical phase failed, aborting run"
                        );
                        state.finish();
                        return Err(OrchestrationError::CriticalPhaseFailed {
                            phase_id: phase.id.clone(),
                            last_error,
                            state: Box::new(state),
                        });
                    }

                    warn!(
                        phase = %phase.id,
                        attempts = run.attempts,
                        error = %last_error,
                        "phase failed after retries, continuing"
                    );
                }
            }
        }

        state.finish();
        info!(
            session = %state.session_id,
            completed = state.completed_phases.len(),
            failed = state.failed_phases.len(),
            skipped = state.skipped_phases.len(),
            "orchestration finished"
        );
        Ok(state)
    }

    /// Drive one phase from RUNNING to a terminal state
    async fn run_phase(
        &self,
        phase: &Phase,
        implementation: &dyn PhaseImplementation,
        mut state: PhaseState,
    ) -> PhaseRun {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            debug!(phase = %phase.id, attempt = attempts, "invoking implementation");

            let attempt = match self.policy.remaining(started.elapsed()) {
                Some(remaining) => match tokio::time::timeout(remaining, invoke(implementation)).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(e)) => Err((e, self.policy.budget_exceeded(started.elapsed()))),
                    Err(_) => Err((anyhow::anyhow!(timeout_message(&self.policy)), true)),
                },
                None => invoke(implementation).await.map_err(|e| (e, false)),
            };

            let (result, message) = match attempt {
                Ok(value) => {
                    return PhaseRun {
                        state: finished(self.policy.advance(state, AttemptResult::Succeeded)),
                        value: Some(value),
                        last_error: None,
                        attempts,
                        duration: started.elapsed(),
                    };
                }
                Err((err, timed_out)) => {
                    let message = format!("{:#}", err);
                    warn!(phase = %phase.id, attempt = attempts, error = %message, "attempt failed");
                    if timed_out {
                        (AttemptResult::TimedOut, message)
                    } else {
                        (AttemptResult::Failed, message)
                    }
                }
            };

            match self.policy.advance(state, result) {
                Transition::Retry { state: next, delay } => {
                    debug!(
                        phase = %phase.id,
                        retry_count = next.retry_count(),
                        delay_ms = delay.as_millis() as u64,
                        "backing off"
                    );
                    let waited = match self.policy.remaining(started.elapsed()) {
                        Some(remaining) => tokio::time::timeout(remaining, self.delay.wait(delay))
                            .await
                            .is_ok(),
                        None => {
                            self.delay.wait(delay).await;
                            true
                        }
                    };

                    if !waited || self.policy.budget_exceeded(started.elapsed()) {
                        warn!(phase = %phase.id, "phase budget exhausted during backoff");
                        return PhaseRun {
                            state: finished(self.policy.advance(next, AttemptResult::TimedOut)),
                            value: None,
                            last_error: Some(timeout_message(&self.policy)),
                            attempts,
                            duration: started.elapsed(),
                        };
                    }
                    state = next;
                }
                Transition::Finished(terminal) => {
                    return PhaseRun {
                        state: terminal,
                        value: None,
                        last_error: Some(message),
                        attempts,
                        duration: started.elapsed(),
                    };
                }
            }
        }
    }
}

/// Invoke an implementation once; a panic counts as a failed attempt
async fn invoke(implementation: &dyn PhaseImplementation) -> anyhow::Result<PhaseValue> {
    match AssertUnwindSafe(implementation.run()).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!(
            "phase panicked: {}",
            panic_message(payload.as_ref())
        )),
    }
}

fn finished(transition: Transition) -> PhaseState {
    match transition {
        Transition::Finished(state) => state,
        Transition::Retry { state, .. } => state,
    }
}

fn timeout_message(policy: &RetryPolicy) -> String {
    match policy.phase_timeout {
        Some(t) => format!("phase timed out after {}ms", t.as_millis()),
        None => "phase timed out".to_string(),
    }
}

/// Stable sort by priority; declaration order breaks ties
fn order_phases(phases: &[Phase]) -> Result<Vec<&Phase>, OrchestrationError> {
    let mut seen = HashSet::new();
    for phase in phases {
        if !seen.insert(phase.id.as_str()) {
            return Err(OrchestrationError::DuplicatePhase(phase.id.clone()));
        }
    }

    let mut ordered: Vec<&Phase> = phases.iter().collect();
    ordered.sort_by_key(|p| p.priority_order);
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records requested delays without sleeping
    #[derive(Default)]
    struct RecordingDelay {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn wait(&self, duration: Duration) {
            self.waits.lock().expect("lock").push(duration);
        }
    }

    fn counting_failure(counter: Arc<AtomicUsize>) -> impl PhaseImplementation {
        move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<PhaseValue, _>(anyhow::anyhow!("always fails"))
            }
        }
    }

    fn orchestrator(retries: u32) -> (PhaseOrchestrator, Arc<RecordingDelay>) {
        let delay = Arc::new(RecordingDelay::default());
        let policy = RetryPolicy::new(retries, Duration::from_millis(10));
        (PhaseOrchestrator::with_delay(policy, delay.clone()), delay)
    }

    fn enabled(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_critical_failure_aborts_after_retries() {
        let (orchestrator, delay) = orchestrator(2);
        let a_calls = Arc::new(AtomicUsize::new(0));
        let b_calls = Arc::new(AtomicUsize::new(0));
        let b_counter = Arc::clone(&b_calls);

        let phases = vec![
            Phase::new("A", "A", 1).critical(),
            Phase::new("B", "B", 2).critical(),
        ];
        let implementations = PhaseImplementations::new()
            .register("A", counting_failure(Arc::clone(&a_calls)))
            .register("B", move || {
                let counter = Arc::clone(&b_counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, anyhow::Error>(PhaseValue::Null)
                }
            });

        let err = orchestrator
            .execute(&phases, &enabled(&["A", "B"]), &implementations)
            .await
            .expect_err("critical phase should abort");

        assert_eq!(a_calls.load(Ordering::SeqCst), 3);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            *delay.waits.lock().expect("lock"),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );

        match err {
            OrchestrationError::CriticalPhaseFailed { phase_id, last_error, state } => {
                assert_eq!(phase_id, "A");
                assert!(last_error.contains("always fails"));
                assert_eq!(state.failed_phases, vec!["A"]);
                assert!(state.completed_phases.is_empty());
                assert!(state.skipped_phases.is_empty());
                assert_eq!(state.outcome("A").map(|o| o.attempts), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// Panics on every invocation
    struct Explodes(Arc<AtomicUsize>);

    #[async_trait]
    impl PhaseImplementation for Explodes {
        async fn run(&self) -> anyhow::Result<PhaseValue> {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("phase blew up")
        }
    }

    #[tokio::test]
    async fn test_panicking_phase_keeps_orchestration_state() {
        let (orchestrator, delay) = orchestrator(1);
        let calls = Arc::new(AtomicUsize::new(0));

        let phases = vec![
            Phase::new("a", "A", 1),
            Phase::new("b", "B", 2).critical(),
            Phase::new("c", "C", 3),
        ];
        let implementations = PhaseImplementations::new()
            .register("a", || async { Ok::<_, anyhow::Error>(PhaseValue::Bool(true)) })
            .register("b", Explodes(Arc::clone(&calls)))
            .register("c", || async { Ok::<_, anyhow::Error>(PhaseValue::Null) });

        let handle = tokio::spawn(async move {
            orchestrator
                .execute(&phases, &enabled(&["a", "b", "c"]), &implementations)
                .await
        });
        let err = handle
            .await
            .expect("orchestration task should not panic")
            .expect_err("critical panicking phase should abort");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(delay.waits.lock().expect("lock").len(), 1);
        match err {
            OrchestrationError::CriticalPhaseFailed { phase_id, last_error, state } => {
                assert_eq!(phase_id, "b");
                assert!(last_error.contains("phase blew up"));
                assert_eq!(state.completed_phases, vec!["a"]);
                assert_eq!(state.failed_phases, vec!["b"]);
                assert_eq!(
                    state.outcome("a").and_then(|o| o.result.clone()),
                    Some(PhaseValue::Bool(true))
                );
                assert!(state.outcome("c").is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_critical_panicking_phase_is_recorded_as_failed() {
        let (orchestrator, _) = orchestrator(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let phases = vec![Phase::new("b", "B", 1), Phase::new("c", "C", 2)];
        let implementations = PhaseImplementations::new()
            .register("b", Explodes(Arc::clone(&calls)))
            .register("c", || async { Ok::<_, anyhow::Error>(PhaseValue::Null) });

        let state = orchestrator
            .execute(&phases, &enabled(&["b", "c"]), &implementations)
            .await
            .expect("non-critical panic should not abort");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.failed_phases, vec!["b"]);
        assert_eq!(state.completed_phases, vec!["c"]);
        let b = state.outcome("b").expect("b outcome");
        assert_eq!(b.error.as_deref(), Some("phase panicked: phase blew up"));
        assert_eq!(b.attempts, 1);
    }

    #[tokio::test]
    async fn test_non_critical_failure_continues() {
        let (orchestrator, _) = orchestrator(1);
        let a_calls = Arc::new(AtomicUsize::new(0));

        let phases = vec![Phase::new("A", "A", 1), Phase::new("B", "B", 2)];
        let implementations = PhaseImplementations::new()
            .register("A", counting_failure(Arc::clone(&a_calls)))
            .register("B", || async { Ok::<_, anyhow::Error>(serde_json::json!("done")) });

        let state = orchestrator
            .execute(&phases, &enabled(&["A", "B"]), &implementations)
            .await
            .expect("non-critical failure should not abort");

        assert_eq!(a_calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.failed_phases, vec!["A"]);
        assert_eq!(state.completed_phases, vec!["B"]);
        let a = state.outcome("A").expect("A outcome");
        assert!(!a.success);
        assert_eq!(a.retry_count, 2);
        assert_eq!(state.outcome("B").and_then(|o| o.result.clone()), Some(serde_json::json!("done")));
        assert!(state.end_time.is_some());
    }

    #[tokio::test]
    async fn test_success_after_retry_records_retry_count() {
        let (orchestrator, delay) = orchestrator(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let phases = vec![Phase::new("flaky", "Flaky", 1).critical()];
        let implementations = PhaseImplementations::new().register("flaky", move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    anyhow::bail!("transient");
                }
                Ok(PhaseValue::Bool(true))
            }
        });

        let state = orchestrator
            .execute(&phases, &enabled(&["flaky"]), &implementations)
            .await
            .expect("should recover");

        let outcome = state.outcome("flaky").expect("outcome");
        assert!(outcome.success);
        assert_eq!(outcome.retry_count, 2);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(delay.waits.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_phases_are_skipped_in_priority_order() {
        let (orchestrator, _) = orchestrator(0);
        let phases = vec![
            Phase::new("late", "Late", 30),
            Phase::new("early", "Early", 10),
            Phase::new("middle", "Middle", 20),
        ];
        let implementations = PhaseImplementations::new()
            .register("middle", || async { Ok::<_, anyhow::Error>(PhaseValue::Null) });

        let state = orchestrator
            .execute(&phases, &enabled(&["middle"]), &implementations)
            .await
            .expect("should run");

        assert_eq!(state.skipped_phases, vec!["early", "late"]);
        assert_eq!(state.completed_phases, vec!["middle"]);
        assert!(state.outcome("early").is_none());
    }

    #[tokio::test]
    async fn test_execution_follows_priority_not_declaration() {
        let (orchestrator, _) = orchestrator(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        let recorder = |name: &'static str| {
            let order = Arc::clone(&order);
            move || {
                let order = Arc::clone(&order);
                async move {
                    order.lock().expect("lock").push(name);
                    Ok::<_, anyhow::Error>(PhaseValue::Null)
                }
            }
        };

        let phases = vec![
            Phase::new("c", "C", 3),
            Phase::new("a", "A", 1),
            Phase::new("b", "B", 2),
        ];
        let implementations = PhaseImplementations::new()
            .register("a", recorder("a"))
            .register("b", recorder("b"))
            .register("c", recorder("c"));

        let state = orchestrator
            .execute(&phases, &enabled(&["a", "b", "c"]), &implementations)
            .await
            .expect("should run");

        assert_eq!(*order.lock().expect("lock"), vec!["a", "b", "c"]);
        assert_eq!(state.execution_order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_missing_implementation_detected_before_running() {
        let (orchestrator, _) = orchestrator(0);
        let calls = Arc::new(AtomicUsize::new(0));

        let phases = vec![Phase::new("a", "A", 1), Phase::new("b", "B", 2)];
        let implementations =
            PhaseImplementations::new().register("a", counting_failure(Arc::clone(&calls)));

        let err = orchestrator
            .execute(&phases, &enabled(&["a", "b"]), &implementations)
            .await
            .expect_err("missing implementation");

        assert!(matches!(err, OrchestrationError::MissingImplementation(ref id) if id == "b"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_duplicate_phase_rejected() {
        let (orchestrator, _) = orchestrator(0);
        let phases = vec![Phase::new("a", "A", 1), Phase::new("a", "A again", 2)];

        let err = orchestrator
            .execute(&phases, &enabled(&[]), &PhaseImplementations::new())
            .await
            .expect_err("duplicate ids");
        assert!(matches!(err, OrchestrationError::DuplicatePhase(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_timeout_overrides_retry_budget() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let policy = RetryPolicy::new(10, Duration::from_millis(10))
            .with_phase_timeout(Duration::from_millis(100));
        let orchestrator = PhaseOrchestrator::new(policy);

        let phases = vec![Phase::new("slow", "Slow", 1)];
        let implementations = PhaseImplementations::new().register("slow", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, anyhow::Error>(PhaseValue::Null)
            }
        });

        let state = orchestrator
            .execute(&phases, &enabled(&["slow"]), &implementations)
            .await
            .expect("non-critical timeout should not abort");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.failed_phases, vec!["slow"]);
        let outcome = state.outcome("slow").expect("outcome");
        assert!(outcome.error.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[test]
    fn test_config_policy() {
        let config = OrchestratorConfig {
            retry_attempts: 4,
            base_delay_ms: 250,
            phase_timeout_ms: Some(3000),
        };
        let policy = config.policy();
        assert_eq!(policy.retry_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.phase_timeout, Some(Duration::from_secs(3)));
    }
}
