//! Audit lifecycle state container.
//!
//! The lifecycle is a pure transition function over events; the
//! `Orchestrator` wraps it with single-writer mutation and notifies a
//! rendering layer through a watch channel. Rendering code only ever
//! holds receivers, so state can't be mutated from outside the flow.
//!
//! Every submission gets a fresh generation tag. Resolutions carry the
//! tag they were issued under, and a resolution whose tag no longer
//! matches the current one is ignored, so a stale or duplicate network
//! response can never overwrite the outcome of a newer submission.

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::guidance::AuditFailure;
use crate::domain::models::AuditReport;

// ============================================================================
// PHASE & STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditPhase {
    Idle,
    Loading,
    Success,
    Error,
}

impl AuditPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditPhase::Idle => "idle",
            AuditPhase::Loading => "loading",
            AuditPhase::Success => "success",
            AuditPhase::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditState {
    pub phase: AuditPhase,
    /// Present iff `phase == Success`
    pub report: Option<AuditReport>,
    /// Present iff `phase == Error`
    pub failure: Option<AuditFailure>,
    /// Last submitted values, kept across transitions for retry/display
    pub pending_url: String,
    pub pending_email: String,
    /// Tag of the in-flight request; resolutions carrying an older tag
    /// are ignored
    pub generation: u64,
}

impl AuditState {
    pub fn idle() -> Self {
        Self {
            phase: AuditPhase::Idle,
            report: None,
            failure: None,
            pending_url: String::new(),
            pending_email: String::new(),
            generation: 0,
        }
    }
}

impl Default for AuditState {
    fn default() -> Self {
        Self::idle()
    }
}

// ============================================================================
// EVENTS & TRANSITION
// ============================================================================

#[derive(Debug, Clone)]
pub enum AuditEvent {
    Submit { url: String, email: String },
    ResolveSuccess { generation: u64, report: AuditReport },
    ResolveError { generation: u64, failure: AuditFailure },
    Retry,
    Reset,
}

/// Pure transition. Events that are invalid in the current phase, or that
/// carry a superseded generation, leave the state unchanged.
pub fn transition(state: &AuditState, event: AuditEvent) -> AuditState {
    match event {
        AuditEvent::Submit { url, email } => AuditState {
            phase: AuditPhase::Loading,
            report: None,
            failure: None,
            pending_url: url,
            pending_email: email,
            generation: state.generation + 1,
        },

        AuditEvent::ResolveSuccess { generation, report } => {
            if state.phase != AuditPhase::Loading || generation != state.generation {
                return state.clone();
            }
            AuditState {
                phase: AuditPhase::Success,
                report: Some(report),
                failure: None,
                ..state.clone()
            }
        }

        AuditEvent::ResolveError { generation, failure } => {
            if state.phase != AuditPhase::Loading || generation != state.generation {
                return state.clone();
            }
            AuditState {
                phase: AuditPhase::Error,
                report: None,
                failure: Some(failure),
                ..state.clone()
            }
        }

        AuditEvent::Retry => {
            if state.phase != AuditPhase::Error {
                return state.clone();
            }
            AuditState {
                phase: AuditPhase::Loading,
                report: None,
                failure: None,
                generation: state.generation + 1,
                ..state.clone()
            }
        }

        AuditEvent::Reset => AuditState {
            phase: AuditPhase::Idle,
            report: None,
            failure: None,
            // bump so anything still in flight resolves into the void
            generation: state.generation + 1,
            ..state.clone()
        },
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Single-writer container around the audit lifecycle.
pub struct Orchestrator {
    tx: watch::Sender<AuditState>,
}

impl Orchestrator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuditState::idle());
        Self { tx }
    }

    /// Subscribe to state snapshots. Receivers observe every transition.
    pub fn subscribe(&self) -> watch::Receiver<AuditState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AuditState {
        self.tx.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    /// Apply one event. Subscribers are only notified when the event
    /// actually changed the state.
    fn apply(&self, event: AuditEvent) -> (AuditState, bool) {
        let mut snapshot = AuditState::idle();
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            let next = transition(state, event);
            applied = next != *state;
            if applied {
                *state = next;
            }
            snapshot = state.clone();
            applied
        });
        (snapshot, applied)
    }

    /// Enter `Loading` for a new submission, clearing any prior outcome.
    /// Returns the generation tag the flow must resolve with.
    pub fn submit(&self, url: impl Into<String>, email: impl Into<String>) -> u64 {
        let (state, _) =
            self.apply(AuditEvent::Submit { url: url.into(), email: email.into() });
        state.generation
    }

    /// Store a fetched report. Returns false if the resolution was stale
    /// and ignored.
    pub fn resolve_success(&self, generation: u64, report: AuditReport) -> bool {
        let (_, applied) = self.apply(AuditEvent::ResolveSuccess { generation, report });
        if !applied {
            debug!(generation, "ignoring stale success resolution");
        }
        applied
    }

    /// Record a classified failure. Returns false if stale and ignored.
    pub fn resolve_error(&self, generation: u64, failure: AuditFailure) -> bool {
        let (_, applied) = self.apply(AuditEvent::ResolveError { generation, failure });
        if !applied {
            debug!(generation, "ignoring stale error resolution");
        }
        applied
    }

    /// Re-enter `Loading` with the pending values. Returns the new
    /// generation, or None when there is no failure to retry from.
    pub fn retry(&self) -> Option<u64> {
        let (state, applied) = self.apply(AuditEvent::Retry);
        applied.then_some(state.generation)
    }

    /// Back to `Idle`, dropping any outcome and invalidating in-flight work.
    pub fn reset(&self) {
        let _ = self.apply(AuditEvent::Reset);
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::guidance::ErrorKind;
    use crate::test_utils::fixtures;

    fn failure() -> AuditFailure {
        AuditFailure::new(ErrorKind::ServerError, "boom")
    }

    #[test]
    fn submit_enters_loading_and_clears_previous_outcome() {
        let orch = Orchestrator::new();

        let gen1 = orch.submit("https://a.com", "a@x.co");
        orch.resolve_success(gen1, fixtures::sample_report());
        assert_eq!(orch.snapshot().phase, AuditPhase::Success);

        let gen2 = orch.submit("https://b.com", "b@x.co");
        let state = orch.snapshot();
        assert_eq!(state.phase, AuditPhase::Loading);
        assert!(state.report.is_none());
        assert!(state.failure.is_none());
        assert_eq!(state.pending_url, "https://b.com");
        assert_eq!(state.pending_email, "b@x.co");
        assert!(gen2 > gen1);
    }

    #[test]
    fn resolutions_require_loading_phase() {
        let orch = Orchestrator::new();
        let gen = orch.generation();

        assert!(!orch.resolve_success(gen, fixtures::sample_report()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Idle);

        assert!(!orch.resolve_error(gen, failure()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Idle);
    }

    #[test]
    fn second_resolution_for_the_same_submission_is_ignored() {
        let orch = Orchestrator::new();
        let gen = orch.submit("https://a.com", "a@x.co");

        assert!(orch.resolve_success(gen, fixtures::sample_report()));
        // duplicates arriving after the success must not win
        assert!(!orch.resolve_error(gen, failure()));
        assert!(!orch.resolve_success(gen, fixtures::sample_report()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Success);
    }

    #[test]
    fn stale_generation_never_mutates_current_state() {
        let orch = Orchestrator::new();
        let stale = orch.submit("https://a.com", "a@x.co");
        let current = orch.submit("https://b.com", "b@x.co");

        assert!(!orch.resolve_success(stale, fixtures::sample_report()));
        let state = orch.snapshot();
        assert_eq!(state.phase, AuditPhase::Loading);
        assert!(state.report.is_none());

        assert!(!orch.resolve_error(stale, failure()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Loading);

        assert!(orch.resolve_success(current, fixtures::sample_report()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Success);
    }

    #[test]
    fn retry_reissues_pending_values_under_a_new_generation() {
        let orch = Orchestrator::new();
        let gen = orch.submit("https://a.com", "a@x.co");
        orch.resolve_error(gen, failure());

        let retry_gen = orch.retry().expect("retry from Error");
        assert!(retry_gen > gen);

        let state = orch.snapshot();
        assert_eq!(state.phase, AuditPhase::Loading);
        assert!(state.failure.is_none());
        assert_eq!(state.pending_url, "https://a.com");
        assert_eq!(state.pending_email, "a@x.co");
    }

    #[test]
    fn retry_is_rejected_outside_error() {
        let orch = Orchestrator::new();
        assert!(orch.retry().is_none());

        orch.submit("https://a.com", "a@x.co");
        assert!(orch.retry().is_none());
        assert_eq!(orch.snapshot().phase, AuditPhase::Loading);
    }

    #[test]
    fn reset_returns_to_idle_and_invalidates_in_flight_work() {
        let orch = Orchestrator::new();
        let gen = orch.submit("https://a.com", "a@x.co");
        orch.reset();

        let state = orch.snapshot();
        assert_eq!(state.phase, AuditPhase::Idle);
        assert!(state.report.is_none());
        assert!(state.failure.is_none());

        // the response for the pre-reset submission arrives late
        assert!(!orch.resolve_success(gen, fixtures::sample_report()));
        assert_eq!(orch.snapshot().phase, AuditPhase::Idle);
    }

    #[test]
    fn subscribers_observe_transitions() {
        let orch = Orchestrator::new();
        let mut rx = orch.subscribe();
        assert!(!rx.has_changed().unwrap());

        orch.submit("https://a.com", "a@x.co");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, AuditPhase::Loading);
    }

    #[test]
    fn ignored_events_do_not_notify_subscribers() {
        let orch = Orchestrator::new();
        let stale = orch.submit("https://a.com", "a@x.co");
        orch.submit("https://b.com", "b@x.co");

        let mut rx = orch.subscribe();
        orch.resolve_success(stale, fixtures::sample_report());
        orch.resolve_error(stale, failure());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn transition_is_pure() {
        let state = AuditState::idle();
        let next = transition(
            &state,
            AuditEvent::Submit { url: "https://a.com".into(), email: "a@x.co".into() },
        );
        assert_eq!(state.phase, AuditPhase::Idle);
        assert_eq!(next.phase, AuditPhase::Loading);
        assert_eq!(next.generation, state.generation + 1);
    }
}
