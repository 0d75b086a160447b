//! Staged progress playback shown while an audit is in flight.
//!
//! Playback is purely time-driven and independent of network state. Steps
//! complete strictly in order, each running for its fixed duration, and
//! the terminal signal fires exactly once after the last step. The real
//! request's result is only joined after playback finishes, so the
//! user-visible sequence never depends on network latency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

// ============================================================================
// STEPS
// ============================================================================

/// One named step of the playback, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub id: &'static str,
    pub label: &'static str,
    pub duration_ms: u64,
}

impl ProgressStep {
    pub const fn new(id: &'static str, label: &'static str, duration_ms: u64) -> Self {
        Self { id, label, duration_ms }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Playlist shown during a live audit, ~19s total.
pub const DEFAULT_STEPS: &[ProgressStep] = &[
    ProgressStep::new("fetch", "Fetching page content", 1500),
    ProgressStep::new("meta", "Analyzing meta tags", 2000),
    ProgressStep::new("headings", "Checking heading structure", 2000),
    ProgressStep::new("content", "Evaluating content quality", 2500),
    ProgressStep::new("mobile", "Testing mobile friendliness", 2000),
    ProgressStep::new("speed", "Measuring page speed", 3000),
    ProgressStep::new("links", "Inspecting links and redirects", 2000),
    ProgressStep::new("security", "Reviewing security headers", 1500),
    ProgressStep::new("report", "Compiling your report", 2500),
];

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Observable playback position.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Index of the step currently running; equals the step count once
    /// playback is complete
    pub current_step: usize,
    /// Ids of finished steps, in completion order
    pub completed_ids: Vec<&'static str>,
    pub playback_complete: bool,
}

// ============================================================================
// SIMULATOR
// ============================================================================

/// Time-driven playback over a fixed step list.
pub struct ProgressSimulator {
    steps: &'static [ProgressStep],
    tx: watch::Sender<ProgressSnapshot>,
    cancel: CancellationToken,
    started: AtomicBool,
}

impl ProgressSimulator {
    pub fn new(steps: &'static [ProgressStep]) -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self { steps, tx, cancel: CancellationToken::new(), started: AtomicBool::new(false) }
    }

    pub fn steps(&self) -> &'static [ProgressStep] {
        self.steps
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Token that tears the playback down when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Begin playback. Idempotent: calling again while running (or after
    /// completion) is a no-op and never double-schedules timers.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        let sim = Arc::clone(self);
        Some(tokio::spawn(async move { sim.play().await }))
    }

    async fn play(&self) {
        for (idx, step) in self.steps.iter().enumerate() {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = sleep(step.duration()) => {}
            }
            self.tx.send_modify(|snap| {
                snap.completed_ids.push(step.id);
                snap.current_step = idx + 1;
            });
        }
        self.tx.send_modify(|snap| snap.playback_complete = true);
    }

    /// Resolve once playback completes, or immediately on teardown.
    pub async fn wait_complete(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if rx.borrow().playback_complete || self.cancel.is_cancelled() {
                return;
            }
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    /// Cancel all pending step timers. The snapshot is frozen afterwards.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STEPS: &[ProgressStep] =
        &[ProgressStep::new("a", "Step A", 100), ProgressStep::new("b", "Step B", 200)];

    #[test]
    fn default_playlist_shape() {
        assert_eq!(DEFAULT_STEPS.len(), 9);
        let total: u64 = DEFAULT_STEPS.iter().map(|s| s.duration_ms).sum();
        assert_eq!(total, 19_000);

        let mut ids: Vec<_> = DEFAULT_STEPS.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), DEFAULT_STEPS.len(), "step ids must be unique");
        assert!(DEFAULT_STEPS.iter().all(|s| s.duration_ms > 0));
    }

    #[tokio::test(start_paused = true)]
    async fn steps_complete_in_order_after_their_full_duration() {
        let sim = Arc::new(ProgressSimulator::new(TWO_STEPS));
        let started = tokio::time::Instant::now();

        let handle = sim.start().expect("first start schedules playback");
        sim.wait_complete().await;

        assert!(started.elapsed() >= Duration::from_millis(300));
        let snap = sim.subscribe().borrow().clone();
        assert_eq!(snap.completed_ids, vec!["a", "b"]);
        assert_eq!(snap.current_step, 2);
        assert!(snap.playback_complete);

        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn first_step_completes_before_second_begins() {
        let sim = Arc::new(ProgressSimulator::new(TWO_STEPS));
        sim.start();

        sleep(Duration::from_millis(150)).await;
        let snap = sim.subscribe().borrow().clone();
        assert_eq!(snap.completed_ids, vec!["a"]);
        assert_eq!(snap.current_step, 1);
        assert!(!snap.playback_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let sim = Arc::new(ProgressSimulator::new(TWO_STEPS));
        assert!(sim.start().is_some());
        assert!(sim.start().is_none(), "re-running start must not double-schedule");

        sim.wait_complete().await;
        assert!(sim.start().is_none(), "start after completion stays a no-op");

        let snap = sim.subscribe().borrow().clone();
        assert_eq!(snap.completed_ids, vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timers() {
        let sim = Arc::new(ProgressSimulator::new(TWO_STEPS));
        let handle = sim.start().unwrap();

        sleep(Duration::from_millis(150)).await;
        sim.shutdown();
        handle.await.unwrap();

        let frozen = sim.subscribe().borrow().clone();
        assert_eq!(frozen.completed_ids, vec!["a"]);

        // long after teardown, nothing has mutated
        sleep(Duration::from_secs(5)).await;
        let later = sim.subscribe().borrow().clone();
        assert_eq!(later, frozen);
        assert!(!later.playback_complete);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_complete_returns_on_teardown() {
        let sim = Arc::new(ProgressSimulator::new(TWO_STEPS));
        sim.start();

        let waiter = {
            let sim = Arc::clone(&sim);
            tokio::spawn(async move { sim.wait_complete().await })
        };

        sleep(Duration::from_millis(50)).await;
        sim.shutdown();
        waiter.await.expect("waiter resolves after shutdown");
    }
}
