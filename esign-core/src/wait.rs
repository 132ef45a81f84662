//! Cancellable "wait until" primitive used for dependency polling.
//!
//! The sleeper is injected so the same loop runs on browser timers, on a
//! native runtime, or instantly in tests.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ConsoleConfig;

/// Shared flag that stops a pending wait at its next check.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Ready,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl WaitPolicy {
    /// Dependency polling policy from the console config.
    pub fn dependency(config: &ConsoleConfig) -> Self {
        Self {
            interval: Duration::from_millis(u64::from(config.dependency_poll_interval_ms.max(1))),
            timeout: Duration::from_millis(u64::from(config.dependency_timeout_ms)),
        }
    }
}

/// Polls `probe` every `policy.interval` until it holds, the timeout
/// elapses or `cancel` fires. Elapsed time is counted in intervals slept.
pub async fn wait_until<P, S, F>(
    policy: WaitPolicy,
    cancel: &CancelToken,
    mut probe: P,
    mut sleep: S,
) -> WaitOutcome
where
    P: FnMut() -> bool,
    S: FnMut(Duration) -> F,
    F: Future<Output = ()>,
{
    let mut waited = Duration::ZERO;
    loop {
        if cancel.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        if probe() {
            return WaitOutcome::Ready;
        }
        if waited >= policy.timeout {
            tracing::warn!(waited_ms = waited.as_millis() as u64, "wait timed out");
            return WaitOutcome::TimedOut;
        }
        sleep(policy.interval).await;
        waited += policy.interval;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::executor::block_on;
    use futures::future::ready;

    use super::*;

    fn policy() -> WaitPolicy {
        WaitPolicy::dependency(&ConsoleConfig::default())
    }

    #[test]
    fn resolves_once_probe_holds() {
        let checks = Cell::new(0);
        let outcome = block_on(wait_until(
            policy(),
            &CancelToken::new(),
            || {
                checks.set(checks.get() + 1);
                checks.get() == 4
            },
            |_| ready(()),
        ));
        assert_eq!(outcome, WaitOutcome::Ready);
        assert_eq!(checks.get(), 4);
    }

    #[test]
    fn times_out_after_budget() {
        let sleeps = Cell::new(0u32);
        let outcome = block_on(wait_until(
            policy(),
            &CancelToken::new(),
            || false,
            |_| {
                sleeps.set(sleeps.get() + 1);
                ready(())
            },
        ));
        assert_eq!(outcome, WaitOutcome::TimedOut);
        // 10s at 200ms intervals.
        assert_eq!(sleeps.get(), 50);
    }

    #[test]
    fn cancellation_stops_the_wait() {
        let cancel = CancelToken::new();
        let sleeps = Cell::new(0u32);
        let outcome = block_on(wait_until(
            policy(),
            &cancel,
            || false,
            |_| {
                sleeps.set(sleeps.get() + 1);
                if sleeps.get() == 3 {
                    cancel.cancel();
                }
                ready(())
            },
        ));
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(sleeps.get(), 3);
    }
}
