//! Fixed-period tick scheduler.
//!
//! [`start`] spawns a timer task that awaits `tick()` once per period. The
//! first firing happens one full period after start. Ticks run inline on the
//! timer task, so a slow tick delays the timer instead of overlapping with the
//! next one; firings missed in the meantime are skipped, not queued.
//!
//! ```text
//!   start ──period──▶ tick ──period──▶ tick ──(slow tick, missed firing skipped)──▶ tick
//!                                                                  stop ──▶ task exits
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to a running timer task.
///
/// Dropping the handle cancels the timer without waiting for it.
pub struct SchedulerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Start calling `tick` every `period`, first after one full period.
///
/// Must be called from within a tokio runtime. `period` must be non-zero.
pub fn start<F, Fut>(period: Duration, mut tick: F) -> SchedulerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    tracing::debug!("tick cancelled mid-flight");
                    break;
                }
                _ = tick() => {}
            }

            let elapsed = started.elapsed();
            if elapsed > period {
                tracing::debug!(?elapsed, ?period, "tick overran its period, skipping missed firings");
            }
        }
        tracing::debug!("scheduler stopped");
    });

    tracing::debug!(?period, "scheduler started");
    SchedulerHandle {
        token,
        task: Some(task),
    }
}

impl SchedulerHandle {
    /// Stop the timer and wait for its task to exit.
    ///
    /// Once this returns no further tick runs. Calling it again is a no-op.
    pub async fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "scheduler task panicked");
                }
            }
        }
    }

    /// True until [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        self.task.is_some() && !self.token.is_cancelled()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
