//! Cancellable repeating jobs for the periodic idle sweep
//!
//! Thin abstraction over the runtime's timer so the core never schedules
//! anything itself: it hands a callback and an interval to
//! [`spawn_repeating`] and keeps the returned handle. Cancelling (or simply
//! dropping) the handle stops the job, which makes cancel-exactly-once and
//! cancel-before-reschedule easy to enforce with `Option::take`.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Handle to a scheduled repeating job. Ownership of the handle is
/// ownership of the timer: dropping it stops the job.
#[derive(Debug)]
pub struct JobHandle {
    inner: JoinHandle<()>,
}

impl JobHandle {
    /// Stops the job. Consumes the handle, so a job cannot be cancelled
    /// twice.
    pub fn cancel(self) {
        self.inner.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.inner.abort();
    }
}

/// Runs `job` every `period` on the tokio runtime until the returned handle
/// is cancelled or dropped.
///
/// The interval's immediate first tick is skipped so the job first runs one
/// full period after scheduling, and missed ticks are skipped rather than
/// bursted if the loop falls behind.
pub fn spawn_repeating<F>(period: Duration, mut job: F) -> JobHandle
where
    F: FnMut() + Send + 'static,
{
    let inner = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            job();
        }
    });
    JobHandle { inner }
}
