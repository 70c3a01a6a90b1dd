//! Cancellable periodic task.
//!
//! `every(period, callback)` spawns a loop on the current tokio runtime that
//! awaits `callback` once per tick. The callback finishes before the next
//! tick is taken, and missed ticks are skipped rather than bunched up.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct TaskHandle {
    token: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Request cancellation and wait for the loop to exit. A tick already in
    /// progress runs to completion.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!("Scheduled task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
            && self.join.as_ref().map(|j| !j.is_finished()).unwrap_or(false)
    }

    /// Token that trips when this task is cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `callback` every `period`, first run after one full period.
pub fn every<F, Fut>(period: Duration, mut callback: F) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let child = token.clone();

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = child.cancelled() => break,
                _ = ticker.tick() => callback().await,
            }
        }
    });

    TaskHandle {
        token,
        join: Some(join),
    }
}
