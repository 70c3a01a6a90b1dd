//! Price loop — asks the feed for an update on a fixed interval and swaps the
//! result into the board.
//!
//! Per tick:
//!   connected = platforms connected in the current session (empty if logged out)
//!   snapshot  = copy of the board's items (read lock released before polling)
//!   update    = feed.poll(snapshot, connected)
//!   board     = update, if any (write lock)
//!
//! The whole tick runs under `tick_lock`, so a scheduled tick and a manual
//! `/tick` never read the same snapshot.
//!
//! Feed failures are logged and the tick is dropped; the loop keeps going.

use std::time::Duration;

use anyhow::Result;
use pricewatch_core::schedule;
use pricewatch_core::PriceUpdateEvent;
use tokio::sync::broadcast;

use crate::state::SharedState;

/// Report from one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub connected_platforms: usize,
    pub events: Vec<PriceUpdateEvent>,
    pub elapsed_ms: u64,
}

impl TickReport {
    pub fn updated(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Run exactly one tick against the shared state.
pub async fn run_price_tick(state: &SharedState) -> Result<TickReport> {
    let _tick = state.tick_lock.lock().await;
    let start = std::time::Instant::now();
    let connected = state.sessions.connected_platforms();
    let mut report = TickReport {
        connected_platforms: connected.len(),
        ..Default::default()
    };

    if connected.is_empty() {
        tracing::debug!("Price tick skipped: no connected platforms");
        return Ok(report);
    }

    let snapshot = state.board.read().await.items().to_vec();
    let update = state.feed.poll(&snapshot, &connected).await?;

    if let Some(update) = update {
        report.events = update.events.clone();
        state.board.write().await.apply(update);
        for event in &report.events {
            tracing::info!(
                item = %event.item_id,
                platform = %event.platform,
                old = event.old_price,
                new = event.new_price,
                discount = event.discount_code.as_deref().unwrap_or("-"),
                "Price updated"
            );
        }
    }

    report.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

/// Drive `run_price_tick` every `simulator.interval_seconds` until shutdown.
pub async fn run_price_loop(state: SharedState, mut shutdown: broadcast::Receiver<()>) {
    let interval = Duration::from_secs(state.config.simulator.interval_seconds.max(1));

    tracing::info!(
        "Price loop started (interval: {}s, feed: {})",
        interval.as_secs(),
        state.feed.name()
    );

    let tick_state = state.clone();
    let handle = schedule::every(interval, move || {
        let state = tick_state.clone();
        async move {
            if let Err(e) = run_price_tick(&state).await {
                tracing::warn!("Price tick failed (non-fatal): {}", e);
            }
        }
    });

    let _ = shutdown.recv().await;
    tracing::info!("Price loop shutting down");
    handle.stop().await;
}
