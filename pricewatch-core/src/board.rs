//! Price board: the current menu snapshot plus the capped history of recent
//! price updates. Snapshots are replaced whole, never patched in place.

use std::collections::VecDeque;

use serde::Serialize;

use crate::feed::FeedUpdate;
use crate::models::{MenuItem, PriceUpdateEvent};

/// Default number of retained update events.
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// Most-recent-first ring of update events.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateHistory {
    limit: usize,
    events: VecDeque<PriceUpdateEvent>,
}

impl Default for UpdateHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl UpdateHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            events: VecDeque::with_capacity(limit),
        }
    }

    pub fn record(&mut self, event: PriceUpdateEvent) {
        self.events.push_front(event);
        self.events.truncate(self.limit);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceUpdateEvent> {
        self.events.front()
    }

    pub fn to_vec(&self) -> Vec<PriceUpdateEvent> {
        self.events.iter().cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct PriceBoard {
    items: Vec<MenuItem>,
    history: UpdateHistory,
    ticks_applied: u64,
}

impl PriceBoard {
    pub fn new(items: Vec<MenuItem>, history_limit: usize) -> Self {
        Self {
            items,
            history: UpdateHistory::new(history_limit),
            ticks_applied: 0,
        }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn history(&self) -> &UpdateHistory {
        &self.history
    }

    pub fn ticks_applied(&self) -> u64 {
        self.ticks_applied
    }

    /// Swap in the feed's snapshot and record its events, oldest first so the
    /// newest ends up at the front.
    pub fn apply(&mut self, update: FeedUpdate) {
        self.items = update.items;
        for event in update.events {
            self.history.record(event);
        }
        self.ticks_applied += 1;
    }
}
