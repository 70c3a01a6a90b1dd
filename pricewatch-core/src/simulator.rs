//! Randomized price simulator.
//!
//! One tick:
//!   1. pick a connected platform, then an item, uniformly at random
//!   2. skip if the item is not offered on that platform
//!   3. new_price = max(min_price, old_price + U(-max_delta, max_delta)), rounded to cents
//!   4. with `discount_probability` attach a code from `DISCOUNT_CODES`, else clear it
//!
//! The input list is never mutated; the tick returns a fresh snapshot.

use std::collections::BTreeSet;

use crate::config::SimulatorConfig;
use crate::models::{MenuItem, Platform, PriceUpdateEvent};
use crate::random::{RandomSource, StdRandom};

pub const DISCOUNT_CODES: [&str; 10] = [
    "SAVE10", "NEWUSER", "TASTY20", "HUNGRY", "SPCL15", "WEEKEND", "FOODIE", "WELCOME", "OFFER25",
    "FIRST50",
];

/// Result of a tick that changed something.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub items: Vec<MenuItem>,
    pub event: PriceUpdateEvent,
}

pub struct PriceSimulator<R = StdRandom> {
    config: SimulatorConfig,
    rng: R,
}

impl PriceSimulator<StdRandom> {
    /// Seeded when `config.seed` is set, entropy otherwise.
    pub fn from_config(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRandom::with_seed(seed),
            None => StdRandom::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: RandomSource> PriceSimulator<R> {
    pub fn new(config: SimulatorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    /// Run one tick. `None` means nothing to update: no connected platform,
    /// no items, or the chosen item is not sold on the chosen platform.
    pub fn tick(
        &mut self,
        items: &[MenuItem],
        connected: &BTreeSet<Platform>,
    ) -> Option<TickOutcome> {
        if connected.is_empty() || items.is_empty() {
            return None;
        }

        let platforms: Vec<Platform> = connected.iter().copied().collect();
        let platform = platforms[self.rng.index(platforms.len())];
        let item_index = self.rng.index(items.len());

        let old_price = match items[item_index].pricing_for(platform) {
            Some(option) => option.price,
            None => {
                tracing::trace!(
                    "Tick skipped: item {} not offered on {}",
                    items[item_index].id,
                    platform
                );
                return None;
            }
        };

        let delta = self
            .rng
            .uniform(-self.config.max_delta, self.config.max_delta);
        let new_price = round_to_cents((old_price + delta).max(self.config.min_price))
            .max(self.config.min_price);

        let discount_code = if self.rng.chance(self.config.discount_probability) {
            let code = DISCOUNT_CODES[self.rng.index(DISCOUNT_CODES.len())];
            Some(code.to_string())
        } else {
            None
        };

        let mut snapshot = items.to_vec();
        let item = &mut snapshot[item_index];
        if let Some(option) = item.pricing_for_mut(platform) {
            option.price = new_price;
            option.discount_code = discount_code.clone();
        }

        let event = PriceUpdateEvent {
            item_id: item.id.clone(),
            platform,
            old_price,
            new_price,
            has_discount: discount_code.is_some(),
            discount_code,
        };

        Some(TickOutcome {
            items: snapshot,
            event,
        })
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
