//! Process-wide context: the session store, the price board and the active
//! price feed. Created once at startup and shared behind an `Arc`.

use std::sync::Arc;

use pricewatch_core::feed::create_feed;
use pricewatch_core::{
    Catalog, MenuItem, PriceBoard, PriceFeed, PricewatchConfig, PricewatchError, Restaurant,
    SessionStore,
};
use tokio::sync::{Mutex, RwLock};

pub struct AppState {
    pub config: PricewatchConfig,
    pub sessions: SessionStore,
    pub board: RwLock<PriceBoard>,
    pub feed: Box<dyn PriceFeed>,
    pub restaurants: Vec<Restaurant>,
    /// Held for a whole price tick so ticks never interleave.
    pub tick_lock: Mutex<()>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire everything from config, seeded with the demo catalog.
    pub fn from_config(config: PricewatchConfig) -> Result<Self, PricewatchError> {
        let sessions = SessionStore::from_config(&config.session)?;
        let feed = create_feed(&config.feed, &config.simulator)?;
        let catalog = Catalog::demo();
        Ok(Self::with_parts(
            config,
            sessions,
            feed,
            catalog.items,
            catalog.restaurants,
        ))
    }

    pub fn with_parts(
        config: PricewatchConfig,
        sessions: SessionStore,
        feed: Box<dyn PriceFeed>,
        items: Vec<MenuItem>,
        restaurants: Vec<Restaurant>,
    ) -> Self {
        let board = PriceBoard::new(items, config.simulator.history_limit);
        tracing::info!(
            "Price board ready: {} items, {} restaurants, feed={}",
            board.items().len(),
            restaurants.len(),
            feed.name()
        );
        Self {
            config,
            sessions,
            board: RwLock::new(board),
            feed,
            restaurants,
            tick_lock: Mutex::new(()),
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
