pub mod board;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod ipc;
pub mod models;
pub mod random;
pub mod schedule;
pub mod session;
pub mod simulator;
pub mod storage;
pub mod visibility;

pub use board::{PriceBoard, UpdateHistory};
pub use catalog::{Catalog, CatalogError, SortOrder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PricewatchConfig;
pub use error::PricewatchError;
pub use feed::{create_feed, FeedError, FeedUpdate, HttpFeed, PriceFeed, SimulatedFeed};
pub use models::{MenuItem, Platform, PriceUpdateEvent, PricingOption, Restaurant, Session};
pub use random::{RandomSource, StdRandom};
pub use schedule::{every, TaskHandle};
pub use session::{SessionError, SessionStore};
pub use simulator::{PriceSimulator, TickOutcome};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
pub use visibility::visible;
