pub mod event;
pub mod menu;
pub mod platform;
pub mod restaurant;
pub mod session;

pub use event::PriceUpdateEvent;
pub use menu::{MenuItem, PricingOption};
pub use platform::{Platform, UnknownPlatform};
pub use restaurant::Restaurant;
pub use session::{Connection, Session};
