//! Price feeds — where price changes come from.
//!
//! Provides a `PriceFeed` trait with implementations for:
//! - **Simulated** — random mutations from `PriceSimulator`
//! - **Http** — polls a JSON snapshot endpoint and diffs it against the board
//!
//! Callers only ever see `Box<dyn PriceFeed>`; swapping one for the other does
//! not touch the price loop.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::config::{FeedBackend, FeedConfig, SimulatorConfig};
use crate::models::{MenuItem, Platform, PriceUpdateEvent};
use crate::simulator::PriceSimulator;

/// A new snapshot plus the events that produced it.
#[derive(Debug, Clone)]
pub struct FeedUpdate {
    pub items: Vec<MenuItem>,
    pub events: Vec<PriceUpdateEvent>,
}

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("All {attempts} retry attempts failed")]
    RetryExhausted { attempts: usize },

    #[error("HTTP feed selected but no feed.url configured")]
    MissingUrl,

    #[error("Simulator lock poisoned")]
    Poisoned,
}

// ============================================================================
// PriceFeed trait
// ============================================================================

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Produce the next update for `items`, restricted to `connected`.
    /// `Ok(None)` means nothing changed this round.
    async fn poll(
        &self,
        items: &[MenuItem],
        connected: &BTreeSet<Platform>,
    ) -> Result<Option<FeedUpdate>, FeedError>;

    /// Feed name for logging.
    fn name(&self) -> &str;
}

/// Build the feed described by config.
pub fn create_feed(
    feed: &FeedConfig,
    simulator: &SimulatorConfig,
) -> Result<Box<dyn PriceFeed>, FeedError> {
    match feed.backend {
        FeedBackend::Simulated => Ok(Box::new(SimulatedFeed::new(PriceSimulator::from_config(
            simulator.clone(),
        )))),
        FeedBackend::Http => Ok(Box::new(HttpFeed::new(feed.clone())?)),
    }
}

// ============================================================================
// SimulatedFeed
// ============================================================================

pub struct SimulatedFeed {
    simulator: Mutex<PriceSimulator>,
}

impl SimulatedFeed {
    pub fn new(simulator: PriceSimulator) -> Self {
        Self {
            simulator: Mutex::new(simulator),
        }
    }
}

#[async_trait]
impl PriceFeed for SimulatedFeed {
    async fn poll(
        &self,
        items: &[MenuItem],
        connected: &BTreeSet<Platform>,
    ) -> Result<Option<FeedUpdate>, FeedError> {
        let mut simulator = self.simulator.lock().map_err(|_| FeedError::Poisoned)?;
        Ok(simulator.tick(items, connected).map(|outcome| FeedUpdate {
            items: outcome.items,
            events: vec![outcome.event],
        }))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

// ============================================================================
// HttpFeed
// ============================================================================

/// Polls `GET {url}` for a JSON array of menu items.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    config: FeedConfig,
    url: String,
}

impl HttpFeed {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let url = config.url.clone().ok_or(FeedError::MissingUrl)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub async fn fetch_snapshot(&self) -> Result<Vec<MenuItem>, FeedError> {
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        // first try plus one per retry
        let attempts = self.config.max_retries + 1;
        match Retry::spawn(retry_strategy, || self.fetch_once()).await {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::error!(
                    attempts,
                    error = %e,
                    "All price feed retry attempts failed"
                );
                Err(FeedError::RetryExhausted { attempts })
            }
        }
    }

    async fn fetch_once(&self) -> Result<Vec<MenuItem>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(code = status.as_u16(), message = %message, "Price feed error");
            return Err(FeedError::Api {
                code: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl PriceFeed for HttpFeed {
    async fn poll(
        &self,
        items: &[MenuItem],
        connected: &BTreeSet<Platform>,
    ) -> Result<Option<FeedUpdate>, FeedError> {
        if connected.is_empty() || items.is_empty() {
            return Ok(None);
        }
        let remote = self.fetch_snapshot().await?;
        Ok(diff_snapshot(items, &remote, connected))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Merge `remote` prices into `current` for connected platforms only.
///
/// Only (item, platform) pairs already present in `current` are touched, so
/// every event points at an entry that exists before and after.
pub fn diff_snapshot(
    current: &[MenuItem],
    remote: &[MenuItem],
    connected: &BTreeSet<Platform>,
) -> Option<FeedUpdate> {
    let mut items = current.to_vec();
    let mut events = Vec::new();

    for item in items.iter_mut() {
        let Some(fresh) = remote.iter().find(|r| r.id == item.id) else {
            continue;
        };
        for option in item.pricing.iter_mut() {
            if !connected.contains(&option.platform) {
                continue;
            }
            let Some(incoming) = fresh.pricing_for(option.platform) else {
                continue;
            };
            if incoming.price == option.price && incoming.discount_code == option.discount_code {
                continue;
            }

            events.push(PriceUpdateEvent {
                item_id: item.id.clone(),
                platform: option.platform,
                old_price: option.price,
                new_price: incoming.price,
                has_discount: incoming.discount_code.is_some(),
                discount_code: incoming.discount_code.clone(),
            });
            option.price = incoming.price;
            option.discount_code = incoming.discount_code.clone();
        }
    }

    if events.is_empty() {
        None
    } else {
        Some(FeedUpdate { items, events })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::demo_items;
    use crate::random::StdRandom;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_config(url: String) -> FeedConfig {
        FeedConfig {
            backend: FeedBackend::Http,
            url: Some(url),
            max_retries: 2,
            retry_delay_ms: 1,
            timeout_seconds: 5,
        }
    }

    fn all_platforms() -> BTreeSet<Platform> {
        Platform::ALL.into_iter().collect()
    }

    #[test]
    fn test_http_feed_requires_url() {
        let mut config = http_config(String::new());
        config.url = None;
        assert!(matches!(HttpFeed::new(config), Err(FeedError::MissingUrl)));
    }

    #[test]
    fn test_create_feed_defaults_to_simulated() {
        let feed = create_feed(&FeedConfig::default(), &SimulatorConfig::default()).unwrap();
        assert_eq!(feed.name(), "simulated");
    }

    #[tokio::test]
    async fn test_simulated_feed_is_noop_without_connections() {
        let feed = SimulatedFeed::new(PriceSimulator::new(
            SimulatorConfig::default(),
            StdRandom::with_seed(1),
        ));
        let update = feed.poll(&demo_items(), &BTreeSet::new()).await.unwrap();
        assert!(update.is_none());
    }

    #[tokio::test]
    async fn test_simulated_feed_emits_single_event() {
        let feed = SimulatedFeed::new(PriceSimulator::new(
            SimulatorConfig::default(),
            StdRandom::with_seed(1),
        ));
        // Every demo item is on every platform, so a tick always lands.
        let update = feed
            .poll(&demo_items(), &all_platforms())
            .await
            .unwrap()
            .expect("tick should produce an update");
        assert_eq!(update.events.len(), 1);
        assert_eq!(update.items.len(), 6);
    }

    #[test]
    fn test_diff_reports_changed_connected_entries_only() {
        let current = demo_items();
        let mut remote = demo_items();
        remote[0].pricing_for_mut(Platform::Swiggy).unwrap().price = 11.49;
        remote[0].pricing_for_mut(Platform::Zomato).unwrap().price = 99.0;

        let connected: BTreeSet<_> = [Platform::Swiggy].into_iter().collect();
        let update = diff_snapshot(&current, &remote, &connected).unwrap();

        assert_eq!(update.events.len(), 1);
        let event = &update.events[0];
        assert_eq!(event.item_id, "1");
        assert_eq!(event.platform, Platform::Swiggy);
        assert_eq!(event.old_price, 12.99);
        assert_eq!(event.new_price, 11.49);
        assert_eq!(update.items[0].pricing_for(Platform::Zomato).unwrap().price, 13.49);
    }

    #[test]
    fn test_diff_ignores_unknown_items_and_platforms() {
        let current = demo_items();
        let mut remote = demo_items();
        remote.push(MenuItem {
            id: "99".into(),
            name: "Mystery".into(),
            restaurant: "Nowhere".into(),
            cuisine: String::new(),
            description: String::new(),
            rating: 0.0,
            pricing: remote[0].pricing.clone(),
        });
        assert!(diff_snapshot(&current, &remote, &all_platforms()).is_none());
    }

    #[tokio::test]
    async fn test_http_feed_polls_and_diffs() {
        let mock_server = MockServer::start().await;
        let mut remote = demo_items();
        remote[1].pricing_for_mut(Platform::Zomato).unwrap().price = 8.99;

        Mock::given(method("GET"))
            .and(path("/prices"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
            .mount(&mock_server)
            .await;

        let feed = HttpFeed::new(http_config(format!("{}/prices", mock_server.uri()))).unwrap();
        let update = feed
            .poll(&demo_items(), &all_platforms())
            .await
            .unwrap()
            .expect("changed price should yield an update");

        assert_eq!(update.events.len(), 1);
        assert_eq!(update.events[0].item_id, "2");
        assert_eq!(update.events[0].new_price, 8.99);
    }

    #[tokio::test]
    async fn test_http_feed_skips_fetch_without_connections() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&mock_server)
            .await;

        let feed = HttpFeed::new(http_config(format!("{}/prices", mock_server.uri()))).unwrap();
        let update = feed.poll(&demo_items(), &BTreeSet::new()).await.unwrap();
        assert!(update.is_none());
    }

    #[tokio::test]
    async fn test_http_feed_exhausts_retries_on_500() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let feed = HttpFeed::new(http_config(format!("{}/prices", mock_server.uri()))).unwrap();
        match feed.poll(&demo_items(), &all_platforms()).await {
            Err(FeedError::RetryExhausted { attempts }) => assert_eq!(attempts, 3),
            other => panic!("Expected RetryExhausted, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_http_feed_retries_then_succeeds() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(demo_items()))
            .mount(&mock_server)
            .await;

        let feed = HttpFeed::new(http_config(mock_server.uri())).unwrap();
        let snapshot = feed.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 6);
    }
}
