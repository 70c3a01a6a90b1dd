//! Price loop integration tests — ticks against in-memory state, with both
//! the simulated feed and an HTTP feed backed by wiremock.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use pricewatch_core::catalog::{demo_items, demo_restaurants};
use pricewatch_core::config::{
    FeedBackend, FeedConfig, PricewatchConfig, ServiceConfig, SimulatorConfig,
};
use pricewatch_core::{
    FeedError, FeedUpdate, HttpFeed, ManualClock, MemoryStore, MenuItem, Platform, PriceFeed,
    PriceSimulator, PriceUpdateEvent, SessionStore, SimulatedFeed, StdRandom,
};
use pricewatch_server::state::{AppState, SharedState};
use pricewatch_server::subsystems::prices::{run_price_loop, run_price_tick};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(interval_seconds: u64) -> PricewatchConfig {
    PricewatchConfig {
        service: ServiceConfig {
            socket_path: "/tmp/pricewatch-prices-test.sock".to_string(),
            log_level: "debug".to_string(),
        },
        http: Default::default(),
        session: Default::default(),
        simulator: SimulatorConfig {
            interval_seconds,
            seed: Some(42),
            ..Default::default()
        },
        feed: Default::default(),
    }
}

fn sessions() -> SessionStore {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    ));
    SessionStore::new(Arc::new(MemoryStore::new()), clock, Duration::hours(24))
}

fn state_with_feed(config: PricewatchConfig, feed: Box<dyn PriceFeed>) -> SharedState {
    AppState::with_parts(config, sessions(), feed, demo_items(), demo_restaurants()).shared()
}

fn simulated_state(interval_seconds: u64) -> SharedState {
    let config = test_config(interval_seconds);
    let simulator = PriceSimulator::new(config.simulator.clone(), StdRandom::with_seed(42));
    state_with_feed(config, Box::new(SimulatedFeed::new(simulator)))
}

fn login(state: &SharedState, platform: Platform) {
    state
        .sessions
        .login("demo@example.com", "hunter22", platform)
        .unwrap();
}

#[tokio::test]
async fn test_tick_skipped_when_logged_out() {
    let state = simulated_state(15);
    let before = state.board.read().await.items().to_vec();

    let report = run_price_tick(&state).await.unwrap();
    assert_eq!(report.connected_platforms, 0);
    assert!(!report.updated());

    let board = state.board.read().await;
    assert_eq!(board.items(), before.as_slice());
    assert!(board.history().is_empty());
    assert_eq!(board.ticks_applied(), 0);
}

#[tokio::test]
async fn test_tick_only_touches_connected_platform() {
    let state = simulated_state(15);
    login(&state, Platform::Swiggy);
    let before = state.board.read().await.items().to_vec();

    let report = run_price_tick(&state).await.unwrap();
    assert_eq!(report.connected_platforms, 1);
    assert_eq!(report.events.len(), 1);

    let event = &report.events[0];
    assert_eq!(event.platform, Platform::Swiggy);
    assert!(event.new_price >= 0.99);
    assert!((event.new_price - event.old_price).abs() <= 2.0 + 1e-9);
    assert_eq!(event.has_discount, event.discount_code.is_some());

    let board = state.board.read().await;
    for (old, new) in before.iter().zip(board.items()) {
        for platform in [Platform::Zomato, Platform::UberEats] {
            assert_eq!(old.pricing_for(platform), new.pricing_for(platform));
        }
    }
    let changed = board
        .items()
        .iter()
        .find(|i| i.id == event.item_id)
        .and_then(|i| i.pricing_for(Platform::Swiggy))
        .unwrap();
    assert_eq!(changed.price, event.new_price);
    assert_eq!(changed.discount_code, event.discount_code);
}

#[tokio::test]
async fn test_history_capped_newest_first() {
    let state = simulated_state(15);
    login(&state, Platform::Zomato);

    let mut last = None;
    for _ in 0..12 {
        let report = run_price_tick(&state).await.unwrap();
        last = report.events.last().cloned();
    }

    let board = state.board.read().await;
    assert_eq!(board.ticks_applied(), 12);
    assert_eq!(board.history().len(), 5);
    assert_eq!(board.history().latest(), last.as_ref());
}

#[tokio::test(start_paused = true)]
async fn test_price_loop_ticks_until_shutdown() {
    let state = simulated_state(1);
    login(&state, Platform::UberEats);

    let (tx, _rx) = broadcast::channel(1);
    let loop_state = state.clone();
    let loop_shutdown = tx.subscribe();
    let join = tokio::spawn(async move { run_price_loop(loop_state, loop_shutdown).await });

    tokio::time::sleep(StdDuration::from_millis(3500)).await;
    tx.send(()).unwrap();
    join.await.unwrap();

    let applied = state.board.read().await.ticks_applied();
    assert_eq!(applied, 3);

    // Stopped: no further ticks land
    tokio::time::sleep(StdDuration::from_secs(5)).await;
    assert_eq!(state.board.read().await.ticks_applied(), applied);
}

/// Feed that takes a while to answer and sets item N's Swiggy price to 1.23
/// on its Nth poll.
struct SlowFeed {
    polls: AtomicUsize,
}

#[async_trait]
impl PriceFeed for SlowFeed {
    async fn poll(
        &self,
        items: &[MenuItem],
        _connected: &BTreeSet<Platform>,
    ) -> Result<Option<FeedUpdate>, FeedError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let mut items = items.to_vec();
        let item_id = items[n].id.clone();
        let option = items[n].pricing_for_mut(Platform::Swiggy).unwrap();
        let event = PriceUpdateEvent {
            item_id,
            platform: Platform::Swiggy,
            old_price: option.price,
            new_price: 1.23,
            has_discount: false,
            discount_code: None,
        };
        option.price = 1.23;
        Ok(Some(FeedUpdate {
            items,
            events: vec![event],
        }))
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn test_concurrent_ticks_do_not_lose_updates() {
    let feed = SlowFeed {
        polls: AtomicUsize::new(0),
    };
    let state = state_with_feed(test_config(15), Box::new(feed));
    login(&state, Platform::Swiggy);

    let (a, b) = tokio::join!(run_price_tick(&state), run_price_tick(&state));
    assert!(a.unwrap().updated());
    assert!(b.unwrap().updated());

    let board = state.board.read().await;
    assert_eq!(board.ticks_applied(), 2);
    assert_eq!(board.history().len(), 2);
    for (i, item) in board.items().iter().enumerate().take(2) {
        assert_eq!(
            item.pricing_for(Platform::Swiggy).unwrap().price,
            1.23,
            "update to item {} was lost",
            i
        );
    }
    for event in board.history().to_vec() {
        let item = board.items().iter().find(|i| i.id == event.item_id).unwrap();
        assert_eq!(item.pricing_for(event.platform).unwrap().price, event.new_price);
    }
}

// ===========================================================================
// HttpFeed
// ===========================================================================

fn http_feed_config(url: String) -> FeedConfig {
    FeedConfig {
        backend: FeedBackend::Http,
        url: Some(url),
        max_retries: 2,
        retry_delay_ms: 1,
        timeout_seconds: 5,
    }
}

#[tokio::test]
async fn test_http_feed_tick_applies_remote_prices() {
    let mock_server = MockServer::start().await;

    let mut remote = demo_items();
    for option in remote[1].pricing.iter_mut() {
        option.price = 7.49;
    }

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&remote))
        .mount(&mock_server)
        .await;

    let feed = HttpFeed::new(http_feed_config(format!("{}/prices", mock_server.uri()))).unwrap();
    let state = state_with_feed(test_config(15), Box::new(feed));
    login(&state, Platform::Zomato);

    let report = run_price_tick(&state).await.unwrap();
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].item_id, "2");
    assert_eq!(report.events[0].platform, Platform::Zomato);
    assert_eq!(report.events[0].old_price, 9.99);
    assert_eq!(report.events[0].new_price, 7.49);

    let board = state.board.read().await;
    let pizza = &board.items()[1];
    assert_eq!(pizza.pricing_for(Platform::Zomato).unwrap().price, 7.49);
    // Not connected, so not applied
    assert_eq!(pizza.pricing_for(Platform::Swiggy).unwrap().price, 10.99);
}

#[tokio::test]
async fn test_http_feed_failure_leaves_board_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let feed = HttpFeed::new(http_feed_config(format!("{}/prices", mock_server.uri()))).unwrap();
    let state = state_with_feed(test_config(15), Box::new(feed));
    login(&state, Platform::Swiggy);

    let result = run_price_tick(&state).await;
    assert!(result.is_err());

    let board = state.board.read().await;
    assert_eq!(board.items(), demo_items().as_slice());
    assert!(board.history().is_empty());
}
