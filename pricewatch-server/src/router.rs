use pricewatch_core::catalog::{
    filter_items_by_platforms, filter_restaurants_by_platforms, items_for_restaurant, search_items,
    search_restaurants, sort_items,
};
use pricewatch_core::ipc::{PriceRequest, PriceResponse};
use pricewatch_core::{visible, FeedError, Platform, PricewatchError};
use serde_json::{json, Value};

use crate::state::SharedState;
use crate::subsystems::prices;

/// Handle one request, folding errors into an error response.
pub async fn handle_request(request: PriceRequest, state: &SharedState) -> PriceResponse {
    match dispatch(request, state).await {
        Ok(data) => PriceResponse::ok(data),
        Err(e) => PriceResponse::err(e.to_string()),
    }
}

/// Shared entry point for the IPC and HTTP surfaces.
pub async fn dispatch(
    request: PriceRequest,
    state: &SharedState,
) -> Result<Value, PricewatchError> {
    match request {
        PriceRequest::Ping => Ok(json!({"pong": true})),
        PriceRequest::Health => {
            let board = state.board.read().await;
            let session = state.sessions.load();
            Ok(json!({
                "status": "healthy",
                "feed": state.feed.name(),
                "items": board.items().len(),
                "ticks_applied": board.ticks_applied(),
                "logged_in": session.map(|s| s.logged_in).unwrap_or(false),
            }))
        }
        PriceRequest::Items {
            query,
            sort,
            platforms,
        } => {
            let session = state.sessions.load();
            let mut items = {
                let board = state.board.read().await;
                visible(board.items(), session.as_ref())
            };
            if let Some(q) = query.as_deref() {
                items = search_items(&items, q);
            }
            if let Some(platforms) = platforms.as_deref() {
                items = filter_items_by_platforms(&items, platforms)?;
            }
            let order = sort.unwrap_or_default();
            sort_items(&mut items, order);

            let best: Vec<Value> = items
                .iter()
                .filter_map(|i| {
                    i.best_option().map(|o| {
                        json!({"item_id": i.id, "platform": o.platform, "price": o.price})
                    })
                })
                .collect();

            Ok(json!({
                "count": items.len(),
                "sort": order,
                "logged_in": session.map(|s| s.logged_in).unwrap_or(false),
                "items": items,
                "best": best,
            }))
        }
        PriceRequest::Restaurants { query, platforms } => {
            let mut restaurants = match query.as_deref() {
                Some(q) => search_restaurants(&state.restaurants, q),
                None => state.restaurants.clone(),
            };
            if let Some(platforms) = platforms.as_deref() {
                restaurants = filter_restaurants_by_platforms(&restaurants, platforms)?;
            }

            // restaurant id -> ids of its menu items
            let board = state.board.read().await;
            let menus: serde_json::Map<String, Value> = restaurants
                .iter()
                .map(|r| {
                    let ids: Vec<String> = items_for_restaurant(board.items(), &r.name)
                        .into_iter()
                        .map(|i| i.id)
                        .collect();
                    (r.id.clone(), json!(ids))
                })
                .collect();

            Ok(json!({
                "count": restaurants.len(),
                "restaurants": restaurants,
                "menus": menus,
            }))
        }
        PriceRequest::Updates => {
            let board = state.board.read().await;
            Ok(json!({
                "updates": board.history().to_vec(),
                "ticks_applied": board.ticks_applied(),
            }))
        }
        PriceRequest::Session => Ok(session_body(state)),
        PriceRequest::Login {
            email,
            password,
            platform,
        } => {
            let platform: Platform = platform.parse()?;
            let session = state.sessions.login(&email, &password, platform)?;
            Ok(json!({"logged_in": true, "session": session}))
        }
        PriceRequest::Logout => {
            state.sessions.logout()?;
            Ok(json!({"logged_in": false}))
        }
        PriceRequest::Connect { platform } => {
            let platform: Platform = platform.parse()?;
            let session = state.sessions.set_connection(platform, true)?;
            Ok(json!({"platform": platform, "connected": true, "session": session}))
        }
        PriceRequest::Disconnect { platform } => {
            let platform: Platform = platform.parse()?;
            let session = state.sessions.set_connection(platform, false)?;
            Ok(json!({"platform": platform, "connected": false, "session": session}))
        }
        PriceRequest::Tick => {
            let report = prices::run_price_tick(state)
                .await
                .map_err(|e| match e.downcast::<FeedError>() {
                    Ok(feed) => PricewatchError::Feed(feed),
                    Err(other) => PricewatchError::Ipc(format!("tick failed: {}", other)),
                })?;
            Ok(json!({
                "updated": report.updated(),
                "connected_platforms": report.connected_platforms,
                "events": report.events,
                "elapsed_ms": report.elapsed_ms,
            }))
        }
    }
}

fn session_body(state: &SharedState) -> Value {
    match state.sessions.load() {
        Some(session) => {
            let connected: Vec<Platform> = session.connected_platforms().into_iter().collect();
            json!({
                "logged_in": session.logged_in,
                "connected": connected,
                "expires_at": session.created_at + state.sessions.ttl(),
                "session": session,
            })
        }
        None => json!({"logged_in": false, "connected": [], "session": null}),
    }
}
