//! pricewatch-cli — command-line frontend for a running pricewatch-server
//!
//! Talks to the server's HTTP API. Every listing command accepts `--json` to
//! print the raw response body instead of the text table.
//!
//! # Subcommands
//! - `items [query] [--sort <order>] [--platform <p>]...` — compare item prices
//! - `restaurants [query] [--platform <p>]...`            — list restaurants
//! - `updates`                                            — recent price changes
//! - `login <email> <password> <platform>`                — demo login
//! - `logout`                                             — clear the session
//! - `connect <platform>` / `disconnect <platform>`       — toggle a platform
//! - `tick`                                               — force one price tick
//! - `status`                                             — server health and session

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "pricewatch-cli",
    version,
    about = "Compare food delivery prices across Swiggy, Zomato and Uber Eats"
)]
struct Cli {
    /// Pricewatch HTTP server URL (overrides PRICEWATCH_HTTP_URL env var)
    #[arg(long, env = "PRICEWATCH_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare menu item prices visible to the current session
    Items {
        /// Filter by dish, restaurant or cuisine
        query: Option<String>,

        /// price_low, price_high, rating or delivery_time
        #[arg(short, long, default_value = "price_low")]
        sort: String,

        /// Only show items offered on these platforms (repeatable)
        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// List restaurants
    Restaurants {
        query: Option<String>,

        #[arg(short, long = "platform")]
        platforms: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show the most recent price updates, newest first
    Updates {
        #[arg(long)]
        json: bool,
    },

    /// Log in to a delivery platform (demo credentials)
    Login {
        email: String,
        password: String,
        platform: String,
    },

    /// Clear the current session
    Logout,

    /// Connect an additional platform to the current session
    Connect { platform: String },

    /// Disconnect a platform from the current session
    Disconnect { platform: String },

    /// Run one price tick immediately
    Tick {
        #[arg(long)]
        json: bool,
    },

    /// Show server health and session state
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PricingRow {
    pub platform: String,
    pub price: f64,
    pub delivery_fee: f64,
    pub estimated_minutes: u32,
    pub discount_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub restaurant: String,
    #[serde(default)]
    pub rating: f32,
    pub pricing: Vec<PricingRow>,
}

#[derive(Debug, Deserialize)]
pub struct ItemsResponse {
    pub count: usize,
    pub logged_in: bool,
    pub items: Vec<ItemRow>,
}

#[derive(Debug, Deserialize)]
pub struct RestaurantRow {
    pub name: String,
    pub cuisines: Vec<String>,
    pub rating: f32,
    pub delivery_minutes: u32,
    pub distance: String,
    pub platforms: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestaurantsResponse {
    pub count: usize,
    pub restaurants: Vec<RestaurantRow>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRow {
    pub item_id: String,
    pub platform: String,
    pub old_price: f64,
    pub new_price: f64,
    pub discount_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatesResponse {
    pub updates: Vec<UpdateRow>,
}

// ============================================================================
// Formatting
// ============================================================================

/// One line per platform, cheapest marked with `*`.
pub fn format_item(item: &ItemRow) -> String {
    let mut out = format!("{} — {} (★ {:.1})\n", item.name, item.restaurant, item.rating);
    let cheapest = item
        .pricing
        .iter()
        .map(|p| p.price)
        .fold(f64::INFINITY, f64::min);

    for p in &item.pricing {
        let marker = if p.price == cheapest { "*" } else { " " };
        let fee = if p.delivery_fee == 0.0 {
            "free delivery".to_string()
        } else {
            format!("+${:.2} delivery", p.delivery_fee)
        };
        let code = p
            .discount_code
            .as_deref()
            .map(|c| format!("  [{}]", c))
            .unwrap_or_default();
        out.push_str(&format!(
            " {} {:<9} ${:>6.2}  {:<16} {:>3} min{}\n",
            marker, p.platform, p.price, fee, p.estimated_minutes, code
        ));
    }
    out
}

pub fn format_update(u: &UpdateRow) -> String {
    let arrow = if u.new_price < u.old_price {
        "↓"
    } else if u.new_price > u.old_price {
        "↑"
    } else {
        "="
    };
    let code = u
        .discount_code
        .as_deref()
        .map(|c| format!(" (code {})", c))
        .unwrap_or_default();
    format!(
        "item {} on {}: ${:.2} {} ${:.2}{}",
        u.item_id, u.platform, u.old_price, arrow, u.new_price, code
    )
}

pub fn format_restaurant(r: &RestaurantRow) -> String {
    format!(
        "{} ({}) ★ {:.1}, {} min, {} — {}",
        r.name,
        r.cuisines.join(", "),
        r.rating,
        r.delivery_minutes,
        r.distance,
        r.platforms.join(" / ")
    )
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?)
}

/// Send a request and return the JSON body, exiting on transport or HTTP errors.
fn call(req: reqwest::blocking::RequestBuilder, url: &str) -> anyhow::Result<serde_json::Value> {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("pricewatch-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let msg = body["error"].as_str().unwrap_or("unknown error");
        eprintln!("pricewatch-cli: server returned {}: {}", status, msg);
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

fn post(server: &str, path: &str, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, path);
    call(client()?.post(&url).json(&body), &url)
}

fn get(server: &str, path: &str) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, path);
    call(client()?.get(&url), &url)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn do_items(
    server: &str,
    query: Option<String>,
    sort: &str,
    platforms: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut body = serde_json::json!({ "query": query, "sort": sort });
    if !platforms.is_empty() {
        body["platforms"] = serde_json::json!(platforms);
    }
    let value = post(server, "/items", body)?;
    if json {
        return print_json(&value);
    }

    let resp: ItemsResponse = serde_json::from_value(value)?;
    if !resp.logged_in {
        println!("(not logged in: showing all platforms)\n");
    }
    if resp.count == 0 {
        eprintln!("No items to show");
        return Ok(());
    }
    for item in &resp.items {
        println!("{}", format_item(item));
    }
    Ok(())
}

fn do_restaurants(
    server: &str,
    query: Option<String>,
    platforms: Vec<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut body = serde_json::json!({ "query": query });
    if !platforms.is_empty() {
        body["platforms"] = serde_json::json!(platforms);
    }
    let value = post(server, "/restaurants", body)?;
    if json {
        return print_json(&value);
    }

    let resp: RestaurantsResponse = serde_json::from_value(value)?;
    if resp.count == 0 {
        eprintln!("No restaurants found");
    }
    for r in &resp.restaurants {
        println!("{}", format_restaurant(r));
    }
    Ok(())
}

fn do_updates(server: &str, json: bool) -> anyhow::Result<()> {
    let value = get(server, "/updates")?;
    if json {
        return print_json(&value);
    }

    let resp: UpdatesResponse = serde_json::from_value(value)?;
    if resp.updates.is_empty() {
        println!("No price updates yet");
    }
    for u in &resp.updates {
        println!("{}", format_update(u));
    }
    Ok(())
}

fn do_tick(server: &str, json: bool) -> anyhow::Result<()> {
    let value = post(server, "/tick", serde_json::json!({}))?;
    if json {
        return print_json(&value);
    }

    let resp: UpdatesResponse = serde_json::from_value(serde_json::json!({
        "updates": value["events"].clone(),
    }))?;
    if resp.updates.is_empty() {
        println!("No change (nothing connected, or nothing to update)");
    }
    for u in &resp.updates {
        println!("{}", format_update(u));
    }
    Ok(())
}

fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    match client()?.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Pricewatch server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:           {}", body["version"].as_str().unwrap_or("?"));
            println!("Feed:              {}", body["feed"].as_str().unwrap_or("?"));
            println!("Ticks applied:     {}", body["ticks_applied"]);
            println!("Socket:            {}", body["socket"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("pricewatch-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("pricewatch-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    let session = get(server, "/session")?;
    if session["logged_in"].as_bool().unwrap_or(false) {
        let connected: Vec<&str> = session["connected"]
            .as_array()
            .map(|a| a.iter().filter_map(|p| p.as_str()).collect())
            .unwrap_or_default();
        println!("Session:           logged in ({})", connected.join(", "));
        println!(
            "Expires:           {}",
            session["expires_at"].as_str().unwrap_or("?")
        );
    } else {
        println!("Session:           logged out");
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Items {
            query,
            sort,
            platforms,
            json,
        } => do_items(&server, query, &sort, platforms, json),
        Commands::Restaurants {
            query,
            platforms,
            json,
        } => do_restaurants(&server, query, platforms, json),
        Commands::Updates { json } => do_updates(&server, json),
        Commands::Login {
            email,
            password,
            platform,
        } => post(
            &server,
            "/login",
            serde_json::json!({"email": email, "password": password, "platform": platform}),
        )
        .map(|_| println!("Logged in to {}", platform)),
        Commands::Logout => {
            post(&server, "/logout", serde_json::json!({})).map(|_| println!("Logged out"))
        }
        Commands::Connect { platform } => post(
            &server,
            "/connections",
            serde_json::json!({"platform": platform, "connected": true}),
        )
        .map(|v| println!("Connected {}", v["platform"].as_str().unwrap_or(&platform))),
        Commands::Disconnect { platform } => post(
            &server,
            "/connections",
            serde_json::json!({"platform": platform, "connected": false}),
        )
        .map(|v| println!("Disconnected {}", v["platform"].as_str().unwrap_or(&platform))),
        Commands::Tick { json } => do_tick(&server, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("pricewatch-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
