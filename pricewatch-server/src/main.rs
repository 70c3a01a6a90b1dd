use clap::Parser;
use pricewatch_core::PricewatchConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use pricewatch_server::server;
use pricewatch_server::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "pricewatch.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = match PricewatchConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(config) {
        Ok(s) => s.shared(),
        Err(e) => {
            eprintln!("Failed to initialise price feed: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        let session = state.sessions.load();
        println!("✅ Config loaded ({})", args.config);
        println!("✅ Price feed: {}", state.feed.name());
        println!("✅ Catalog: {} items", state.board.read().await.items().len());
        match session {
            Some(s) => println!(
                "✅ Session: logged in, {} platform(s) connected",
                s.connected_platforms().len()
            ),
            None => println!("✅ Session: none"),
        }
        println!("✅ Pricewatch health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let loop_state = state.clone();
    let loop_shutdown = tx.subscribe();
    tokio::spawn(async move {
        pricewatch_server::subsystems::prices::run_price_loop(loop_state, loop_shutdown).await;
    });

    if state.config.http.enabled {
        let http_state = state.clone();
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) =
                pricewatch_server::http::start_http_server(http_state, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = state.config.service.socket_path.clone();
    server::run_unix_server(&socket_path, state, tx.subscribe()).await?;

    Ok(())
}
