use anyhow::Context;
use paper_desk::orchestration::{spawn_price_consumer, spawn_price_producer, PollSettings};
use paper_desk::{api, init_db, Config, TradeRepository, TradingSession};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

const FEED_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let mut session = TradingSession::new(&config);
    if let Some(path) = &config.trade_db_path {
        let pool = init_db(path)
            .await
            .with_context(|| format!("Failed to initialize trade journal at {}", path))?;
        session = session.with_journal(Arc::new(TradeRepository::new(pool)));
    }
    let session = Arc::new(session);

    let restored = session
        .restore_from_journal()
        .await
        .context("Failed to restore trades from journal")?;
    if restored > 0 {
        tracing::info!("Restored {} trades from journal", restored);
    }

    let feed = config.build_feed().context("Failed to build price feed")?;
    let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
    let settings = PollSettings {
        interval: config.poll_interval,
        timeout: config.poll_timeout,
    };
    spawn_price_producer(feed, session.symbols().to_vec(), settings, tx);
    spawn_price_consumer(rx, session.clone());

    let app = api::create_router(api::AppState::new(session));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(
        "Paper desk listening on {} ({:?} feed, {:?} mode)",
        addr,
        config.feed_mode,
        config.trading_mode
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
