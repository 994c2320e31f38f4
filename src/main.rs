use bollbot::api::BinanceFuturesClient;
use bollbot::notify::TelegramNotifier;
use bollbot::positions::PositionTracker;
use bollbot::signal::{project_rows, ScanConfig};
use bollbot::store::PairStore;
use bollbot::Result;
use tokio::time::{interval, sleep, Duration};

const PAIRS_DIR: &str = "pairs";
const SCAN_PAUSE_SECS: u64 = 5;
const FLUSH_INTERVAL_SECS: u64 = 5;
const POSITION_POLL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    tracing::info!("🚀 Bollbot starting - band scanner + position monitor");

    let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
        .expect("TELEGRAM_BOT_TOKEN not found in environment");
    let chat_id =
        std::env::var("TELEGRAM_CHAT_ID").expect("TELEGRAM_CHAT_ID not found in environment");
    let binance_api_key = std::env::var("BINANCE_API_KEY").ok();
    let monitor_positions = binance_api_key.is_some();

    let notifier = TelegramNotifier::new(bot_token, chat_id);
    let client = BinanceFuturesClient::new(binance_api_key)?;

    tracing::info!("\n🔄 Spawning independent loops...");

    // Loop 1: scan the full symbol universe, back to back with a short pause
    let scan_task = {
        let client = client.clone();
        let notifier = notifier.clone();
        tokio::spawn(async move {
            scan_loop(client, notifier).await;
        })
    };

    // Loop 2: flush the notification buffer every few seconds
    let flush_task = {
        let notifier = notifier.clone();
        tokio::spawn(async move {
            flush_loop(notifier).await;
        })
    };

    // Loop 3: poll the account position snapshot once a minute
    let position_task = {
        let client = client.clone();
        let notifier = notifier.clone();
        tokio::spawn(async move {
            if monitor_positions {
                position_loop(client, notifier).await;
            } else {
                tracing::warn!("BINANCE_API_KEY not set, position monitoring disabled");
            }
        })
    };

    tracing::info!("✅ All loops spawned");
    tracing::info!("  📊 Scan: continuous, {}s pause between cycles", SCAN_PAUSE_SECS);
    tracing::info!("  📨 Flush: every {}s", FLUSH_INTERVAL_SECS);
    if monitor_positions {
        tracing::info!("  👁  Positions: every {}s", POSITION_POLL_SECS);
    }
    tracing::info!("\nPress Ctrl+C to stop...\n");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("\n⚠️  Received Ctrl+C, shutting down...");
        }
        result = scan_task => {
            tracing::error!("Scan loop exited: {:?}", result);
        }
        result = flush_task => {
            tracing::error!("Flush loop exited: {:?}", result);
        }
        result = position_task => {
            tracing::error!("Position loop exited: {:?}", result);
        }
    }

    tracing::info!("👋 Bollbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bollbot=info".into()),
        )
        .init();
}

// ============================================================================
// Loops
// ============================================================================

async fn scan_loop(client: BinanceFuturesClient, notifier: TelegramNotifier) {
    let config = ScanConfig::default();
    let store = match PairStore::new(PAIRS_DIR) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot create pair store at {}: {}", PAIRS_DIR, e);
            return;
        }
    };

    loop {
        if let Err(e) = run_scan_cycle(&client, &store, &notifier, &config).await {
            tracing::error!("Error in scan cycle: {}", e);
        }
        sleep(Duration::from_secs(SCAN_PAUSE_SECS)).await;
    }
}

/// One full cycle: clear the store, refresh the symbol universe, then fetch,
/// project and classify every symbol. A failing symbol is logged and skipped,
/// never aborting the rest of the cycle.
async fn run_scan_cycle(
    client: &BinanceFuturesClient,
    store: &PairStore,
    notifier: &TelegramNotifier,
    config: &ScanConfig,
) -> Result<()> {
    store.clear()?;

    let symbols = client.fetch_perpetual_symbols().await?;
    let mut flagged = 0usize;

    for symbol in &symbols {
        let series = match client.fetch_klines(symbol).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", symbol, e);
                continue;
            }
        };

        if let Err(e) = store.save(symbol, &series) {
            tracing::warn!("Failed to cache {}: {}", symbol, e);
            continue;
        }

        // Compute from the cached copy, so the on-disk file is the actual
        // cycle input
        let cached = match store.load(symbol) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Failed to read cached {}: {}", symbol, e);
                continue;
            }
        };

        let rows = project_rows(symbol, &cached, config);
        let Some(last) = rows.last() else {
            continue;
        };

        if last.side.is_extreme() {
            flagged += 1;
            tracing::info!(
                "{} {} dist={:.2}% close={:.4}",
                symbol,
                last.label,
                last.dist_pct.unwrap_or(0.0),
                last.close
            );
            notifier.queue_signal(symbol, last).await;
        }
    }

    tracing::info!(
        "Cycle complete: {} symbols scanned, {} flagged",
        symbols.len(),
        flagged
    );
    Ok(())
}

async fn flush_loop(notifier: TelegramNotifier) {
    let mut ticker = interval(Duration::from_secs(FLUSH_INTERVAL_SECS));
    loop {
        ticker.tick().await;
        notifier.flush().await;
    }
}

/// Poll the position snapshot and report lifecycle changes.
///
/// The tracker is owned here, so diff cycles are serialized by construction;
/// its previous-snapshot state never outlives the loop.
async fn position_loop(client: BinanceFuturesClient, notifier: TelegramNotifier) {
    let mut tracker = PositionTracker::new();
    let mut ticker = interval(Duration::from_secs(POSITION_POLL_SECS));

    loop {
        ticker.tick().await;

        let snapshot = match client.fetch_positions().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Position poll failed: {}", e);
                continue;
            }
        };

        let events = tracker.apply_snapshot(snapshot);
        for event in &events {
            tracing::info!("Position {:?}: {}", event.kind, event.symbol);
            notifier.queue_position_event(event).await;
        }
    }
}
