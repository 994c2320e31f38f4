use bollbot::models::{PositionEntry, PositionEventKind, PositionSnapshot, Series, Side};
use bollbot::notify::TelegramNotifier;
use bollbot::positions::PositionTracker;
use bollbot::signal::{project_rows, ScanConfig};
use bollbot::store::PairStore;

fn spike_series() -> Series {
    // Flat tape for 24 candles, then a violent breakout on heavy volume
    let mut close = vec![100.0; 24];
    close.push(160.0);
    let mut volume = vec![1000.0; 24];
    volume.push(5000.0);
    let n = close.len();
    Series {
        time: (0..n as i64).map(|i| 1_700_000_000_000 + i * 900_000).collect(),
        open: close.clone(),
        high: close.clone(),
        low: close.clone(),
        close,
        volume,
    }
}

fn snapshot(positions: &[(&str, f64)]) -> PositionSnapshot {
    positions
        .iter()
        .map(|(symbol, size)| {
            (
                symbol.to_string(),
                PositionEntry {
                    size: *size,
                    position_value: size.abs() * 100.0,
                    detail: serde_json::json!({ "symbol": symbol }),
                },
            )
        })
        .collect()
}

#[tokio::test]
async fn test_scan_pipeline_flags_breakout_and_notifies() {
    let _ = tracing_subscriber::fmt::try_init();
    let config = ScanConfig::default();

    // 1. Cache the fetched series through the pair store, like a scan cycle does
    let dir = std::env::temp_dir().join(format!("bollbot-pipeline-{}", std::process::id()));
    let store = PairStore::new(&dir).unwrap();
    store.clear().unwrap();

    let series = spike_series();
    series.validate().unwrap();
    store.save("PUMPUSDT", &series).unwrap();
    let cached = store.load("PUMPUSDT").unwrap();
    assert_eq!(cached.close, series.close);

    // 2. Project annotated rows and inspect the latest one
    let rows = project_rows("PUMPUSDT", &cached, &config);
    assert_eq!(rows.len(), series.len());

    let last = rows.last().unwrap();
    assert_eq!(last.side, Side::Overbought);
    assert_eq!(last.side.code(), 3);
    assert_eq!(last.label, "Top (Overbought)");
    assert!(last.dist_pct.unwrap() >= 7.0);
    assert!(last.upper_band.unwrap() >= last.sma.unwrap());
    assert!(last.lower_band.unwrap() <= last.sma.unwrap());

    // 3. Queue the alert; it stays buffered until a flush tick
    let notifier = TelegramNotifier::with_base_url(
        "http://127.0.0.1:1".to_string(),
        "token".to_string(),
        "chat".to_string(),
    );
    notifier.queue_signal("PUMPUSDT", last).await;
    assert_eq!(notifier.pending_count(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_same_tape_without_volume_stays_quiet() {
    let config = ScanConfig::default();

    let mut series = spike_series();
    // Identical price action, but the breakout candle has average volume
    series.volume = vec![1000.0; series.len()];

    let rows = project_rows("PUMPUSDT", &series, &config);
    let last = rows.last().unwrap();
    assert_eq!(last.side, Side::Neutral);
    assert!(!last.side.is_extreme());
}

#[tokio::test]
async fn test_position_monitor_lifecycle_feeds_notifier() {
    let notifier = TelegramNotifier::with_base_url(
        "http://127.0.0.1:1".to_string(),
        "token".to_string(),
        "chat".to_string(),
    );
    let mut tracker = PositionTracker::new();

    // Cycle 1: a position appears
    let events = tracker.apply_snapshot(snapshot(&[("BTCUSDT", 5.0)]));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, PositionEventKind::Opened);

    // Cycle 2: it grows
    let events = tracker.apply_snapshot(snapshot(&[("BTCUSDT", 8.0)]));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, PositionEventKind::Increased);
    assert_eq!(events[0].delta, Some(3.0));

    // Cycle 3: unchanged snapshot, nothing to report
    let events = tracker.apply_snapshot(snapshot(&[("BTCUSDT", 8.0)]));
    assert!(events.is_empty());

    // Cycle 4: gone entirely
    let events = tracker.apply_snapshot(snapshot(&[]));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, PositionEventKind::Closed);
    assert_eq!(tracker.tracked(), 0);

    notifier.queue_position_event(&events[0]).await;
    assert_eq!(notifier.pending_count(), 1);
}
