use crate::models::Series;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// On-disk envelope for one symbol's fetched series
#[derive(Debug, Serialize, Deserialize)]
struct StoredSeries {
    success: bool,
    data: Series,
}

/// Directory of per-symbol candle files, one JSON file per pair.
///
/// The scan loop clears the directory at the start of every cycle and writes
/// each fetched series through it, so a cycle's raw inputs stay inspectable
/// on disk.
pub struct PairStore {
    dir: PathBuf,
}

impl PairStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Remove and recreate the directory, dropping last cycle's files
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        fs::create_dir_all(&self.dir)?;
        tracing::debug!("Pair store cleared at {}", self.dir.display());
        Ok(())
    }

    pub fn path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", symbol))
    }

    pub fn save(&self, symbol: &str, series: &Series) -> Result<()> {
        let stored = StoredSeries {
            success: true,
            data: series.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(self.path(symbol), json)?;
        Ok(())
    }

    pub fn load(&self, symbol: &str) -> Result<Series> {
        let raw = fs::read_to_string(self.path(symbol))?;
        let stored: StoredSeries = serde_json::from_str(&raw)?;
        if !stored.success {
            return Err(format!("stored series for {} is marked unsuccessful", symbol).into());
        }
        Ok(stored.data)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.path(symbol).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> Series {
        Series {
            time: vec![1700000000000, 1700000900000],
            open: vec![100.0, 101.0],
            high: vec![102.0, 103.0],
            low: vec![99.0, 100.5],
            close: vec![101.0, 102.5],
            volume: vec![10.0, 12.0],
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("bollbot-store-{}", std::process::id()));
        let store = PairStore::new(&dir).unwrap();
        store.clear().unwrap();

        let series = sample_series();
        store.save("BTCUSDT", &series).unwrap();
        assert!(store.contains("BTCUSDT"));

        let loaded = store.load("BTCUSDT").unwrap();
        assert_eq!(loaded.time, series.time);
        assert_eq!(loaded.close, series.close);
        assert_eq!(loaded.volume, series.volume);

        store.clear().unwrap();
        assert!(!store.contains("BTCUSDT"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_symbol_fails() {
        let dir = std::env::temp_dir().join(format!("bollbot-store-miss-{}", std::process::id()));
        let store = PairStore::new(&dir).unwrap();
        assert!(store.load("NOPEUSDT").is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
