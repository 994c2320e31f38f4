use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One OHLCV candlestick for a fixed time bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub time: i64, // epoch millis
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle series for one symbol, stored as index-aligned parallel arrays.
///
/// Index `i` refers to the same candle in every array; all arrays must have
/// equal length. Candles are time-ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Series {
    pub time: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    #[serde(rename = "vol")]
    pub volume: Vec<f64>,
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("parallel arrays have mismatched lengths (time={time}, open={open}, high={high}, low={low}, close={close}, volume={volume})")]
    LengthMismatch {
        time: usize,
        open: usize,
        high: usize,
        low: usize,
        close: usize,
        volume: usize,
    },
    #[error("non-finite value in {field} at index {index}")]
    NonFinite { field: &'static str, index: usize },
}

impl Series {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Check the parallel-array invariant and reject NaN/infinite values.
    ///
    /// The indicator functions are total over well-formed input; this is the
    /// one gate where a malformed payload fails fast instead of leaking NaN
    /// through the SMA/stdev/RSI chain.
    pub fn validate(&self) -> std::result::Result<(), SeriesError> {
        let n = self.time.len();
        if [
            self.open.len(),
            self.high.len(),
            self.low.len(),
            self.close.len(),
            self.volume.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(SeriesError::LengthMismatch {
                time: n,
                open: self.open.len(),
                high: self.high.len(),
                low: self.low.len(),
                close: self.close.len(),
                volume: self.volume.len(),
            });
        }

        for (field, values) in [
            ("open", &self.open),
            ("high", &self.high),
            ("low", &self.low),
            ("close", &self.close),
            ("volume", &self.volume),
        ] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(SeriesError::NonFinite { field, index });
            }
        }

        Ok(())
    }

    pub fn candle(&self, index: usize) -> Option<Candle> {
        if index >= self.len() {
            return None;
        }
        Some(Candle {
            time: self.time[index],
            open: self.open[index],
            high: self.high[index],
            low: self.low[index],
            close: self.close[index],
            volume: self.volume[index],
        })
    }
}

/// Which extreme (if any) a candle closed in.
///
/// The numeric codes (1 = bottom, 3 = top) are wire values carried through
/// to the notification layer; treat them as opaque identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Neutral,
    Oversold,
    Overbought,
}

impl Side {
    pub fn code(&self) -> u8 {
        match self {
            Side::Neutral => 0,
            Side::Oversold => 1,
            Side::Overbought => 3,
        }
    }

    /// True for the two extreme states that trigger a notification.
    pub fn is_extreme(&self) -> bool {
        !matches!(self, Side::Neutral)
    }
}

/// One fully annotated candle: raw close/volume, every indicator value and
/// the classification outcome for that index.
#[derive(Debug, Clone, Serialize)]
pub struct SignalRow {
    pub symbol: String,
    pub time: String, // formatted local timestamp
    pub close: f64,
    pub volume: f64,
    pub sma: Option<f64>,
    pub std_dev: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub avg_volume: Option<f64>,
    pub label: &'static str,
    /// Distance past the breached band, percent, rounded to two decimals.
    /// None while indicators are still warming up.
    pub dist_pct: Option<f64>,
    pub side: Side,
}

/// One instrument's entry in an account position snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEntry {
    pub size: f64, // signed: positive = long, negative = short
    pub position_value: f64,
    /// Raw exchange payload, kept opaque for the notification layer
    pub detail: serde_json::Value,
}

/// Full account snapshot, replaced wholesale each polling cycle
pub type PositionSnapshot = HashMap<String, PositionEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionEventKind {
    Opened,
    Increased,
    Closed,
}

/// Lifecycle event derived by diffing two successive snapshots
#[derive(Debug, Clone, Serialize)]
pub struct PositionEvent {
    pub kind: PositionEventKind,
    pub symbol: String,
    pub detail: serde_json::Value,
    pub delta: Option<f64>,
}
