// Signal module
// Classifies candles against Bollinger extremes and projects annotated rows

pub mod classifier;
pub mod projector;

pub use classifier::{classify, Classification, IndicatorValues};
pub use projector::project_rows;

/// Configuration for the band scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub band_period: usize,
    pub band_mult: f64,
    pub rsi_period: usize,
    pub volume_period: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    /// Minimum distance past the breached band, percent, after two-decimal
    /// rounding, before a candle counts as an extreme
    pub min_dist_pct: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            band_period: 20,
            band_mult: 2.0,
            rsi_period: 14,
            volume_period: 20,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            min_dist_pct: 7.0,
        }
    }
}
