use super::ScanConfig;
use crate::models::Side;

pub const LABEL_WARMUP: &str = "-";
pub const LABEL_MIDDLE: &str = "Middle";
pub const LABEL_TOP: &str = "Top (Overbought)";
pub const LABEL_BOTTOM: &str = "Bottom (Oversold)";

/// Indicator values for one candle, each absent while its window warms up
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorValues {
    pub sma: Option<f64>,
    pub std_dev: Option<f64>,
    pub upper_band: Option<f64>,
    pub lower_band: Option<f64>,
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub avg_volume: Option<f64>,
}

/// Classification outcome for one candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: &'static str,
    pub dist_pct: Option<f64>,
    pub side: Side,
}

impl Classification {
    fn warming_up() -> Self {
        Self {
            label: LABEL_WARMUP,
            dist_pct: None,
            side: Side::Neutral,
        }
    }

    fn middle() -> Self {
        Self {
            label: LABEL_MIDDLE,
            dist_pct: Some(0.0),
            side: Side::Neutral,
        }
    }
}

/// Round to two decimal places.
///
/// The `>= min_dist_pct` threshold is applied to the rounded value, not the
/// raw one, so a raw 6.995% rounds to 7.00 and passes. Rounding here is part
/// of the classification semantics, not display formatting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Classify one candle against its indicator values.
///
/// Mutually exclusive outcomes, evaluated in order:
/// 1. any of SMA/EMA/RSI absent → warmup row, no distance
/// 2. close at/above the upper band, RSI overbought, volume above average,
///    rounded distance ≥ threshold → Overbought
/// 3. the symmetric check against the lower band → Oversold
/// 4. everything else → Middle, distance 0
pub fn classify(close: f64, volume: f64, values: &IndicatorValues, config: &ScanConfig) -> Classification {
    let (Some(_sma), Some(_ema), Some(rsi)) = (values.sma, values.ema, values.rsi) else {
        return Classification::warming_up();
    };
    // Bands derive from the SMA, so they are present whenever it is
    let (Some(upper), Some(lower)) = (values.upper_band, values.lower_band) else {
        return Classification::warming_up();
    };

    let volume_confirmed = values.avg_volume.is_some_and(|avg| volume > avg);

    if close >= upper && rsi > config.rsi_overbought && volume_confirmed {
        let percent = round2((close - upper) / upper * 100.0);
        if percent >= config.min_dist_pct {
            return Classification {
                label: LABEL_TOP,
                dist_pct: Some(percent),
                side: Side::Overbought,
            };
        }
    } else if close <= lower && rsi < config.rsi_oversold && volume_confirmed {
        let percent = round2((lower - close) / lower * 100.0);
        if percent >= config.min_dist_pct {
            return Classification {
                label: LABEL_BOTTOM,
                dist_pct: Some(percent),
                side: Side::Oversold,
            };
        }
    }

    Classification::middle()
}
