use super::classifier::{classify, IndicatorValues};
use super::ScanConfig;
use crate::indicators::{
    bollinger_bands, calculate_avg_volume, calculate_ema, calculate_rsi, calculate_sma,
    calculate_std_dev,
};
use crate::models::{Series, SignalRow};
use chrono::{FixedOffset, TimeZone, Utc};

// Display timestamps in Gulf Standard Time, 24-hour clock
const DISPLAY_UTC_OFFSET_HOURS: i32 = 4;

/// Run the indicator engine and classifier across a full series, producing
/// one annotated row per candle.
///
/// A single ascending pass threads the EMA carry from index to index; no
/// state survives the call, so recomputing from scratch each cycle is always
/// valid. An empty series yields an empty row sequence.
pub fn project_rows(symbol: &str, series: &Series, config: &ScanConfig) -> Vec<SignalRow> {
    let closes = &series.close;
    let volumes = &series.volume;

    let mut ema_prev: Option<f64> = None;
    let mut rows = Vec::with_capacity(series.len());

    for i in 0..series.len() {
        let sma = calculate_sma(closes, config.band_period, i);
        let std_dev = calculate_std_dev(closes, config.band_period, i);
        let bands = bollinger_bands(closes, config.band_period, i, config.band_mult);

        let ema = calculate_ema(closes, config.band_period, i, ema_prev);
        if ema.is_some() {
            ema_prev = ema;
        }

        let rsi = calculate_rsi(closes, config.rsi_period, i);
        let avg_volume = calculate_avg_volume(volumes, config.volume_period, i);

        let values = IndicatorValues {
            sma,
            std_dev,
            upper_band: bands.map(|b| b.upper),
            lower_band: bands.map(|b| b.lower),
            ema,
            rsi,
            avg_volume,
        };

        let classification = classify(closes[i], volumes[i], &values, config);

        rows.push(SignalRow {
            symbol: symbol.to_string(),
            time: format_time(series.time[i]),
            close: closes[i],
            volume: volumes[i],
            sma: values.sma,
            std_dev: values.std_dev,
            upper_band: values.upper_band,
            lower_band: values.lower_band,
            ema: values.ema,
            rsi: values.rsi,
            avg_volume: values.avg_volume,
            label: classification.label,
            dist_pct: classification.dist_pct,
            side: classification.side,
        });
    }

    rows
}

fn format_time(epoch_millis: i64) -> String {
    let offset =
        FixedOffset::east_opt(DISPLAY_UTC_OFFSET_HOURS * 3600).expect("constant offset is valid");

    match Utc.timestamp_millis_opt(epoch_millis) {
        chrono::LocalResult::Single(dt) => dt
            .with_timezone(&offset)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string(),
        _ => epoch_millis.to_string(),
    }
}
