/// Calculate Relative Strength Index (RSI) at `index`
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions.
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Needs `period` trailing differences, i.e. `period + 1` samples ending at
/// `index`. Saturates at exactly 100 when the trailing losses sum to zero.
pub fn calculate_rsi(values: &[f64], period: usize, index: usize) -> Option<f64> {
    if index + 1 < period + 1 || index >= values.len() {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;

    for i in index + 1 - period..=index {
        let diff = values[i] - values[i - 1];
        if diff >= 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0); // avoid division by zero
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
