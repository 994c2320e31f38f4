/// Calculate Simple Moving Average (SMA) for the trailing window ending at `index`
///
/// Returns `None` until the window is fully populated (`index + 1 < period`).
pub fn calculate_sma(values: &[f64], period: usize, index: usize) -> Option<f64> {
    if index + 1 < period || index >= values.len() {
        return None;
    }

    let window = &values[index + 1 - period..=index];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Calculate Exponential Moving Average (EMA) at `index`, given the EMA from
/// the previous index.
///
/// Smoothing constant is `k = 2 / (period + 1)`. The first value at the index
/// where the window fills is seeded with the SMA at that index; after that the
/// caller threads `prev_ema` forward across ascending indices. The function
/// itself is stateless per call.
pub fn calculate_ema(
    values: &[f64],
    period: usize,
    index: usize,
    prev_ema: Option<f64>,
) -> Option<f64> {
    if index + 1 < period || index >= values.len() {
        return None;
    }

    let k = 2.0 / (period as f64 + 1.0);

    match prev_ema {
        // Start EMA with SMA for the first full window
        None => calculate_sma(values, period, index),
        Some(prev) => Some(values[index] * k + prev * (1.0 - k)),
    }
}
