use super::moving_average::calculate_sma;

/// Calculate population standard deviation of the trailing window ending at `index`
///
/// The mean is recomputed over the same window `calculate_sma` uses, so the
/// derived bands always bracket the SMA they are drawn around.
pub fn calculate_std_dev(values: &[f64], period: usize, index: usize) -> Option<f64> {
    if index + 1 < period || index >= values.len() {
        return None;
    }

    let mean = calculate_sma(values, period, index)?;
    let sum_sq: f64 = values[index + 1 - period..=index]
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum();

    Some((sum_sq / period as f64).sqrt())
}

/// Bollinger bands around the SMA at one index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub lower: f64,
}

/// Derive Bollinger bands: SMA ± `mult` standard deviations.
///
/// Absent whenever the SMA is absent.
pub fn bollinger_bands(values: &[f64], period: usize, index: usize, mult: f64) -> Option<Bands> {
    let sma = calculate_sma(values, period, index)?;
    let sd = calculate_std_dev(values, period, index)?;

    Some(Bands {
        upper: sma + mult * sd,
        lower: sma - mult * sd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev_constant_series() {
        let prices = vec![5.0; 10];
        assert_eq!(calculate_std_dev(&prices, 5, 9), Some(0.0));
    }

    #[test]
    fn test_std_dev_known_window() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: population stdev = 2
        let prices = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = calculate_std_dev(&prices, 8, 7).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_insufficient_data() {
        let prices = vec![1.0, 2.0, 3.0];
        assert!(calculate_std_dev(&prices, 5, 2).is_none());
    }

    #[test]
    fn test_bands_bracket_sma() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        for index in 19..30 {
            let sma = calculate_sma(&prices, 20, index).unwrap();
            let bands = bollinger_bands(&prices, 20, index, 2.0).unwrap();
            assert!(bands.lower <= sma && sma <= bands.upper);
        }
    }

    #[test]
    fn test_bands_absent_before_window_fills() {
        let prices = vec![100.0; 10];
        assert!(bollinger_bands(&prices, 20, 9, 2.0).is_none());
    }
}
