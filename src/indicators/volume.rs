/// Average volume over the trailing window ending at `index`
///
/// Same sliding-window mean as the SMA, applied to volume.
pub fn calculate_avg_volume(volumes: &[f64], period: usize, index: usize) -> Option<f64> {
    if index + 1 < period || index >= volumes.len() {
        return None;
    }

    let window = &volumes[index + 1 - period..=index];
    Some(window.iter().sum::<f64>() / period as f64)
}
