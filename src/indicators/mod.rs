// Technical indicators module
// Index-based windowed indicators over a full price/volume series

pub mod bollinger;
pub mod moving_average;
pub mod rsi;
pub mod volume;

pub use bollinger::{bollinger_bands, calculate_std_dev, Bands};
pub use moving_average::{calculate_ema, calculate_sma};
pub use rsi::calculate_rsi;
pub use volume::calculate_avg_volume;
