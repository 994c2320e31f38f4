// External API clients
pub mod binance;

pub use binance::BinanceFuturesClient;
