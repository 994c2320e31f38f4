// Core modules
pub mod api;
pub mod indicators;
pub mod models;
pub mod notify;
pub mod positions;
pub mod signal;
pub mod store;

// Re-export commonly used types
pub use models::*;
pub use signal::project_rows;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
