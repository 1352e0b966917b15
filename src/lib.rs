pub mod config;
pub mod error;
pub mod types;
pub mod gateway;
pub mod server;
pub mod providers;
pub mod metrics;

pub use error::CompassGateError;
pub type Result<T> = std::result::Result<T, CompassGateError>;
