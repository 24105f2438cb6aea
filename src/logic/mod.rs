pub mod coordinator;
pub mod hub;

pub use hub::ForecastHub;
