pub mod ai;
pub mod auth;
pub mod geocoding;
pub mod reports;
pub mod workers;
