pub mod admin;
pub mod health;

pub use admin::api_config;
pub use health::{AppStartTime, health_routes};
