pub mod auth;
pub mod config;
pub mod declarations;
pub mod error;
pub mod settings;
pub mod telemetry;
pub mod users;
