pub mod auth;
pub mod config;
pub mod persistence;
pub mod telemetry;
