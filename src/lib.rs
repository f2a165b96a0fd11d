// Mailing core
pub mod mailing;

// Supporting modules
pub mod config;
pub mod error;
pub mod telemetry;

// Application layer
pub mod api;
pub mod server;
