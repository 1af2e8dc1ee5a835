pub mod agents;
pub mod analyzer;
pub mod app;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod handlers;
pub mod input;
pub mod models;
pub mod rate_limit;
pub mod retry;
pub mod routes;
pub mod state;
pub mod validation;

// Re-export key functions for convenience
pub use analyzer::{BusinessAnalyzer, Services};
pub use app::{create_app, init_tracing};
