//! Secure Talk Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other Secure Talk crates:
//! - Application configuration (flow server, document store, model, push)
//! - Global error types covering all error categories
//! - Structured logging with tracing
//! - Platform data directories
//! - Common constants and collection names

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{StError, StResult};
pub use logging::init_logging;
pub use platform::Platform;
