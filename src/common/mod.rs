//! Common Infrastructure Module
//!
//! Shared utilities for the deposit core:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigError, PoolConfig};
pub use error::{ErrorKind, PoolError, Result};
pub use logging::{init_logging, LogLevel, LoggingError};
