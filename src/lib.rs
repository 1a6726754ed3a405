//! mx4j-collector library
//!
//! This crate provides the core functionality for periodically collecting
//! JMX metrics from JVM services exposing the MX4J HTTP/XML management
//! interface and republishing them as flat, dotted-path key/value pairs.
//! The interval scheduler driving the collection cycle and the metric
//! pipeline behind the publish sink are host concerns.

pub mod collector;
pub mod config;
pub mod error;
pub mod sink;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging subsystem
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
