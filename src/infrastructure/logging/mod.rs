//! Logging infrastructure: structured stdout logging via tracing-subscriber.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat};
pub use logger::LoggerImpl;
