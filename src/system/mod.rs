//! System-level modules
//!
//! - Logging initialisation (tracing subscriber + appender)

pub mod logging;

pub use logging::init_logging;
