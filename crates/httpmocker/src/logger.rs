//! Pluggable diagnostic logger.

use std::fmt;

/// Sink for the server's diagnostic lines.
///
/// A server has no logger by default and stays silent.
pub trait Logger: Send + Sync {
    fn logf(&self, args: fmt::Arguments<'_>);
}

/// Logger forwarding every line to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn logf(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "httpmocker", "{}", args);
    }
}
