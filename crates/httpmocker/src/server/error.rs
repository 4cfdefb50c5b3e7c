//! Error types for launching the mock server.

#[cfg(feature = "rule-files")]
use crate::config::ConfigError;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Mock server launch error
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Rules could not be loaded
    #[cfg(feature = "rule-files")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}
