//! Mock HTTP server.
//!
//! [`MockServer`] binds a local port, routes every request through the
//! [`Dispatcher`] and stops when closed or dropped.

pub mod dispatcher;
pub mod error;

pub use dispatcher::Dispatcher;
pub use error::ServerError;

use crate::config::ServerConfig;
use crate::logger::Logger;
use crate::rules::RuleStore;
use crate::types::rule::{Handler, Rule};
use axum::Router;
use axum_server::Handle;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Running mock server.
///
/// Rules may be added after launch. Call [`MockServer::close`] when done;
/// dropping the handle also stops the listener but does not wait for it.
pub struct MockServer {
    dispatcher: Arc<Dispatcher>,
    addr: SocketAddr,
    url: String,
    config: ServerConfig,
    handle: Handle,
    task: Option<JoinHandle<io::Result<()>>>,
}

impl MockServer {
    /// Launch a server on an ephemeral localhost port with the given rules.
    pub async fn launch(rules: impl IntoIterator<Item = Rule>) -> Result<Self, ServerError> {
        Self::launch_with(ServerConfig::default(), rules).await
    }

    /// Launch a server with the rules loaded from files matching `pattern`.
    #[cfg(feature = "rule-files")]
    pub async fn launch_from_files(pattern: &str) -> Result<Self, ServerError> {
        let rules = crate::config::load_rules(pattern)?;
        Self::launch(rules).await
    }

    /// Launch a server using `config` for the bind address and shutdown timeout.
    pub async fn launch_with(
        config: ServerConfig,
        rules: impl IntoIterator<Item = Rule>,
    ) -> Result<Self, ServerError> {
        let mut store = RuleStore::new();
        store.add_rules(rules);
        let dispatcher = Arc::new(Dispatcher::new(store));

        let bind_addr = config.socket_addr();
        let app = Router::new()
            .fallback(dispatcher::handle)
            .with_state(dispatcher.clone());

        let handle = Handle::new();
        let server = axum_server::bind(bind_addr).handle(handle.clone());
        let mut task = tokio::spawn(server.serve(app.into_make_service()));

        // A failed bind ends the serve task before any address is reported.
        let addr = tokio::select! {
            Some(addr) = handle.listening() => addr,
            result = &mut task => {
                let source = match result {
                    Ok(Err(err)) => err,
                    Ok(Ok(())) => io::Error::other("listener stopped before binding"),
                    Err(err) => io::Error::other(err),
                };
                return Err(ServerError::Bind {
                    addr: bind_addr,
                    source,
                });
            }
        };

        tracing::info!(%addr, rules = dispatcher.rule_count(), "mock server listening");

        Ok(Self {
            dispatcher,
            addr,
            url: format!("http://{addr}"),
            config,
            handle,
            task: Some(task),
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for a path with optional query, e.g. `/hello?dummy=1`.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.url, path_and_query)
    }

    /// Register a static rule answering `method path` with `status` and `body`.
    pub fn add(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.add_rules([Rule::new(method, path).status(status).body(body)])
    }

    /// Register a static rule answering `method path` with `status` and no body.
    pub fn add_empty(&self, method: &str, path: &str, status: u16) -> &Self {
        self.add_rules([Rule::new(method, path).status(status)])
    }

    /// Register rules in order.
    pub fn add_rules(&self, rules: impl IntoIterator<Item = Rule>) -> &Self {
        self.dispatcher.add_rules(rules);
        self
    }

    /// Replace the diagnostic logger, `None` silences it.
    pub fn set_logger(&self, logger: Option<Arc<dyn Logger>>) -> &Self {
        self.dispatcher.set_logger(logger);
        self
    }

    /// Replace the handler for requests matching no rule.
    pub fn set_unknown_handler(&self, handler: Option<Handler>) -> &Self {
        self.dispatcher.set_unknown_handler(handler);
        self
    }

    /// Stop the server and wait for in-flight requests.
    ///
    /// Connections still open after the configured shutdown timeout are
    /// dropped, cancelling their handlers. Closing an already closed server
    /// does nothing.
    pub async fn close(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.handle
            .graceful_shutdown(Some(self.config.shutdown_timeout));

        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(addr = %self.addr, %err, "mock server stopped with error"),
            Err(err) => tracing::warn!(addr = %self.addr, %err, "mock server task failed"),
        }

        tracing::info!(addr = %self.addr, "mock server closed");
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.handle
                .graceful_shutdown(Some(self.config.shutdown_timeout));
        }
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("url", &self.url)
            .field("closed", &self.is_closed())
            .finish()
    }
}
