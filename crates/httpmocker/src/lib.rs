//! Rule-based mock HTTP server for testing HTTP clients.
//!
//! Register `(method, path, query)` rules, launch a [`MockServer`] on an
//! ephemeral port and point the client under test at [`MockServer::url`].
//!
//! ```no_run
//! use httpmocker::{MockServer, Rule};
//!
//! # async fn run() -> Result<(), httpmocker::ServerError> {
//! let mut server = MockServer::launch([
//!     Rule::new("GET", "/hello").status(200).body("hello, world"),
//!     Rule::new("GET", "/hello")
//!         .query("dummy=1")
//!         .body("hello, world with query string"),
//! ])
//! .await?;
//! server.add("POST", "/items", 201, "created");
//!
//! // GET {url}/hello          -> "hello, world"
//! // GET {url}/hello?dummy=1  -> "hello, world with query string"
//! // GET {url}/hello?dummy=2  -> "hello, world"
//! println!("{}", server.url());
//!
//! server.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! Matching: a rule with a non-empty query answers only requests whose raw
//! query string is byte-for-byte equal to it, and the first such rule wins.
//! Otherwise the last registered rule without a query answers. Requests
//! matching nothing go to the unknown-request handler, if one is set.
//!
//! Request paths are percent-decoded before matching, so a rule for `/a b`
//! answers `GET /a%20b`. Query strings are never decoded.
//!
//! The default `rule-files` feature adds [`load_rules`] and
//! [`MockServer::launch_from_files`] for static rules kept in YAML, JSON or
//! JSONC files. Disable default features to drop it and its dependencies.

pub mod config;
pub mod logger;
pub mod rules;
pub mod server;
pub mod types;

pub use config::ServerConfig;
#[cfg(feature = "rule-files")]
pub use config::{load_rules, ConfigError};
pub use logger::{Logger, TracingLogger};
pub use rules::RuleStore;
pub use server::{MockServer, ServerError};
pub use types::{Handler, Responder, Rule, StaticResponse};
