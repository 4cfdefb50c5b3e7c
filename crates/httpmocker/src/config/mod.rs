//! Configuration: server settings and, with the `rule-files` feature,
//! declarative rule files.

#[cfg(feature = "rule-files")]
pub mod error;
#[cfg(feature = "rule-files")]
pub mod parser;
#[cfg(feature = "rule-files")]
pub mod rule;
pub mod server;

#[cfg(feature = "rule-files")]
pub use error::ConfigError;
#[cfg(feature = "rule-files")]
pub use parser::{load_rules, parse_rules};
#[cfg(feature = "rule-files")]
pub use rule::{HeaderValues, RuleConfig};
pub use server::ServerConfig;
