//! Core domain types for mock rules.

pub mod rule;

pub use rule::{Handler, Responder, Rule, StaticResponse};
