//! Rule registration and request matching.
//!
//! - [`RuleStore`]: stores rules by method and path and resolves a request to a rule

pub mod store;

pub use store::RuleStore;
