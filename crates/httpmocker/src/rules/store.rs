//! Rule store for registering and resolving mock rules.
//!
//! Rules are bucketed by method, then by path. Insertion order inside a
//! bucket is kept because it decides which rule answers a request.

use crate::types::rule::Rule;
use std::collections::HashMap;

/// Store of mock rules indexed by method and path.
///
/// `RuleStore` only grows: rules are appended and never removed or replaced.
/// Malformed rules (empty method, unknown path) are accepted and simply never
/// match.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    /// Method -> path -> rules in insertion order
    rules: HashMap<String, HashMap<String, Vec<Rule>>>,
}

impl RuleStore {
    /// Create an empty RuleStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to its `(method, path)` bucket
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules
            .entry(rule.method.clone())
            .or_default()
            .entry(rule.path.clone())
            .or_default()
            .push(rule);
    }

    /// Append multiple rules, keeping their order
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> &mut Self {
        for rule in rules {
            self.add_rule(rule);
        }
        self
    }

    /// Resolve the rule answering `method path?raw_query`.
    ///
    /// The first rule whose non-empty query equals `raw_query` byte for byte
    /// wins. Otherwise the last registered rule with an empty query is used.
    /// Query strings are compared raw, so `a=1&b=2` and `b=2&a=1` differ.
    pub fn find_rule(&self, method: &str, path: &str, raw_query: &str) -> Option<&Rule> {
        let bucket = self.rules.get(method)?.get(path)?;

        let mut candidate = None;
        for rule in bucket.iter().filter(|rule| rule.path == path) {
            if rule.query.is_empty() {
                candidate = Some(rule);
            } else if rule.query == raw_query {
                return Some(rule);
            }
        }

        candidate
    }

    /// Total number of registered rules
    pub fn len(&self) -> usize {
        self.rules
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
