//! Declarative rule configuration.

use crate::types::rule::{Responder, Rule, StaticResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One or many values for a response header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl From<HeaderValues> for Vec<String> {
    fn from(values: HeaderValues) -> Self {
        match values {
            HeaderValues::One(value) => vec![value],
            HeaderValues::Many(values) => values,
        }
    }
}

/// Static rule as written in a rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    /// HTTP method, uppercase
    pub method: String,
    /// Exact request path
    pub path: String,
    /// Exact raw query string
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
    /// Status code, omitted means server default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, HeaderValues>>,
    /// Strings are sent verbatim, other values as compact JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl From<RuleConfig> for Rule {
    fn from(config: RuleConfig) -> Self {
        let body = match config.body {
            None => String::new(),
            Some(serde_json::Value::String(body)) => body,
            Some(value) => value.to_string(),
        };
        let headers = config
            .headers
            .unwrap_or_default()
            .into_iter()
            .map(|(name, values)| (name, values.into()))
            .collect();

        Rule {
            method: config.method,
            path: config.path,
            query: config.query,
            response: Responder::Static(StaticResponse {
                status: config.status.unwrap_or(0),
                content_type: config.content_type,
                body,
                headers,
            }),
        }
    }
}
