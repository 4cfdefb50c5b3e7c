//! Rule file parsing (YAML/JSON/JSONC).

use crate::config::error::ConfigError;
use crate::config::rule::RuleConfig;
use crate::types::rule::Rule;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Config file type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileType {
    Yaml,
    Json,
    Jsonc,
    Unknown,
}

/// Get config file type from path extension
pub fn get_file_type(path: &str) -> ConfigFileType {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "yaml" | "yml" => ConfigFileType::Yaml,
        "json" => ConfigFileType::Json,
        "jsonc" => ConfigFileType::Jsonc,
        _ => ConfigFileType::Unknown,
    }
}

/// Strip `//` and `/* */` comments outside of string literals
pub fn strip_json_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                // Keep the newline so line numbers in errors stay right.
                for c in chars.by_ref() {
                    if c == '\n' || c == '\r' {
                        result.push(c);
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Parse config content based on file type
pub fn parse_config<T: DeserializeOwned>(content: &str, path: &str) -> Result<T, ConfigError> {
    match get_file_type(path) {
        ConfigFileType::Yaml => Ok(serde_yaml::from_str(content)?),
        ConfigFileType::Json => Ok(serde_json::from_str(content)?),
        ConfigFileType::Jsonc => Ok(serde_json::from_str(&strip_json_comments(content))?),
        ConfigFileType::Unknown => Err(ConfigError::UnknownFileType(path.to_string())),
    }
}

/// Parse a rule file's content into rules, in document order.
///
/// The document is a list of rule entries; `path` only selects the format.
pub fn parse_rules(content: &str, path: &str) -> Result<Vec<Rule>, ConfigError> {
    let configs: Vec<RuleConfig> = parse_config(content, path)?;
    Ok(configs.into_iter().map(Rule::from).collect())
}

/// Load rules from every file matching a glob pattern.
///
/// Files are read in the glob's (alphabetical) order so rule order, which
/// decides matching ties, is stable.
pub fn load_rules(pattern: &str) -> Result<Vec<Rule>, ConfigError> {
    let mut rules = Vec::new();

    for entry in glob::glob(pattern)? {
        let path = entry?;
        let file_name = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: file_name.clone(),
            source,
        })?;

        let loaded = parse_rules(&content, &file_name)?;
        tracing::debug!(file = %file_name, rules = loaded.len(), "loaded rule file");
        rules.extend(loaded);
    }

    Ok(rules)
}
