//! The on-disk rule shape: a `pattern`, a `metric_key` template, and an
//! optional map of per-tag custom regexes.
//!
//! ```yaml
//! rules:
//!   - pattern: "servers.%host%.cpu.%stat%"
//!     metric_key: "server.cpu"
//!     regex: { stat: "user|system|idle" }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::RuleError;

/// One YAML rule entry, deserialized directly from the rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRule {
    pub pattern: String,
    pub metric_key: String,
    #[serde(default, rename = "regex")]
    pub regex_overrides: HashMap<String, String>,
}

/// The top-level rule file shape: an ordered list of [`RawRule`]s. Order is
/// significant: forward matching picks the first rule whose regex matches.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleFile {
    pub rules: Vec<RawRule>,
}

impl RuleFile {
    /// Parse a rule file from its YAML text.
    pub fn parse_yaml(yaml: &str) -> Result<Self, RuleError> {
        serde_yaml::from_str(yaml).map_err(|e| RuleError::InvalidYaml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rule_file() {
        let yaml = r#"
rules:
  - pattern: "prefix.%foo%"
    metric_key: "test-metric"
"#;
        let file = RuleFile::parse_yaml(yaml).unwrap();
        assert_eq!(file.rules.len(), 1);
        assert_eq!(file.rules[0].pattern, "prefix.%foo%");
        assert!(file.rules[0].regex_overrides.is_empty());
    }

    #[test]
    fn parses_regex_overrides() {
        let yaml = r#"
rules:
  - pattern: "servers.%host%.cpu.%stat%"
    metric_key: "server.cpu"
    regex:
      stat: "user|system|idle"
"#;
        let file = RuleFile::parse_yaml(yaml).unwrap();
        assert_eq!(file.rules[0].regex_overrides.get("stat").unwrap(), "user|system|idle");
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = RuleFile::parse_yaml("not: [valid, yaml: :").unwrap_err();
        assert!(matches!(err, RuleError::InvalidYaml(_)));
    }
}
