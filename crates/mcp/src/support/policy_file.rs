#![forbid(unsafe_code)]

use pg_core::policy::{CapabilityConfig, PathRule, RuleKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyFile {
    #[serde(default)]
    write_allow: Vec<RuleEntry>,
    #[serde(default)]
    write_deny: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// Read a capability config from JSON or YAML (YAML is a superset, one parser covers both).
pub(crate) fn load_capability_config(path: &Path) -> Result<CapabilityConfig, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("read policy {}: {err}", path.display()))?;
    parse_capability_config(&raw).map_err(|err| format!("policy {}: {err}", path.display()))
}

pub(crate) fn parse_capability_config(raw: &str) -> Result<CapabilityConfig, String> {
    let file: PolicyFile = serde_yaml::from_str(raw).map_err(|err| err.to_string())?;
    Ok(CapabilityConfig {
        write_allow: to_rules(file.write_allow, "write_allow")?,
        write_deny: to_rules(file.write_deny, "write_deny")?,
    })
}

fn to_rules(entries: Vec<RuleEntry>, list: &str) -> Result<Vec<PathRule>, String> {
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let kind = RuleKind::parse(entry.kind.trim()).ok_or_else(|| {
                format!(
                    "{list}[{idx}]: unknown rule type {:?} (expected directory|file|extension)",
                    entry.kind
                )
            })?;
            if entry.value.trim().is_empty() {
                return Err(format!("{list}[{idx}]: value must not be empty"));
            }
            Ok(PathRule {
                kind,
                value: entry.value.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_rules() {
        let config = parse_capability_config(
            "write_allow:\n  - type: directory\n    value: src\n  - type: extension\n    value: .md\nwrite_deny:\n  - type: file\n    value: src/secrets.rs\n",
        )
        .expect("yaml");
        assert_eq!(
            config.write_allow,
            vec![PathRule::directory("src"), PathRule::extension(".md")]
        );
        assert_eq!(config.write_deny, vec![PathRule::file("src/secrets.rs")]);
    }

    #[test]
    fn parses_json_rules_and_defaults_missing_lists() {
        let config =
            parse_capability_config(r#"{ "write_allow": [{ "type": "file", "value": "a.txt" }] }"#)
                .expect("json");
        assert_eq!(config.write_allow, vec![PathRule::file("a.txt")]);
        assert!(config.write_deny.is_empty());
    }

    #[test]
    fn rejects_unknown_rule_type() {
        let err = parse_capability_config(r#"{ "write_deny": [{ "type": "glob", "value": "*" }] }"#)
            .expect_err("bad type");
        assert!(err.contains("write_deny[0]"), "{err}");
    }
}
