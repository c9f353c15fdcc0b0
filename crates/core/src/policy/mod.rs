#![forbid(unsafe_code)]

mod rules;

pub use rules::*;

use crate::paths::normalize_relative_path;

/// How a file is about to be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteMode {
    Create,
    Modify,
    Delete,
}

impl WriteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteMode::Create => "create",
            WriteMode::Modify => "modify",
            WriteMode::Delete => "delete",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "create" => Some(Self::Create),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a capability check.
///
/// `Ambiguous` is not a soft allow: it means no rule spoke for the path and a human has to
/// decide through the escalation ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed { rule: PathRule },
    Denied { rule: PathRule },
    Ambiguous,
}

impl PolicyDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDecision::Allowed { .. } => "allowed",
            PolicyDecision::Denied { .. } => "denied",
            PolicyDecision::Ambiguous => "ambiguous",
        }
    }
}

/// Static allow/deny rule set for automated writes. Deny always wins.
#[derive(Clone, Debug)]
pub struct CapabilityPolicy {
    write_allow: Vec<PathRule>,
    write_deny: Vec<PathRule>,
}

impl CapabilityPolicy {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            write_allow: config.write_allow.into_iter().map(PathRule::normalized).collect(),
            write_deny: config.write_deny.into_iter().map(PathRule::normalized).collect(),
        }
    }

    pub fn allow_rules(&self) -> &[PathRule] {
        &self.write_allow
    }

    pub fn deny_rules(&self) -> &[PathRule] {
        &self.write_deny
    }

    /// Decide whether `relative_path` may be written with `mode`.
    ///
    /// The mode does not change the verdict today; it is accepted so callers record it with the
    /// decision and so mode-scoped rules can be added without touching call sites.
    pub fn evaluate(&self, relative_path: &str, _mode: WriteMode) -> PolicyDecision {
        let normalized = normalize_relative_path(relative_path);

        if let Some(rule) = first_match(&self.write_deny, &normalized) {
            return PolicyDecision::Denied { rule: rule.clone() };
        }
        if let Some(rule) = first_match(&self.write_allow, &normalized) {
            return PolicyDecision::Allowed { rule: rule.clone() };
        }
        PolicyDecision::Ambiguous
    }
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self::new(CapabilityConfig::default())
    }
}

fn first_match<'a>(rules: &'a [PathRule], normalized: &str) -> Option<&'a PathRule> {
    rules.iter().find(|rule| rule.matches(normalized))
}
