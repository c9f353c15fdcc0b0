#![forbid(unsafe_code)]

use crate::paths::normalize_relative_path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Directory,
    File,
    Extension,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Directory => "directory",
            RuleKind::File => "file",
            RuleKind::Extension => "extension",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "directory" | "dir" => Some(Self::Directory),
            "file" => Some(Self::File),
            "extension" | "ext" => Some(Self::Extension),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathRule {
    pub kind: RuleKind,
    pub value: String,
}

impl PathRule {
    pub fn directory(value: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Directory,
            value: value.into(),
        }
    }

    pub fn file(value: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::File,
            value: value.into(),
        }
    }

    pub fn extension(value: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Extension,
            value: value.into(),
        }
    }

    /// Directory and file values are path-normalized; extension values are suffixes and stay
    /// verbatim.
    pub(crate) fn normalized(self) -> Self {
        match self.kind {
            RuleKind::Extension => self,
            RuleKind::Directory | RuleKind::File => Self {
                kind: self.kind,
                value: normalize_relative_path(&self.value),
            },
        }
    }

    /// `path` must already be normalized.
    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            RuleKind::Directory => {
                if self.value.is_empty() {
                    return false;
                }
                path == self.value
                    || path
                        .strip_prefix(self.value.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            RuleKind::File => path == self.value,
            RuleKind::Extension => !self.value.is_empty() && path.ends_with(self.value.as_str()),
        }
    }
}

impl std::fmt::Display for PathRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityConfig {
    pub write_allow: Vec<PathRule>,
    pub write_deny: Vec<PathRule>,
}

impl CapabilityConfig {
    pub fn empty() -> Self {
        Self {
            write_allow: Vec::new(),
            write_deny: Vec::new(),
        }
    }
}

impl Default for CapabilityConfig {
    /// Protects imported assets, VCS metadata and build output; opens the editor-facing
    /// source trees and resource formats.
    fn default() -> Self {
        Self {
            write_allow: vec![
                PathRule::directory("addons"),
                PathRule::directory("server"),
                PathRule::directory("docs"),
                PathRule::directory("project-manager"),
                PathRule::file("README.md"),
                PathRule::file("project.godot"),
                PathRule::extension(".gd"),
                PathRule::extension(".tscn"),
                PathRule::extension(".tres"),
            ],
            write_deny: vec![
                PathRule::directory(".git"),
                PathRule::directory("server/node_modules"),
                PathRule::directory("server/dist"),
                PathRule::extension(".import"),
            ],
        }
    }
}
