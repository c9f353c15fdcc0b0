#![forbid(unsafe_code)]

//! Unified diff parsing and strict hunk application.

mod apply;
mod parse;

pub use apply::*;
pub use parse::*;

pub const DEV_NULL: &str = "/dev/null";

/// One file's section of a unified diff.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Name on the `---` side, verbatim apart from a stripped timestamp.
    pub old_name: Option<String>,
    /// Name on the `+++` side.
    pub new_name: Option<String>,
    pub hunks: Vec<Hunk>,
    /// Source named by a git `rename from` header.
    pub rename_from: Option<String>,
    /// Source named by a git `copy from` header.
    pub copy_from: Option<String>,
    /// A git `new file mode` or `deleted file mode` header was present.
    pub declares_mode: bool,
}

impl FileDiff {
    pub fn old_is_null(&self) -> bool {
        self.old_name.as_deref() == Some(DEV_NULL)
    }

    pub fn new_is_null(&self) -> bool {
        self.new_name.as_deref() == Some(DEV_NULL)
    }

    pub fn is_rename_or_copy(&self) -> bool {
        self.rename_from.is_some() || self.copy_from.is_some()
    }

    /// The name the change lands on: the new side, unless the file is being deleted.
    pub fn target_name(&self) -> Option<&str> {
        let new = self.new_name.as_deref().filter(|n| *n != DEV_NULL);
        let old = self.old_name.as_deref().filter(|n| *n != DEV_NULL);
        new.or(old).filter(|n| !n.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
    /// `\ No newline at end of file` followed the last old-side line.
    pub old_missing_newline: bool,
    /// `\ No newline at end of file` followed the last new-side line.
    pub new_missing_newline: bool,
}

impl Hunk {
    pub fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(text) | HunkLine::Remove(text) => Some(text.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    pub fn new_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(text) | HunkLine::Add(text) => Some(text.as_str()),
                HunkLine::Remove(_) => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Remove(String),
    Add(String),
}
