#![forbid(unsafe_code)]

use pg_core::policy::WriteMode;
use std::path::PathBuf;
use time::OffsetDateTime;

/// One file's worth of change, fully computed at preview time.
#[derive(Clone, Debug)]
pub struct FilePlan {
    pub absolute_path: PathBuf,
    /// Inside the project root; checked once when the plan is built.
    pub relative_path: String,
    pub mode: WriteMode,
    /// Empty for `create`.
    pub original_content: String,
    /// Unused for `delete`.
    pub patched_content: String,
    pub existed_before: bool,
}

#[derive(Clone, Debug)]
pub struct PatchSession {
    pub id: String,
    pub raw_diff: String,
    pub diff_sha256: String,
    pub file_plans: Vec<FilePlan>,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSummary {
    pub path: String,
    pub mode: WriteMode,
    pub original_size: usize,
    pub patched_size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchPreview {
    pub patch_id: String,
    pub files: Vec<FileSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedFile {
    pub path: String,
    pub mode: WriteMode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchApplied {
    pub patch_id: String,
    pub applied_files: Vec<AppliedFile>,
}

impl From<&FilePlan> for FileSummary {
    fn from(plan: &FilePlan) -> Self {
        Self {
            path: plan.relative_path.clone(),
            mode: plan.mode,
            original_size: plan.original_content.len(),
            patched_size: match plan.mode {
                WriteMode::Delete => 0,
                WriteMode::Create | WriteMode::Modify => plan.patched_content.len(),
            },
        }
    }
}

impl From<&FilePlan> for AppliedFile {
    fn from(plan: &FilePlan) -> Self {
        Self {
            path: plan.relative_path.clone(),
            mode: plan.mode,
        }
    }
}
