#![forbid(unsafe_code)]

use std::io::ErrorKind;
use std::path::PathBuf;

/// One reversible step recorded while applying a patch.
#[derive(Clone, Debug)]
pub enum UndoOp {
    /// The file existed with this content before the step.
    RestoreContent { path: PathBuf, content: String },
    /// The step created the file.
    RemoveFile { path: PathBuf },
    /// The step created the directory.
    RemoveDir { path: PathBuf },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollbackReport {
    pub reverted: usize,
    pub failures: Vec<String>,
}

impl RollbackReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Undo `ops` newest-first. Never stops early; every failure lands in the report.
pub fn rollback(ops: Vec<UndoOp>) -> RollbackReport {
    let mut report = RollbackReport::default();
    for op in ops.into_iter().rev() {
        match undo(&op) {
            Ok(()) => report.reverted += 1,
            Err(err) => {
                tracing::error!(?op, error = %err, "rollback step failed");
                report.failures.push(format!("{}: {err}", describe(&op)));
            }
        }
    }
    report
}

fn undo(op: &UndoOp) -> std::io::Result<()> {
    match op {
        UndoOp::RestoreContent { path, content } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
        }
        UndoOp::RemoveFile { path } => match std::fs::remove_file(path) {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        },
        UndoOp::RemoveDir { path } => match std::fs::remove_dir(path) {
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty
                ) =>
            {
                Ok(())
            }
            other => other,
        },
    }
}

fn describe(op: &UndoOp) -> String {
    match op {
        UndoOp::RestoreContent { path, .. } => format!("restore {}", path.display()),
        UndoOp::RemoveFile { path } => format!("remove file {}", path.display()),
        UndoOp::RemoveDir { path } => format!("remove dir {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_reverts_in_reverse_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("new");
        let created = nested.join("f.txt");
        let modified = dir.path().join("m.txt");

        std::fs::write(&modified, "after").expect("seed modified");
        std::fs::create_dir(&nested).expect("mkdir");
        std::fs::write(&created, "fresh").expect("seed created");

        let report = rollback(vec![
            UndoOp::RestoreContent {
                path: modified.clone(),
                content: "before".to_string(),
            },
            UndoOp::RemoveDir {
                path: nested.clone(),
            },
            UndoOp::RemoveFile {
                path: created.clone(),
            },
        ]);

        assert!(report.is_clean(), "{report:?}");
        assert_eq!(report.reverted, 3);
        assert_eq!(std::fs::read_to_string(&modified).expect("read"), "before");
        assert!(!created.exists());
        assert!(!nested.exists());
    }

    #[test]
    fn rollback_tolerates_already_missing_entries() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = rollback(vec![
            UndoOp::RemoveDir {
                path: dir.path().join("gone"),
            },
            UndoOp::RemoveFile {
                path: dir.path().join("gone.txt"),
            },
        ]);
        assert!(report.is_clean());
        assert_eq!(report.reverted, 2);
    }

    #[test]
    fn rollback_keeps_non_empty_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("shared");
        std::fs::create_dir(&nested).expect("mkdir");
        std::fs::write(nested.join("other.txt"), "keep").expect("seed");

        let report = rollback(vec![UndoOp::RemoveDir {
            path: nested.clone(),
        }]);
        assert!(report.is_clean());
        assert!(nested.join("other.txt").exists());
    }
}
