#![forbid(unsafe_code)]

use super::{LedgerError, LedgerState};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Read the whole ledger. A missing file is an empty ledger; any other failure is logged and
/// also degrades to empty so callers keep working.
pub(crate) fn load_state(path: &Path) -> LedgerState {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return LedgerState::default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "failed to read escalation ledger");
            return LedgerState::default();
        }
    };
    if raw.trim().is_empty() {
        return LedgerState::default();
    }

    match serde_json::from_str::<LedgerState>(&raw) {
        Ok(state) => state,
        Err(err) => {
            let aside = preserve_unreadable(path, &raw);
            tracing::warn!(
                path = %path.display(),
                preserved = ?aside,
                error = %err,
                "failed to parse escalation ledger"
            );
            LedgerState::default()
        }
    }
}

/// Rewrite the whole ledger: temp sibling first, then rename over the target.
pub(crate) fn save_state(path: &Path, state: &LedgerState) -> Result<(), LedgerError> {
    let mut serialized = serde_json::to_string_pretty(state)?;
    serialized.push('\n');

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let tmp = temp_sibling(path);
    if let Err(source) = std::fs::write(&tmp, serialized.as_bytes()) {
        let _ = std::fs::remove_file(&tmp);
        return Err(LedgerError::Io { path: tmp, source });
    }
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(LedgerError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "ledger".to_string());
    path.with_file_name(format!("{name}.tmp-{}", uuid::Uuid::new_v4()))
}

// The next save rewrites the file from an empty state, so keep the unreadable bytes around for a
// human to recover. Repeated loads of the same bytes reuse the existing copy.
fn preserve_unreadable(path: &Path, raw: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy().to_string();
    let prefix = format!("{name}.corrupt-");
    if let Some(existing) = existing_copy(path, &prefix, raw) {
        return Some(existing);
    }
    let ts_ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let aside = path.with_file_name(format!("{prefix}{ts_ms}"));
    std::fs::write(&aside, raw.as_bytes()).ok()?;
    Some(aside)
}

fn existing_copy(path: &Path, prefix: &str, raw: &str) -> Option<PathBuf> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .find(|candidate| {
            std::fs::read_to_string(candidate).is_ok_and(|content| content == raw)
        })
}
