#![forbid(unsafe_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-wide set of absolute paths currently being written.
///
/// Acquisition is all-or-nothing and never waits: if any requested path is held the call
/// reports that path and nothing is taken.
#[derive(Clone, Debug, Default)]
pub struct LockSet {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Releases its paths on drop, on every exit route.
#[derive(Debug)]
pub struct LockGuard {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    paths: Vec<PathBuf>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, paths: &[PathBuf]) -> Result<LockGuard, PathBuf> {
        let mut wanted = paths.to_vec();
        wanted.sort();
        wanted.dedup();

        let mut held = lock(&self.held);
        if let Some(busy) = wanted.iter().find(|p| held.contains(*p)) {
            return Err(busy.clone());
        }
        held.extend(wanted.iter().cloned());
        Ok(LockGuard {
            held: Arc::clone(&self.held),
            paths: wanted,
        })
    }

    pub fn is_locked(&self, path: &PathBuf) -> bool {
        lock(&self.held).contains(path)
    }
}

impl LockGuard {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let mut held = lock(&self.held);
        for path in &self.paths {
            held.remove(path);
        }
    }
}

fn lock(held: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
