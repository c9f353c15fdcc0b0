#![forbid(unsafe_code)]

//! Transactional application of unified diffs under a capability policy.
//!
//! A diff is first previewed: every file is resolved inside the project root, patched in memory,
//! and checked against the policy (with ambiguous paths filed in the escalation ledger). Applying
//! a preview writes each file atomically and rolls every change back if any step fails.

pub mod diff;
mod error;
mod fsops;
mod locks;
mod manager;
mod rollback;
mod types;

pub use error::*;
pub use locks::{LockGuard, LockSet};
pub use manager::*;
pub use rollback::*;
pub use types::*;
