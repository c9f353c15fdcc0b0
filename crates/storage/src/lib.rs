#![forbid(unsafe_code)]

//! Durable ledger of write escalations that the capability policy could not decide.

mod ledger;

pub use ledger::*;
