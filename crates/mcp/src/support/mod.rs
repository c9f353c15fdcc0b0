#![forbid(unsafe_code)]

mod ai;
mod args;
mod jsonrpc;
mod logging;
mod policy_file;
mod runtime;

pub(crate) use ai::*;
pub(crate) use args::*;
pub(crate) use jsonrpc::*;
pub(crate) use logging::*;
pub(crate) use policy_file::*;
pub(crate) use runtime::*;
