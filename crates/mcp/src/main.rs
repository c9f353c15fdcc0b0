#![forbid(unsafe_code)]

mod entry;
mod server;
mod support;
mod tools;

pub(crate) use support::*;

use pg_core::policy::CapabilityPolicy;
use pg_patch::PatchManager;
use pg_storage::EscalationLedger;
use std::sync::Arc;

// Protocol negotiation:
// Some MCP clients are strict about the server echoing a compatible protocol version.
const MCP_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "patchgate-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) struct McpServer {
    initialized: bool,
    manager: PatchManager,
}

fn usage() -> &'static str {
    "pg_mcp — transactional patch server with capability policy (stdio MCP)\n\n\
USAGE:\n\
  pg_mcp [--project-root DIR] [--ledger FILE] [--policy FILE]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
ENV:\n\
  PATCHGATE_PROJECT_ROOT, PATCHGATE_LEDGER, PATCHGATE_POLICY mirror the flags.\n\
  RUST_LOG sets the log filter (default: info). Logs go to stderr.\n\
\n\
NOTES:\n\
  - Project root default: nearest ancestor with .git, else the working directory\n\
  - Ledger default: <root>/project-manager/permission_escalations.json\n"
}

fn version_line() -> String {
    format!("pg_mcp {SERVER_VERSION} protocol={MCP_VERSION}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    init_logging();

    let config = RuntimeConfig::from_env_args(args.get(1..).unwrap_or_default())?;
    let policy = match config.policy_path.as_deref() {
        Some(path) => CapabilityPolicy::new(load_capability_config(path)?),
        None => CapabilityPolicy::default(),
    };
    tracing::info!(
        project_root = %config.project_root.display(),
        ledger = %config.ledger_path.display(),
        policy = config
            .policy_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        allow_rules = policy.allow_rules().len(),
        deny_rules = policy.deny_rules().len(),
        server = SERVER_NAME,
        "starting server"
    );

    let ledger = Arc::new(EscalationLedger::open(config.ledger_path));
    let manager = PatchManager::new(config.project_root, policy, ledger);
    let mut server = McpServer::new(manager);

    let result = entry::run_stdio(&mut server);
    if let Err(err) = &result {
        tracing::error!(error = %err, "stdio transport failed");
    }
    result
}
