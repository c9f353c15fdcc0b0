#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

const ENV_PROJECT_ROOT: &str = "PATCHGATE_PROJECT_ROOT";
const ENV_LEDGER: &str = "PATCHGATE_LEDGER";
const ENV_POLICY: &str = "PATCHGATE_POLICY";

const DEFAULT_LEDGER_RELATIVE: &str = "project-manager/permission_escalations.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RuntimeConfig {
    pub(crate) project_root: PathBuf,
    pub(crate) ledger_path: PathBuf,
    pub(crate) policy_path: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Flags win over env vars; `args` excludes the program name.
    pub(crate) fn from_env_args(args: &[String]) -> Result<Self, String> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve(args, |key| std::env::var(key).ok(), &cwd)
    }

    fn resolve(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
        cwd: &Path,
    ) -> Result<Self, String> {
        let mut project_root: Option<PathBuf> = None;
        let mut ledger: Option<PathBuf> = None;
        let mut policy: Option<PathBuf> = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let slot = match arg.as_str() {
                "--project-root" => &mut project_root,
                "--ledger" => &mut ledger,
                "--policy" => &mut policy,
                other => return Err(format!("unknown argument: {other} (see --help)")),
            };
            let Some(value) = iter.next().filter(|v| !v.trim().is_empty()) else {
                return Err(format!("{arg} requires a value"));
            };
            *slot = Some(PathBuf::from(value));
        }

        let from_env = |key: &str| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        let project_root = project_root
            .or_else(|| from_env(ENV_PROJECT_ROOT))
            .map(|root| absolutize(cwd, root))
            .unwrap_or_else(|| default_repo_root(cwd));
        let ledger_path = ledger
            .or_else(|| from_env(ENV_LEDGER))
            .map(|path| absolutize(cwd, path))
            .unwrap_or_else(|| project_root.join(DEFAULT_LEDGER_RELATIVE));
        let policy_path = policy
            .or_else(|| from_env(ENV_POLICY))
            .map(|path| absolutize(cwd, path));

        Ok(Self {
            project_root,
            ledger_path,
            policy_path,
        })
    }
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

fn default_repo_root(cwd: &Path) -> PathBuf {
    let mut current = cwd.to_path_buf();
    loop {
        if current.join(".git").exists() {
            return current;
        }
        if !current.pop() {
            break;
        }
    }
    cwd.to_path_buf()
}
