//! Owner identity resolution for CLI commands.
//!
//! The resolution chain: `--owner` flag > `KIN_OWNER` env > user config
//! `owner` > `USER` env (TTY only). Creating and listing trees requires an
//! owner; commands on a single tree enforce ownership only when one resolves.

use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve_owner_with(
    cli_flag: Option<&str>,
    config_owner: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    if let Some(owner) = non_empty(cli_flag) {
        return Some(owner);
    }

    if let Some(val) = env.get("KIN_OWNER") {
        return Some(val.trim().to_string());
    }

    if let Some(owner) = non_empty(config_owner) {
        return Some(owner);
    }

    // USER is a guess about who is typing, so only trust it interactively.
    if env.is_tty() {
        if let Some(val) = env.get("USER") {
            return Some(val.trim().to_string());
        }
    }

    None
}

/// Resolve the owner identity, returning `None` when no source provides one.
pub fn resolve_owner(cli_flag: Option<&str>, config_owner: Option<&str>) -> Option<String> {
    resolve_owner_with(cli_flag, config_owner, &RealEnv)
}
