//! Go toolchain discovery.
//!
//! ## Resolution Order
//!
//! GOROOT:
//! 1. Explicit override (`--goroot`)
//! 2. `$GOROOT`
//! 3. `go env GOROOT`, using the `go` binary found on `$PATH`
//!
//! Module cache:
//! 1. `$GOMODCACHE`
//! 2. `$GOPATH/pkg/mod` (first `GOPATH` entry)
//! 3. `~/go/pkg/mod`
//!
//! Finding no toolchain is not an error. Standard-library imports then
//! resolve to nothing and are reported as missing dependencies.

use std::env;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// How long `go env` may run before it is killed.
pub const DEFAULT_TOOLCHAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything needed to locate Go packages on disk.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Directory to start the `go.mod` search from.
    pub workspace: PathBuf,
    /// Root of the Go installation, if one was found.
    pub goroot: Option<PathBuf>,
    /// Root of the module cache, if one was found.
    pub modcache: Option<PathBuf>,
    /// Bound on `go env` invocations.
    pub toolchain_timeout: Duration,
}

impl LoadConfig {
    /// A config with no toolchain and no module cache.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        LoadConfig {
            workspace: workspace.into(),
            goroot: None,
            modcache: None,
            toolchain_timeout: DEFAULT_TOOLCHAIN_TIMEOUT,
        }
    }

    /// Discover GOROOT and the module cache from the environment.
    pub fn discover(workspace: impl Into<PathBuf>) -> Self {
        let mut config = LoadConfig::new(workspace);
        config.goroot = discover_goroot(config.toolchain_timeout);
        config.modcache = discover_modcache();
        debug!(
            goroot = ?config.goroot,
            modcache = ?config.modcache,
            "toolchain discovery"
        );
        config
    }

    pub fn with_goroot(mut self, goroot: impl Into<PathBuf>) -> Self {
        self.goroot = Some(goroot.into());
        self
    }

    pub fn with_modcache(mut self, modcache: impl Into<PathBuf>) -> Self {
        self.modcache = Some(modcache.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.toolchain_timeout = timeout;
        self
    }
}

/// Find GOROOT from `$GOROOT` or the `go` binary on `$PATH`.
pub fn discover_goroot(timeout: Duration) -> Option<PathBuf> {
    if let Some(goroot) = non_empty_env("GOROOT") {
        return Some(PathBuf::from(goroot));
    }
    let go = which::which("go").ok()?;
    match go_env(&go, "GOROOT", timeout) {
        Ok(Some(value)) if !value.is_empty() => Some(PathBuf::from(value)),
        Ok(_) => None,
        Err(e) => {
            warn!("failed to run {} env GOROOT: {}", go.display(), e);
            None
        }
    }
}

/// Find the module cache from the environment.
pub fn discover_modcache() -> Option<PathBuf> {
    modcache_from(non_empty_env, dirs::home_dir())
}

/// Module cache location given an environment lookup and a home directory.
fn modcache_from(
    lookup: impl Fn(&str) -> Option<String>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(cache) = lookup("GOMODCACHE") {
        return Some(PathBuf::from(cache));
    }
    if let Some(gopath) = lookup("GOPATH") {
        if let Some(first) = env::split_paths(&gopath).find(|p| !p.as_os_str().is_empty()) {
            return Some(first.join("pkg").join("mod"));
        }
    }
    home.map(|h| h.join("go").join("pkg").join("mod"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Run `go env <key>`, killing the child if it outlives `timeout`.
///
/// Returns `Ok(None)` on timeout or a non-zero exit.
fn go_env(go: &Path, key: &str, timeout: Duration) -> io::Result<Option<String>> {
    let mut child = Command::new(go)
        .args(["env", key])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    match child.wait_timeout(timeout)? {
        Some(status) if status.success() => {
            let mut out = String::new();
            if let Some(mut stdout) = child.stdout.take() {
                stdout.read_to_string(&mut out)?;
            }
            Ok(Some(out.trim().to_string()))
        }
        Some(status) => {
            debug!("go env {} exited with {}", key, status);
            Ok(None)
        }
        None => {
            let _ = child.kill();
            let _ = child.wait();
            warn!("go env {} timed out after {:?}", key, timeout);
            Ok(None)
        }
    }
}
