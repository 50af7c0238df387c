//! Where package source text comes from.
//!
//! [`PackageSource`] maps an import path to the package's Go files. The
//! [`FsSource`] implementation follows the go command's lookup rules for a
//! module-mode build; [`MemorySource`] holds files in memory for tests and
//! embedders.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::gomod::{strip_path_prefix, GoMod, GoModError, ReplaceTarget};
use crate::toolchain::LoadConfig;

/// One Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Display path; a filesystem path for files read from disk.
    pub path: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        SourceUnit {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Supplies package files by import path.
pub trait PackageSource {
    /// The package's files in name order, or `None` if it cannot be located.
    fn read_package(&self, import_path: &str) -> Option<Vec<SourceUnit>>;

    /// Import paths matching `pattern`. A trailing `/...` matches the path
    /// and every package below it; any other pattern is returned as is.
    fn expand_pattern(&self, pattern: &str) -> Vec<String>;

    /// Path of the main module, when there is one.
    fn main_module(&self) -> Option<String> {
        None
    }
}

// ============================================================================
// In-memory source
// ============================================================================

/// Packages held in memory.
///
/// ```
/// use goimpl_go::source::{MemorySource, PackageSource};
///
/// let source = MemorySource::new()
///     .with_file("example.com/a", "a.go", "package a\n")
///     .with_file("example.com/a/b", "b.go", "package b\n");
/// assert_eq!(source.expand_pattern("example.com/a/...").len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    packages: BTreeMap<String, Vec<SourceUnit>>,
    module: Option<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Set the main module path.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Add a file named `name` to the package at `import_path`.
    pub fn with_file(mut self, import_path: &str, name: &str, text: impl Into<String>) -> Self {
        self.add_file(import_path, name, text);
        self
    }

    pub fn add_file(&mut self, import_path: &str, name: &str, text: impl Into<String>) {
        let files = self.packages.entry(import_path.to_string()).or_default();
        files.push(SourceUnit::new(format!("{}/{}", import_path, name), text));
        files.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

impl PackageSource for MemorySource {
    fn read_package(&self, import_path: &str) -> Option<Vec<SourceUnit>> {
        self.packages.get(import_path).cloned()
    }

    fn expand_pattern(&self, pattern: &str) -> Vec<String> {
        match pattern.strip_suffix("/...") {
            Some(base) => self
                .packages
                .keys()
                .filter(|path| strip_path_prefix(path, base).is_some())
                .cloned()
                .collect(),
            None => vec![pattern.to_string()],
        }
    }

    fn main_module(&self) -> Option<String> {
        self.module.clone()
    }
}

// ============================================================================
// Filesystem source
// ============================================================================

#[derive(Debug, Clone)]
struct MainModule {
    root: PathBuf,
    gomod: GoMod,
}

/// Packages on disk, located the way the go command locates them.
///
/// ## Resolution Order
///
/// 1. The main module (the nearest `go.mod` at or above the workspace)
/// 2. `replace` directives of the main module
/// 3. The main module's `vendor/` directory
/// 4. `GOROOT/src` for standard-library paths
/// 5. The module cache for `require`d modules
#[derive(Debug, Clone)]
pub struct FsSource {
    config: LoadConfig,
    module: Option<MainModule>,
}

impl FsSource {
    /// Locate and parse the main module's `go.mod`, if there is one.
    pub fn new(config: LoadConfig) -> Result<Self, GoModError> {
        let module = match find_go_mod(&config.workspace) {
            Some(path) => {
                let gomod = GoMod::load(&path)?;
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| config.workspace.clone());
                debug!(module = %gomod.module, root = %root.display(), "main module");
                Some(MainModule { root, gomod })
            }
            None => {
                debug!("no go.mod above {}", config.workspace.display());
                None
            }
        };
        Ok(FsSource { config, module })
    }

    /// Root directory of the main module.
    pub fn module_root(&self) -> Option<&Path> {
        self.module.as_ref().map(|m| m.root.as_path())
    }

    /// Directory holding the package at `import_path`.
    pub fn package_dir(&self, import_path: &str) -> Option<PathBuf> {
        self.candidate_dirs(import_path)
            .into_iter()
            .find(|dir| has_go_files(dir))
    }

    /// Candidate directories for `import_path`, in resolution order.
    fn candidate_dirs(&self, import_path: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(main) = &self.module {
            if let Some(rest) = strip_path_prefix(import_path, &main.gomod.module) {
                dirs.push(join_import_rest(&main.root, rest));
            }
            if let Some((replace, rest)) = main.gomod.replacement_for(import_path) {
                match &replace.target {
                    ReplaceTarget::Dir(dir) => {
                        dirs.push(join_import_rest(&main.root.join(dir), rest));
                    }
                    ReplaceTarget::Module { path, version } => {
                        if let Some(dir) = self.module_cache_dir(path, version) {
                            dirs.push(join_import_rest(&dir, rest));
                        }
                    }
                }
            }
            dirs.push(join_import_rest(&main.root.join("vendor"), import_path));
        }
        if is_standard_path(import_path) {
            if let Some(goroot) = &self.config.goroot {
                dirs.push(join_import_rest(&goroot.join("src"), import_path));
            }
        }
        if let Some(main) = &self.module {
            if let Some((req, rest)) = main.gomod.require_for(import_path) {
                if let Some(dir) = self.module_cache_dir(&req.path, &req.version) {
                    dirs.push(join_import_rest(&dir, rest));
                }
            }
        }
        dirs
    }

    fn module_cache_dir(&self, module: &str, version: &str) -> Option<PathBuf> {
        let cache = self.config.modcache.as_ref()?;
        Some(cache.join(format!(
            "{}@{}",
            escape_module_path(module),
            escape_module_path(version)
        )))
    }

    /// Rewrite a `./dir` style pattern as an import path in the main module.
    fn absolutize(&self, pattern: &str) -> String {
        let relative = pattern == "." || pattern.starts_with("./") || pattern.starts_with("../");
        let Some(main) = self.module.as_ref().filter(|_| relative) else {
            return pattern.to_string();
        };
        let (dir_part, wildcard) = match pattern.strip_suffix("/...") {
            Some(base) => (base, true),
            None => (pattern, false),
        };
        let dir = match fs::canonicalize(self.config.workspace.join(dir_part)) {
            Ok(d) => d,
            Err(_) => return pattern.to_string(),
        };
        let root = fs::canonicalize(&main.root).unwrap_or_else(|_| main.root.clone());
        let Ok(rel) = dir.strip_prefix(&root) else {
            return pattern.to_string();
        };
        let mut import = main.gomod.module.clone();
        for component in rel.components() {
            import.push('/');
            import.push_str(&component.as_os_str().to_string_lossy());
        }
        if wildcard {
            import.push_str("/...");
        }
        import
    }
}

impl PackageSource for FsSource {
    fn read_package(&self, import_path: &str) -> Option<Vec<SourceUnit>> {
        let dir = self.package_dir(import_path)?;
        let files = read_go_files(&dir);
        if files.is_empty() {
            None
        } else {
            Some(files)
        }
    }

    fn expand_pattern(&self, pattern: &str) -> Vec<String> {
        let pattern = self.absolutize(pattern);
        let Some(base) = pattern.strip_suffix("/...") else {
            return vec![pattern];
        };
        let Some(root) = self
            .candidate_dirs(base)
            .into_iter()
            .find(|dir| dir.is_dir())
        else {
            warn!("pattern {} matched no directories", pattern);
            return Vec::new();
        };

        let mut paths = Vec::new();
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !skip_dir(e.path()));
        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() || !has_go_files(entry.path()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let mut import = base.to_string();
            for component in rel.components() {
                import.push('/');
                import.push_str(&component.as_os_str().to_string_lossy());
            }
            paths.push(import);
        }
        paths.sort();
        paths
    }

    fn main_module(&self) -> Option<String> {
        self.module.as_ref().map(|m| m.gomod.module.clone())
    }
}

/// Walk up from `start` to the nearest `go.mod`.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join("go.mod"))
        .find(|candidate| candidate.is_file())
}

fn join_import_rest(dir: &Path, rest: &str) -> PathBuf {
    rest.split('/')
        .filter(|s| !s.is_empty())
        .fold(dir.to_path_buf(), |d, s| d.join(s))
}

/// Standard-library paths have no dot in their first element.
pub fn is_standard_path(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    !first.contains('.')
}

/// Module cache escaping: each upper-case letter becomes `!` and its
/// lower-case form.
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Directories never searched by pattern expansion.
fn skip_dir(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.starts_with('.')
        || name.starts_with('_')
        || name == "testdata"
        || name == "vendor"
        || path.join("go.mod").is_file()
}

fn has_go_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().is_file() && keep_file_name(&e.file_name().to_string_lossy()))
        })
        .unwrap_or(false)
}

fn read_go_files(dir: &Path) -> Vec<SourceUnit> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .is_some_and(|n| keep_file_name(&n.to_string_lossy()))
        })
        .collect();
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(text) if build_constraints_allow(&text) => {
                files.push(SourceUnit::new(path.display().to_string(), text));
            }
            Ok(_) => debug!("excluded by build constraint: {}", path.display()),
            Err(e) => warn!("cannot read {}: {}", path.display(), e),
        }
    }
    files
}

// ============================================================================
// File selection
// ============================================================================

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// The host's GOOS.
pub fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// The host's GOARCH.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Whether a file name is a buildable, non-test Go file for this host.
pub fn keep_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".go") else {
        return false;
    };
    if stem.ends_with("_test") || name.starts_with('_') || name.starts_with('.') {
        return false;
    }
    let parts: Vec<&str> = stem.split('_').collect();
    let n = parts.len();
    if n >= 3 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
        return parts[n - 2] == host_os() && parts[n - 1] == host_arch();
    }
    if n >= 2 && KNOWN_OS.contains(&parts[n - 1]) {
        return parts[n - 1] == host_os();
    }
    if n >= 2 && KNOWN_ARCH.contains(&parts[n - 1]) {
        return parts[n - 1] == host_arch();
    }
    true
}

/// Evaluate the file's `//go:build` line, if any, for this host.
pub fn build_constraints_allow(text: &str) -> bool {
    for line in text.lines() {
        let line = line.trim();
        if let Some(expr) = line.strip_prefix("//go:build") {
            return eval_constraint(expr).unwrap_or(true);
        }
        if line.is_empty() || line.starts_with("//") || line.starts_with("/*") {
            continue;
        }
        break;
    }
    true
}

fn tag_satisfied(tag: &str) -> bool {
    tag == host_os()
        || tag == host_arch()
        || (tag == "unix" && UNIX_OS.contains(&host_os()))
        || tag == "gc"
        || tag.starts_with("go1.")
}

/// Evaluate a build constraint expression. `None` if it is malformed.
fn eval_constraint(expr: &str) -> Option<bool> {
    let tokens = constraint_tokens(expr);
    let mut pos = 0;
    let value = constraint_or(&tokens, &mut pos)?;
    (pos == tokens.len()).then_some(value)
}

fn constraint_tokens(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' | ')' | '!' => {
                tokens.push(c.to_string());
                chars.next();
            }
            '&' | '|' => {
                chars.next();
                if chars.peek() == Some(&c) {
                    chars.next();
                }
                tokens.push(format!("{}{}", c, c));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if word.is_empty() {
                    tokens.push(c.to_string());
                    chars.next();
                } else {
                    tokens.push(word);
                }
            }
        }
    }
    tokens
}

fn constraint_or(tokens: &[String], pos: &mut usize) -> Option<bool> {
    let mut value = constraint_and(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("||") {
        *pos += 1;
        value |= constraint_and(tokens, pos)?;
    }
    Some(value)
}

fn constraint_and(tokens: &[String], pos: &mut usize) -> Option<bool> {
    let mut value = constraint_not(tokens, pos)?;
    while tokens.get(*pos).map(String::as_str) == Some("&&") {
        *pos += 1;
        value &= constraint_not(tokens, pos)?;
    }
    Some(value)
}

fn constraint_not(tokens: &[String], pos: &mut usize) -> Option<bool> {
    let token = tokens.get(*pos)?;
    *pos += 1;
    match token.as_str() {
        "!" => constraint_not(tokens, pos).map(|v| !v),
        "(" => {
            let value = constraint_or(tokens, pos)?;
            if tokens.get(*pos).map(String::as_str) != Some(")") {
                return None;
            }
            *pos += 1;
            Some(value)
        }
        tag if tag.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') => {
            Some(tag_satisfied(tag))
        }
        _ => None,
    }
}
