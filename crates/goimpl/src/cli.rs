//! CLI command implementations.
//!
//! - `implement` - generate stubs, print or write them back
//! - `list` - print the exported interfaces under a package pattern
//!
//! ## Output
//!
//! Raw mode prints Go source (implement) or one interface per line (list).
//! With `--json` every result, including errors, is a single JSON envelope
//! on stdout.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, ImplError>`; the caller turns the error
//! into an exit code with [`ImplError::error_code`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use goimpl_core::error::ImplError;
use goimpl_core::output::{emit_response, ErrorResponse, ImplementResponse, ListResponse};
use goimpl_core::types::TypeRef;
use goimpl_go::ops::{default_pattern, generate_stubs, list_interfaces, GenerateOptions};
use goimpl_go::source::{FsSource, PackageSource};
use goimpl_go::toolchain::LoadConfig;

/// Build the filesystem package source for `workspace`.
///
/// GOROOT and the module cache are discovered from the environment unless
/// `goroot` overrides the former.
pub fn open_source(workspace: Option<&Path>, goroot: Option<&Path>) -> Result<FsSource, ImplError> {
    let workspace = match workspace {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| ImplError::internal(format!("cannot determine current directory: {}", e)))?,
    };
    if !workspace.is_dir() {
        return Err(ImplError::invalid_args(format!(
            "workspace {} is not a directory",
            workspace.display()
        )));
    }
    let mut config = LoadConfig::discover(workspace);
    if let Some(goroot) = goroot {
        config = config.with_goroot(PathBuf::from(goroot));
    }
    FsSource::new(config).map_err(|e| goimpl_go::LoadError::from(e).into())
}

/// Parse `path/to/pkg.Name`.
pub fn parse_type_ref(flag: &str, value: &str) -> Result<TypeRef, ImplError> {
    TypeRef::parse(value).ok_or_else(|| {
        ImplError::invalid_args(format!(
            "invalid {} '{}', expected path/to/pkg.Name",
            flag, value
        ))
    })
}

/// Run `implement`.
pub fn run_implement(
    source: &dyn PackageSource,
    iface: &str,
    concrete: &str,
    write: bool,
    json: bool,
    out: &mut impl Write,
) -> Result<(), ImplError> {
    let iface_ref = parse_type_ref("--iface", iface)?;
    let concrete_ref = parse_type_ref("--impl", concrete)?;
    let options = GenerateOptions { write_back: write };
    let outcome = generate_stubs(source, &iface_ref, &concrete_ref, &options)?;

    if json {
        let response = ImplementResponse::new(
            iface_ref.to_string(),
            concrete_ref.to_string(),
            outcome.written,
            outcome.implementation,
        );
        return emit(&response, out);
    }

    match outcome.implementation {
        None => info!("nothing to implement"),
        Some(_) if outcome.written => {}
        Some(implementation) => {
            out.write_all(implementation.file_content.as_bytes())
                .map_err(|e| ImplError::internal(e.to_string()))?;
        }
    }
    Ok(())
}

/// Run `list`.
pub fn run_list(
    source: &dyn PackageSource,
    pattern: Option<&str>,
    json: bool,
    out: &mut impl Write,
) -> Result<(), ImplError> {
    let pattern = match pattern {
        Some(p) => p.to_string(),
        None => default_pattern(source)?,
    };
    let interfaces = list_interfaces(source, &pattern)?;

    if json {
        return emit(&ListResponse::new(pattern, interfaces), out);
    }
    for name in &interfaces {
        writeln!(out, "{}", name).map_err(|e| ImplError::internal(e.to_string()))?;
    }
    Ok(())
}

/// Report `err` the way the output mode asks for.
///
/// In raw mode a format failure still prints the unformatted file to `out`.
pub fn report_error(err: &ImplError, json: bool, out: &mut impl Write, diag: &mut impl Write) {
    if json {
        let _ = emit_response(&ErrorResponse::from_error(err), out);
        return;
    }
    if let ImplError::FormatFailed {
        partial: Some(partial),
        ..
    } = err
    {
        let _ = out.write_all(partial.file_content.as_bytes());
    }
    let _ = writeln!(diag, "goimpl: {}", err);
}

fn emit<T: serde::Serialize>(response: &T, out: &mut impl Write) -> Result<(), ImplError> {
    emit_response(response, out).map_err(|e: io::Error| ImplError::internal(e.to_string()))
}
