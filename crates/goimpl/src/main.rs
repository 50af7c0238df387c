//! Binary entry point for the goimpl CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Print goer.go with stubs for every io.ReadWriter method Goer lacks
//! goimpl implement --iface io.ReadWriter --impl example.com/app/goer.Goer
//!
//! # Write the result back to the file that declares Goer
//! goimpl implement --iface io.ReadWriter --impl example.com/app/goer.Goer --write
//!
//! # List the interfaces of the main module
//! goimpl list --json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use goimpl::cli::{open_source, report_error, run_implement, run_list};
use goimpl_core::error::ImplError;

// ============================================================================
// CLI Structure
// ============================================================================

/// Generate method stubs that make a Go type implement an interface.
#[derive(Parser, Debug)]
#[command(name = "goimpl", version, about = "Generate Go interface method stubs")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Directory to search for go.mod from (default: current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Go installation root (default: $GOROOT, then `go env GOROOT`).
    #[arg(long, global = true)]
    goroot: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Generate stubs for the interface methods a type is missing.
    Implement {
        /// Interface as path/to/pkg.Name.
        #[arg(long)]
        iface: String,

        /// Concrete type as path/to/pkg.Name.
        #[arg(long = "impl")]
        concrete: String,

        /// Write the result to the file declaring the type.
        #[arg(short, long)]
        write: bool,

        /// Print a JSON envelope instead of Go source.
        #[arg(long)]
        json: bool,
    },

    /// List the exported interfaces under a package pattern.
    List {
        /// Package pattern; `/...` matches subpackages (default: <main module>/...).
        #[arg(long)]
        path: Option<String>,

        /// Print a JSON envelope instead of one name per line.
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    fn json(&self) -> bool {
        match self {
            Command::Implement { json, .. } | Command::List { json, .. } => *json,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);

    let json = cli.command.json();
    let mut stdout = io::stdout().lock();
    let result = execute(&cli, &mut stdout);
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json, &mut stdout, &mut io::stderr());
            ExitCode::from(err.error_code().code())
        }
    };
    let _ = stdout.flush();
    code
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: &Cli, out: &mut impl Write) -> Result<(), ImplError> {
    let source = open_source(cli.global.workspace.as_deref(), cli.global.goroot.as_deref())?;
    match &cli.command {
        Command::Implement {
            iface,
            concrete,
            write,
            json,
        } => run_implement(&source, iface, concrete, *write, *json, out),
        Command::List { path, json } => run_list(&source, path.as_deref(), *json, out),
    }
}
