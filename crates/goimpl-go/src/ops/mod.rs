//! Operations: the front door of the engine.
//!
//! - [`implement()`](implement::implement) runs the engine over a loaded
//!   [`Program`](crate::program::Program).
//! - [`generate_stubs`](implement::generate_stubs) loads the program from a
//!   [`PackageSource`](crate::source::PackageSource) first, and optionally
//!   writes the result back.
//! - [`list_interfaces`](list::list_interfaces) enumerates the exported
//!   interfaces under a pattern.

pub mod implement;
pub mod list;

use goimpl_core::output::Implementation;

pub use implement::{generate_stubs, implement, write_back};
pub use list::{default_pattern, interfaces_in, list_interfaces};

/// Options for [`generate_stubs`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Persist the generated file over the destination file.
    pub write_back: bool,
}

/// Result of [`generate_stubs`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOutcome {
    /// `None` when the concrete type already implements the interface.
    pub implementation: Option<Implementation>,
    /// Whether the destination file was rewritten.
    pub written: bool,
}
