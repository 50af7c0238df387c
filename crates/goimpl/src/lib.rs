//! goimpl - generate the method stubs a Go type needs to implement an
//! interface.
//!
//! This crate provides the CLI binary. The engine lives in `goimpl-go`.
//!
//! ## Modules
//!
//! - `cli` - CLI command implementations

pub mod cli;

// Re-export core types for convenience
pub use goimpl_core::error::{ImplError, OutputErrorCode};
pub use goimpl_core::output::{ErrorResponse, ImplementResponse, Implementation, ListResponse, SCHEMA_VERSION};
