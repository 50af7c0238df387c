//! Error types and error code constants for goimpl.
//!
//! This module provides a unified error type (`ImplError`) that bridges
//! domain-specific errors from the syntax and engine crates into a common
//! format suitable for JSON output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (malformed type references, bad flags)
//! - `3`: Resolution errors (declaration or package not found, syntax errors in inputs)
//! - `4`: Apply errors (failed to write changes, file changed since load)
//! - `5`: Signature mismatch (the concrete type has a conflicting method)
//! - `6`: Format failed (generated source did not re-parse)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::output::Implementation;

pub use crate::types::{Location, TypeRef};

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (declaration not found, package not found).
    ResolutionError = 3,
    /// Apply errors (failed to write changes, content hash mismatch).
    ApplyError = 4,
    /// An existing method conflicts with the interface.
    SignatureMismatch = 5,
    /// Generated source failed the canonical format pass.
    FormatFailed = 6,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// All engine errors are converted to this type before being rendered as
/// JSON output or mapped to an exit code.
#[derive(Debug, Error)]
pub enum ImplError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A named declaration does not exist in its package.
    #[error("declaration not found: {package}.{name}")]
    DeclarationNotFound { package: String, name: String },

    /// A package referenced by an interface was never loaded.
    #[error("package {package} needed by {interface} is not loaded")]
    DependencyMissing { package: String, interface: String },

    /// A package could not be located or contains no Go files.
    #[error("package not found: {path}")]
    PackageNotFound { path: String },

    /// The declaration exists but is not an interface.
    #[error("{name} is not an interface")]
    NotAnInterface { name: String },

    /// The interface embeds itself, directly or indirectly.
    #[error("invalid interface {name}: {reason}")]
    InvalidInterface { name: String, reason: String },

    /// The concrete type has a method whose signature conflicts.
    #[error("method {name} has signature {have}, interface wants {want}")]
    SignatureMismatch {
        name: String,
        want: String,
        have: String,
    },

    /// The canonical format pass rejected the generated source.
    ///
    /// `partial` carries the unformatted result so callers can still inspect it.
    #[error("format failed: {message}")]
    FormatFailed {
        message: String,
        partial: Option<Box<Implementation>>,
    },

    /// A Go source file failed to parse.
    #[error("syntax error at {file}:{line}:{col}: {message}")]
    SyntaxError {
        file: String,
        line: u32,
        col: u32,
        message: String,
    },

    /// Failed to apply changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ImplError> for OutputErrorCode {
    fn from(err: &ImplError) -> Self {
        match err {
            ImplError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ImplError::DeclarationNotFound { .. } => OutputErrorCode::ResolutionError,
            ImplError::DependencyMissing { .. } => OutputErrorCode::ResolutionError,
            ImplError::PackageNotFound { .. } => OutputErrorCode::ResolutionError,
            ImplError::NotAnInterface { .. } => OutputErrorCode::ResolutionError,
            ImplError::InvalidInterface { .. } => OutputErrorCode::ResolutionError,
            ImplError::SyntaxError { .. } => OutputErrorCode::ResolutionError,
            ImplError::SignatureMismatch { .. } => OutputErrorCode::SignatureMismatch,
            ImplError::FormatFailed { .. } => OutputErrorCode::FormatFailed,
            ImplError::ApplyError { .. } => OutputErrorCode::ApplyError,
            ImplError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ImplError> for OutputErrorCode {
    fn from(err: ImplError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: EditError -> ImplError
// ============================================================================

impl From<crate::patch::EditError> for ImplError {
    fn from(err: crate::patch::EditError) -> Self {
        ImplError::InternalError {
            message: format!("edit error: {}", err),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ImplError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ImplError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an invalid arguments error with JSON details.
    pub fn invalid_args_with_details(
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        ImplError::InvalidArguments {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a declaration not found error.
    pub fn declaration_not_found(r: &TypeRef) -> Self {
        ImplError::DeclarationNotFound {
            package: r.package.clone(),
            name: r.name.clone(),
        }
    }

    /// Create an apply error.
    pub fn apply(message: impl Into<String>, file: Option<String>) -> Self {
        ImplError::ApplyError {
            message: message.into(),
            file,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ImplError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }

    /// JSON details for the error envelope, if this variant has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ImplError::InvalidArguments { details, .. } => details.clone(),
            ImplError::SignatureMismatch { name, want, have } => Some(serde_json::json!({
                "method": name,
                "want": want,
                "have": have,
            })),
            ImplError::SyntaxError {
                file, line, col, ..
            } => Some(serde_json::json!({
                "location": Location::new(file.clone(), *line, *col),
            })),
            ImplError::FormatFailed {
                partial: Some(partial),
                ..
            } => serde_json::to_value(partial.as_ref())
                .ok()
                .map(|p| serde_json::json!({ "partial": p })),
            ImplError::ApplyError {
                file: Some(file), ..
            } => Some(serde_json::json!({ "file": file })),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod error_code_mapping {
        use super::*;

        #[test]
        fn declaration_not_found_maps_to_resolution_error() {
            let err = ImplError::declaration_not_found(&TypeRef::new("io", "Nope"));
            assert_eq!(
                OutputErrorCode::from(&err),
                OutputErrorCode::ResolutionError
            );
            assert_eq!(err.error_code().code(), 3);
        }

        #[test]
        fn invalid_arguments_maps_to_invalid_arguments() {
            let err = ImplError::invalid_args("missing type name");
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
            assert_eq!(err.error_code().code(), 2);
        }

        #[test]
        fn signature_mismatch_maps_to_signature_mismatch() {
            let err = ImplError::SignatureMismatch {
                name: "Read".to_string(),
                want: "func([]uint8) (int, error)".to_string(),
                have: "func() error".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::SignatureMismatch);
            assert_eq!(err.error_code().code(), 5);
        }

        #[test]
        fn format_failed_maps_to_format_failed() {
            let err = ImplError::FormatFailed {
                message: "expected '}'".to_string(),
                partial: None,
            };
            assert_eq!(err.error_code().code(), 6);
        }

        #[test]
        fn apply_error_maps_to_apply_error() {
            let err = ImplError::apply("file changed", Some("goer.go".to_string()));
            assert_eq!(err.error_code().code(), 4);
        }

        #[test]
        fn internal_error_maps_to_internal_error() {
            let err = ImplError::internal("unexpected state");
            assert_eq!(err.error_code().code(), 10);
        }

        #[test]
        fn cyclic_interface_maps_to_resolution_error() {
            let err = ImplError::InvalidInterface {
                name: "p.A".to_string(),
                reason: "embeds itself".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        }
    }

    mod error_display {
        use super::*;

        #[test]
        fn declaration_not_found_display() {
            let err = ImplError::declaration_not_found(&TypeRef::new("io", "Nope"));
            assert_eq!(err.to_string(), "declaration not found: io.Nope");
        }

        #[test]
        fn dependency_missing_display() {
            let err = ImplError::DependencyMissing {
                package: "io".to_string(),
                interface: "goer.Goer".to_string(),
            };
            assert_eq!(
                err.to_string(),
                "package io needed by goer.Goer is not loaded"
            );
        }

        #[test]
        fn signature_mismatch_display() {
            let err = ImplError::SignatureMismatch {
                name: "Close".to_string(),
                want: "func() error".to_string(),
                have: "func()".to_string(),
            };
            assert_eq!(
                err.to_string(),
                "method Close has signature func(), interface wants func() error"
            );
        }
    }

    mod error_details {
        use super::*;

        #[test]
        fn signature_mismatch_has_details() {
            let err = ImplError::SignatureMismatch {
                name: "Close".to_string(),
                want: "func() error".to_string(),
                have: "func()".to_string(),
            };
            let details = err.details().unwrap();
            assert_eq!(details["method"], "Close");
            assert_eq!(details["have"], "func()");
        }

        #[test]
        fn internal_error_has_no_details() {
            assert!(ImplError::internal("x").details().is_none());
        }
    }

    mod output_error_code {
        use super::*;

        #[test]
        fn code_values_are_stable() {
            assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
            assert_eq!(OutputErrorCode::ResolutionError.code(), 3);
            assert_eq!(OutputErrorCode::ApplyError.code(), 4);
            assert_eq!(OutputErrorCode::SignatureMismatch.code(), 5);
            assert_eq!(OutputErrorCode::FormatFailed.code(), 6);
            assert_eq!(OutputErrorCode::InternalError.code(), 10);
        }

        #[test]
        fn display_shows_code() {
            assert_eq!(format!("{}", OutputErrorCode::InvalidArguments), "2");
            assert_eq!(format!("{}", OutputErrorCode::InternalError), "10");
        }
    }
}
