//! JSON output types and serialization for CLI responses.
//!
//! These types form the contract for structured output:
//!
//! 1. **Status first:** Every response has `status` as its first field
//! 2. **Deterministic:** Same input produces the same bytes (field order, array ordering)
//! 3. **Versioned:** `schema_version` enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::ImplError;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Engine Records
// ============================================================================

/// One import entry of a Go file.
///
/// `name` is the explicit alias (`_`, `.`, or a rename) or empty when the
/// import binds the package's own name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Explicit alias, or "" for none.
    pub name: String,
    /// Import path, unquoted.
    pub path: String,
}

impl ImportInfo {
    /// Create an import entry. Pass "" for an unaliased import.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        ImportInfo {
            name: name.into(),
            path: path.into(),
        }
    }

    /// True if the import carries an explicit alias.
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// The result of implementing an interface on a concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Path of the Go file that declares the concrete type.
    pub file: String,
    /// That file's content with imports added and stubs appended.
    pub file_content: String,
    /// Only the generated method stubs.
    pub methods: String,
    /// Imports added by the rewriter, in the order they were added.
    pub added_imports: Vec<ImportInfo>,
    /// Every import of the destination file after rewriting.
    pub all_imports: Vec<ImportInfo>,
}

// ============================================================================
// Error Info
// ============================================================================

/// Error information for JSON output.
///
/// - `code`: Numeric error code (required)
/// - `message`: Human-readable message (required)
/// - `details`: Error-specific structured data (optional)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from an ImplError.
    pub fn from_error(err: &ImplError) -> Self {
        ErrorInfo {
            code: err.error_code().code(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

// ============================================================================
// Response Structs
// ============================================================================

/// Response for the implement command.
///
/// `implementation` is `null` when the concrete type already has every method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Fully qualified interface reference.
    pub interface: String,
    /// Fully qualified concrete type reference.
    pub concrete: String,
    /// Whether the destination file was rewritten.
    pub written: bool,
    /// The generated result, if any methods were missing.
    pub implementation: Option<Implementation>,
}

impl ImplementResponse {
    /// Create a new implement response.
    pub fn new(
        interface: impl Into<String>,
        concrete: impl Into<String>,
        written: bool,
        implementation: Option<Implementation>,
    ) -> Self {
        ImplementResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            interface: interface.into(),
            concrete: concrete.into(),
            written,
            implementation,
        }
    }
}

/// Response for the list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// The package pattern that was expanded.
    pub pattern: String,
    /// Interfaces as `importpath.Name`.
    pub interfaces: Vec<String>,
}

impl ListResponse {
    /// Create a new list response.
    pub fn new(pattern: impl Into<String>, interfaces: Vec<String>) -> Self {
        ListResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            pattern: pattern.into(),
            interfaces,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error information.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from an ImplError.
    pub fn from_error(err: &ImplError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }

    /// Create an error response with just code and message.
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo {
                code,
                message: message.into(),
                details: None,
            },
        }
    }
}

// ============================================================================
// Response Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single output path for structured CLI output.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_implementation() -> Implementation {
        Implementation {
            file: "goer/goer.go".to_string(),
            file_content: "package goer\n".to_string(),
            methods: "// Write implements Writer\n".to_string(),
            added_imports: vec![ImportInfo::new("", "io")],
            all_imports: vec![ImportInfo::new("", "io"), ImportInfo::new("m", "example.com/models")],
        }
    }

    mod import_info {
        use super::*;

        #[test]
        fn unnamed_import_serializes_empty_name() {
            let json = serde_json::to_value(ImportInfo::new("", "io")).unwrap();
            assert_eq!(json["name"], "");
            assert_eq!(json["path"], "io");
        }

        #[test]
        fn is_named() {
            assert!(ImportInfo::new("_", "x").is_named());
            assert!(!ImportInfo::new("", "x").is_named());
        }
    }

    mod responses {
        use super::*;

        #[test]
        fn implement_response_status_first() {
            let resp = ImplementResponse::new("io.Writer", "goer.Goer", false, None);
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.starts_with("{\"status\":\"ok\""));
            assert!(json.contains("\"schema_version\":\"1\""));
            assert!(json.contains("\"implementation\":null"));
        }

        #[test]
        fn implement_response_carries_fields() {
            let resp =
                ImplementResponse::new("io.Writer", "goer.Goer", true, Some(sample_implementation()));
            let json = serde_json::to_value(&resp).unwrap();
            let imp = &json["implementation"];
            assert_eq!(imp["file"], "goer/goer.go");
            assert_eq!(imp["added_imports"][0]["path"], "io");
            assert_eq!(imp["all_imports"][1]["name"], "m");
            assert_eq!(json["written"], true);
        }

        #[test]
        fn list_response() {
            let resp = ListResponse::new("io/...", vec!["io.Reader".to_string()]);
            let json = serde_json::to_value(&resp).unwrap();
            assert_eq!(json["status"], "ok");
            assert_eq!(json["interfaces"][0], "io.Reader");
        }

        #[test]
        fn error_response_from_error() {
            let err = ImplError::SignatureMismatch {
                name: "Write".to_string(),
                want: "func([]uint8) (int, error)".to_string(),
                have: "func()".to_string(),
            };
            let resp = ErrorResponse::from_error(&err);
            let json = serde_json::to_value(&resp).unwrap();
            assert_eq!(json["status"], "error");
            assert_eq!(json["error"]["code"], 5);
            assert_eq!(json["error"]["details"]["method"], "Write");
        }

        #[test]
        fn format_failure_details_carry_partial_content() {
            let err = ImplError::FormatFailed {
                message: "expected type".to_string(),
                partial: Some(Box::new(sample_implementation())),
            };
            let json = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();
            assert_eq!(json["error"]["code"], 6);
            assert_eq!(
                json["error"]["details"]["partial"]["file_content"],
                "package goer\n"
            );
        }

        #[test]
        fn error_without_details_omits_field() {
            let resp = ErrorResponse::new(10, "boom");
            let json = serde_json::to_string(&resp).unwrap();
            assert!(!json.contains("details"));
        }
    }

    mod emit {
        use super::*;

        #[test]
        fn emit_writes_pretty_json_with_newline() {
            let mut buf = Vec::new();
            emit_response(&ListResponse::new("p/...", vec![]), &mut buf).unwrap();
            let text = String::from_utf8(buf).unwrap();
            assert!(text.starts_with("{\n"));
            assert!(text.ends_with("}\n"));
        }
    }
}
