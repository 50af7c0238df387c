//! Error types for package loading and stub generation.
//!
//! [`StubError`] is what the engine returns. The `From` bridge at the bottom
//! converts it into [`ImplError`] for the CLI's JSON output and exit codes.

use thiserror::Error;

use goimpl_core::error::ImplError;
use goimpl_core::output::Implementation;
use goimpl_syntax::SyntaxError;

use crate::gomod::GoModError;

/// Failure while building the program model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A requested package could not be located or has no Go files.
    #[error("package not found: {path}")]
    PackageNotFound { path: String },

    /// A file of a requested package does not parse.
    #[error("{file}:{error}")]
    Syntax { file: String, error: SyntaxError },

    /// The main module's `go.mod` is unreadable or malformed.
    #[error(transparent)]
    GoMod(#[from] GoModError),
}

/// Failure of a stub generation or listing operation.
#[derive(Debug, Error)]
pub enum StubError {
    /// The interface or concrete type is not declared in its package.
    #[error("declaration not found: {package}.{name}")]
    DeclarationNotFound { package: String, name: String },

    /// An embedded interface lives in a package that was not loaded.
    #[error("package {package} needed by {interface} is not loaded")]
    DependencyMissing { package: String, interface: String },

    /// The concrete type has a method whose signature differs from the
    /// interface's.
    #[error("method {name} has signature {have}, interface wants {want}")]
    SignatureMismatch {
        name: String,
        want: String,
        have: String,
    },

    /// The generated file failed the format pass. `partial` holds the
    /// unformatted result.
    #[error("format failed: {message}")]
    Format {
        message: String,
        partial: Box<Implementation>,
    },

    /// The named declaration is not an interface.
    #[error("{name} is not an interface")]
    NotAnInterface { name: String },

    /// The interface cannot be expanded.
    #[error("invalid interface {name}: {reason}")]
    InvalidInterface { name: String, reason: String },

    /// A signature uses a package qualifier its file never imports.
    #[error("{file}: undefined package qualifier {qualifier}")]
    UnresolvedQualifier { qualifier: String, file: String },

    /// The request itself is malformed.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Writing the result back failed.
    #[error("apply error: {message}")]
    Apply {
        message: String,
        file: Option<String>,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A broken invariant in the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type StubResult<T> = Result<T, StubError>;

impl StubError {
    pub(crate) fn apply(message: impl Into<String>, file: impl Into<String>) -> Self {
        StubError::Apply {
            message: message.into(),
            file: Some(file.into()),
        }
    }
}

// ============================================================================
// Bridge: StubError -> ImplError
// ============================================================================

impl From<LoadError> for ImplError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::PackageNotFound { path } => ImplError::PackageNotFound { path },
            LoadError::Syntax { file, error } => ImplError::SyntaxError {
                file,
                line: error.line,
                col: error.col,
                message: error.message,
            },
            LoadError::GoMod(GoModError::Syntax { line, message }) => ImplError::SyntaxError {
                file: "go.mod".to_string(),
                line: line as u32,
                col: 1,
                message,
            },
            LoadError::GoMod(GoModError::MissingModule) => ImplError::SyntaxError {
                file: "go.mod".to_string(),
                line: 1,
                col: 1,
                message: "no module directive".to_string(),
            },
            LoadError::GoMod(GoModError::Io(e)) => {
                ImplError::internal(format!("cannot read go.mod: {}", e))
            }
        }
    }
}

impl From<StubError> for ImplError {
    fn from(err: StubError) -> Self {
        match err {
            StubError::DeclarationNotFound { package, name } => {
                ImplError::DeclarationNotFound { package, name }
            }
            StubError::DependencyMissing { package, interface } => {
                ImplError::DependencyMissing { package, interface }
            }
            StubError::SignatureMismatch { name, want, have } => {
                ImplError::SignatureMismatch { name, want, have }
            }
            StubError::Format { message, partial } => ImplError::FormatFailed {
                message,
                partial: Some(partial),
            },
            StubError::NotAnInterface { name } => ImplError::NotAnInterface { name },
            StubError::InvalidInterface { name, reason } => {
                ImplError::InvalidInterface { name, reason }
            }
            StubError::UnresolvedQualifier { qualifier, file } => ImplError::InvalidInterface {
                name: file,
                reason: format!("undefined package qualifier {}", qualifier),
            },
            StubError::InvalidArguments(message) => ImplError::invalid_args(message),
            StubError::Apply { message, file } => ImplError::apply(message, file),
            StubError::Load(e) => ImplError::from(e),
            StubError::Internal(message) => ImplError::internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goimpl_core::error::OutputErrorCode;

    #[test]
    fn mismatch_keeps_its_code() {
        let err = ImplError::from(StubError::SignatureMismatch {
            name: "Write".into(),
            want: "func([]uint8) (int, error)".into(),
            have: "func(string) error".into(),
        });
        assert_eq!(err.error_code(), OutputErrorCode::SignatureMismatch);
    }

    #[test]
    fn load_errors_are_resolution_errors() {
        let err = ImplError::from(StubError::Load(LoadError::PackageNotFound {
            path: "example.com/nope".into(),
        }));
        assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        assert_eq!(err.to_string(), "package not found: example.com/nope");
    }

    #[test]
    fn format_failure_carries_partial() {
        let partial = Implementation {
            file: "goer.go".into(),
            file_content: "package goer\nfunc (".into(),
            methods: String::new(),
            added_imports: Vec::new(),
            all_imports: Vec::new(),
        };
        let err = ImplError::from(StubError::Format {
            message: "3:1: expected ')'".into(),
            partial: Box::new(partial),
        });
        assert_eq!(err.error_code(), OutputErrorCode::FormatFailed);
        let details = err.details().unwrap();
        assert_eq!(details["partial"]["file"], "goer.go");
    }

    #[test]
    fn apply_error_names_the_file() {
        let err = ImplError::from(StubError::apply("file changed since load", "goer.go"));
        assert_eq!(err.error_code(), OutputErrorCode::ApplyError);
        assert_eq!(err.details().unwrap()["file"], "goer.go");
    }
}
