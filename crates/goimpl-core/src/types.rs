//! Common types shared between error and output modules.
//!
//! This module holds the declaration reference used by both the error and
//! output modules, avoiding circular dependencies.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Location Type
// ============================================================================

/// Location in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
        }
    }
}

// ============================================================================
// TypeRef Type
// ============================================================================

/// A reference to a named declaration: an import path plus a type name.
///
/// Written as `path/to/pkg.Name` on the command line. The split happens on
/// the final `.`, so import paths containing dots (`example.com/x`) work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Import path of the declaring package.
    pub package: String,
    /// Declared type name.
    pub name: String,
}

impl TypeRef {
    /// Create a type reference from its parts.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Parse a `path.Name` reference.
    ///
    /// Returns `None` when either side of the final `.` is empty or when
    /// there is no `.` at all.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let idx = s.rfind('.')?;
        let (package, name) = (&s[..idx], &s[idx + 1..]);
        if package.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(TypeRef::new(package, name))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod type_ref_tests {
        use super::*;

        #[test]
        fn parse_std_lib_reference() {
            let r = TypeRef::parse("io.Writer").unwrap();
            assert_eq!(r.package, "io");
            assert_eq!(r.name, "Writer");
        }

        #[test]
        fn parse_splits_on_final_dot() {
            let r = TypeRef::parse("example.com/impl/testdata/goer.Goer").unwrap();
            assert_eq!(r.package, "example.com/impl/testdata/goer");
            assert_eq!(r.name, "Goer");
        }

        #[test]
        fn parse_rejects_missing_parts() {
            assert!(TypeRef::parse("Writer").is_none());
            assert!(TypeRef::parse("io.").is_none());
            assert!(TypeRef::parse(".Writer").is_none());
            assert!(TypeRef::parse("example.com/pkg").is_none());
        }

        #[test]
        fn display_round_trips() {
            let r = TypeRef::new("net/http", "Handler");
            assert_eq!(r.to_string(), "net/http.Handler");
        }
    }
}
