//! Go program model and stub generation for goimpl.
//!
//! This crate includes:
//! - Locating packages on disk (`go.mod`, `GOROOT`, module cache)
//! - The program model: parsed packages, symbol tables and name resolution
//! - The stub engine: interface expansion, method set comparison, reference
//!   rewriting and stub emission
//! - Operations: generating stubs and listing interfaces
//!
//! # Example
//!
//! ```
//! use goimpl_core::types::TypeRef;
//! use goimpl_go::ops::{generate_stubs, GenerateOptions};
//! use goimpl_go::source::MemorySource;
//!
//! let source = MemorySource::new()
//!     .with_file("io", "io.go", "package io\n\ntype Closer interface {\n\tClose() error\n}\n")
//!     .with_file("example.com/goer", "goer.go", "package goer\n\ntype Goer struct{}\n");
//! let iface = TypeRef::parse("io.Closer").unwrap();
//! let concrete = TypeRef::parse("example.com/goer.Goer").unwrap();
//!
//! let outcome = generate_stubs(&source, &iface, &concrete, &GenerateOptions::default()).unwrap();
//! let implementation = outcome.implementation.unwrap();
//! assert!(implementation.methods.contains("func (*Goer) Close() error {"));
//! ```

pub mod compare;
pub mod emit;
pub mod error;
pub mod expand;
pub mod gomod;
pub mod imports;
pub mod method_set;
pub mod ops;
pub mod program;
pub mod resolve;
pub mod rewrite;
pub mod source;
pub mod toolchain;

pub use error::{LoadError, StubError, StubResult};
pub use ops::{
    generate_stubs, implement, list_interfaces, GenerateOptions, GenerateOutcome,
};
pub use program::{DeclRef, GoFile, Package, Program, Scope};
pub use source::{FsSource, MemorySource, PackageSource, SourceUnit};
pub use toolchain::LoadConfig;
