// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declaration-level Go syntax for goimpl.
//!
//! This crate reads just enough Go to generate method stubs:
//!
//! - **Lexing**: [`lexer`] tokenizes Go source with automatic semicolon
//!   insertion.
//! - **Parsing**: [`parse_file`] builds a [`SourceFile`] holding the package
//!   clause, imports, type declarations and function signatures. Function
//!   bodies and value declarations are skipped as balanced spans.
//! - **Rewriting**: [`visitor`] walks and transforms [`TypeExpr`] trees.
//! - **Printing**: [`print_type`] and [`print_signature`] render types the
//!   way gofmt lays them out.
//! - **Formatting**: [`format_source`] validates a whole file and normalizes
//!   its layout.
//!
//! # Quick Start
//!
//! ```
//! use goimpl_syntax::{parse_file, print_signature};
//!
//! let file = parse_file("package io\n\ntype Writer interface {\n\tWrite(p []byte) (n int, err error)\n}\n").unwrap();
//! let spec = file.type_specs().next().unwrap();
//! let goimpl_syntax::TypeExpr::Interface(iface) = &spec.ty else { panic!() };
//! let write = iface.methods().next().unwrap();
//! assert_eq!(print_signature(&write.sig), "(p []byte) (n int, err error)");
//! ```

pub mod ast;
pub mod error;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod visitor;

pub use ast::{
    ChanDir, Decl, Field, FuncDecl, FuncType, ImportDecl, ImportSpec, InterfaceElem,
    InterfaceType, MethodSpec, Param, Receiver, SourceFile, StructType, TypeDecl, TypeExpr,
    TypeParam, TypeSpec, UnionTerm,
};
pub use error::{FormatError, LexErrorKind, SyntaxError};
pub use format::format_source;
pub use lexer::{tokenize, Tok, Token};
pub use parser::{parse_file, parse_type_expr};
pub use printer::{print_signature, print_signature_indented, print_type};
pub use visitor::{
    transform_func_type, transform_type_expr, walk_func_type, walk_type_expr, walk_type_refs,
    Rewrite, TypeTransformer, TypeVisitor, VisitResult,
};
