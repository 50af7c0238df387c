// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declaration-level syntax tree for Go source files.
//!
//! The tree keeps what stub generation needs: the package clause, the import
//! declarations with their spans, every type declaration with its full type
//! expression, and function signatures with receivers. Function bodies and
//! `var`/`const` declarations are kept as opaque spans.
//!
//! [`TypeExpr`] carries no spans. Nodes are compared and rebuilt freely by
//! the rewriter and printed back out by [`crate::printer`].

use goimpl_core::patch::Span;

// ============================================================================
// File structure
// ============================================================================

/// A parsed Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Package name from the package clause.
    pub package: String,
    /// Span of the `package name` clause.
    pub package_span: Span,
    /// Import declarations in source order.
    pub imports: Vec<ImportDecl>,
    /// Top-level declarations in source order.
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Every import spec, across all import declarations.
    pub fn import_specs(&self) -> impl Iterator<Item = &ImportSpec> {
        self.imports.iter().flat_map(|d| d.specs.iter())
    }

    /// Every type spec, across grouped and single declarations.
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().flat_map(|d| match d {
            Decl::Type(td) => td.specs.as_slice(),
            _ => &[],
        })
    }

    /// Every function and method declaration.
    pub fn funcs(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Func(f) => Some(f),
            _ => None,
        })
    }
}

/// `import "path"` or `import ( ... )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// From `import` through the last spec or `)`.
    pub span: Span,
    /// The `(` of a grouped declaration.
    pub lparen: Option<Span>,
    /// The `)` of a grouped declaration.
    pub rparen: Option<Span>,
    pub specs: Vec<ImportSpec>,
}

/// One imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name: an identifier, `_`, or `.`.
    pub name: Option<String>,
    /// Unquoted import path.
    pub path: String,
    /// From the name (or path) through the path literal.
    pub span: Span,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    /// `var` or `const`, kept opaque.
    Value(Span),
}

/// `type X ...` or `type ( ... )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub span: Span,
    pub specs: Vec<TypeSpec>,
}

/// One named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    /// From the name through the end of the type.
    pub span: Span,
    pub type_params: Vec<TypeParam>,
    /// `type A = B`.
    pub alias: bool,
    pub ty: TypeExpr,
}

/// A group of type parameters sharing a constraint: `K, V comparable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub names: Vec<String>,
    pub constraint: TypeExpr,
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub recv: Option<Receiver>,
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub sig: FuncType,
    /// Span of the `{ ... }` body, if present.
    pub body: Option<Span>,
    /// From `func` through the body or signature.
    pub span: Span,
}

/// A method receiver, reduced to what method sets need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    /// `*T` rather than `T`.
    pub pointer: bool,
    /// Receiver base type name.
    pub base: String,
    /// Type parameter names of a generic receiver: `(b *Box[T])`.
    pub type_args: Vec<String>,
}

// ============================================================================
// Type expressions
// ============================================================================

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// A Go type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `T`
    Name(String),
    /// `pkg.T`
    Qualified { package: String, name: String },
    /// `T[A, B]`
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
    },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`, length kept verbatim.
    Array { len: String, elem: Box<TypeExpr> },
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    /// `func(...) ...`
    Func(FuncType),
    /// `interface { ... }`
    Interface(InterfaceType),
    /// `struct { ... }`
    Struct(StructType),
    /// `(T)`
    Paren(Box<TypeExpr>),
    /// `...T`, only as the final parameter type.
    Ellipsis(Box<TypeExpr>),
    /// `A | ~B`, or a lone `~A`.
    Union(Vec<UnionTerm>),
}

impl TypeExpr {
    /// Shorthand for a qualified name.
    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &TypeExpr {
        let mut ty = self;
        while let TypeExpr::Paren(inner) = ty {
            ty = inner;
        }
        ty
    }
}

/// One term of a union constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionTerm {
    /// `~T`
    pub tilde: bool,
    pub ty: TypeExpr,
}

/// A function signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl FuncType {
    /// Whether the final parameter is `...T`.
    pub fn is_variadic(&self) -> bool {
        matches!(self.params.last(), Some(Param { ty: TypeExpr::Ellipsis(_), .. }))
    }
}

/// A parameter or result group: `a, b int` or a lone unnamed type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Empty for an unnamed parameter.
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

impl Param {
    /// An unnamed parameter.
    pub fn unnamed(ty: TypeExpr) -> Self {
        Param {
            names: Vec::new(),
            ty,
        }
    }

    /// How many positional values this group stands for.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

/// An interface type literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    pub elems: Vec<InterfaceElem>,
}

impl InterfaceType {
    /// Explicit methods, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodSpec> {
        self.elems.iter().filter_map(|e| match e {
            InterfaceElem::Method(m) => Some(m),
            InterfaceElem::Embed(_) => None,
        })
    }

    /// Embedded elements, in declaration order.
    pub fn embeds(&self) -> impl Iterator<Item = &TypeExpr> {
        self.elems.iter().filter_map(|e| match e {
            InterfaceElem::Embed(t) => Some(t),
            InterfaceElem::Method(_) => None,
        })
    }
}

/// An element of an interface literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceElem {
    Method(MethodSpec),
    /// An embedded interface, type, or union constraint.
    Embed(TypeExpr),
}

/// `Name(params) results` inside an interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSpec {
    pub name: String,
    pub sig: FuncType,
}

/// A struct type literal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StructType {
    pub fields: Vec<Field>,
}

/// A struct field group; `names` is empty for an embedded field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Tag literal as written, quotes included.
    pub tag: Option<String>,
}

impl Field {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variadic_detection() {
        let sig = FuncType {
            params: vec![
                Param::unnamed(TypeExpr::Name("string".into())),
                Param::unnamed(TypeExpr::Ellipsis(Box::new(TypeExpr::Name("any".into())))),
            ],
            results: vec![],
        };
        assert!(sig.is_variadic());
        assert!(!FuncType::default().is_variadic());
    }

    #[test]
    fn unparen_strips_nesting() {
        let t = TypeExpr::Paren(Box::new(TypeExpr::Paren(Box::new(TypeExpr::Name(
            "T".into(),
        )))));
        assert_eq!(t.unparen(), &TypeExpr::Name("T".into()));
    }

    #[test]
    fn grouped_param_arity() {
        let p = Param {
            names: vec!["a".into(), "b".into()],
            ty: TypeExpr::Name("int".into()),
        };
        assert_eq!(p.arity(), 2);
        assert_eq!(Param::unnamed(TypeExpr::Name("int".into())).arity(), 1);
    }
}
