//! Name resolution over the program model.
//!
//! Identifiers resolve the way the Go compiler resolves type names at package
//! level: declarations of the file's own package, then packages the file
//! dot-imports, then the universe. Qualifiers resolve through the file's
//! imports.
//!
//! [`canonical`] reduces a type expression to a string that is equal for two
//! expressions exactly when they denote the same type, which is what method
//! signature comparison needs.

use std::fmt;

use goimpl_syntax::{ChanDir, FuncType, InterfaceElem, Param, TypeExpr};

use crate::program::{DeclRef, GoFile, Program, Scope};

/// Predeclared type names.
const PREDECLARED: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

/// Alias chains longer than this are treated as unresolvable.
const MAX_ALIAS_DEPTH: usize = 32;

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED.contains(&name)
}

// ============================================================================
// Package names and qualifiers
// ============================================================================

/// The name a package is assumed to declare, from its import path alone.
///
/// Uses the last path element, skipping a `/vN` major-version suffix, and
/// trims a leading `go-` and anything from the first non-identifier
/// character on: `gopkg.in/yaml.v3` is `yaml`.
pub fn default_package_name(path: &str) -> String {
    let mut elems = path.rsplit('/');
    let mut last = elems.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = elems.next() {
            last = prev;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let end = last
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(last.len());
    last[..end].to_string()
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// The package name for `path`: the declared name when loaded, else assumed.
pub fn package_name_for(program: &Program, path: &str) -> String {
    match program.package(path) {
        Some(pkg) => pkg.name.clone(),
        None => default_package_name(path),
    }
}

/// The import path a qualifier refers to in `file`.
pub fn resolve_qualifier<'f>(program: &Program, file: &'f GoFile, qualifier: &str) -> Option<&'f str> {
    file.ast.import_specs().find_map(|spec| {
        let bound = match spec.name.as_deref() {
            Some("_") | Some(".") => return None,
            Some(name) => name == qualifier,
            None => package_name_for(program, &spec.path) == qualifier,
        };
        bound.then_some(spec.path.as_str())
    })
}

/// The explicit rename `file` gives the import of `path`, if any.
pub fn origin_alias<'f>(file: &'f GoFile, path: &str) -> Option<&'f str> {
    file.ast
        .import_specs()
        .filter(|spec| spec.path == path)
        .find_map(|spec| match spec.name.as_deref() {
            Some("_") | Some(".") | None => None,
            Some(name) => Some(name),
        })
}

/// Import paths `file` dot-imports.
pub fn dot_imports(file: &GoFile) -> impl Iterator<Item = &str> {
    file.ast
        .import_specs()
        .filter(|spec| spec.name.as_deref() == Some("."))
        .map(|spec| spec.path.as_str())
}

// ============================================================================
// Identifiers
// ============================================================================

/// What a bare identifier in type position refers to.
#[derive(Debug, Clone, Copy)]
pub enum NameResolution<'p> {
    /// A package-level type declaration.
    Declared(DeclRef<'p>),
    /// A predeclared type.
    Universe,
    /// Nothing visible; a type parameter or a name from a missing package.
    Unresolved,
}

/// Resolve the bare type name `name` as seen from `scope`.
pub fn resolve_name<'p>(program: &'p Program, scope: Scope<'p>, name: &str) -> NameResolution<'p> {
    if let Some(decl) = scope.package.lookup(name) {
        return NameResolution::Declared(decl);
    }
    for path in dot_imports(scope.file) {
        if let Some(decl) = program.package(path).and_then(|p| p.lookup(name)) {
            return NameResolution::Declared(decl);
        }
    }
    if is_predeclared(name) {
        NameResolution::Universe
    } else {
        NameResolution::Unresolved
    }
}

/// Resolve `qualifier.name` as seen from `scope`.
pub fn resolve_qualified<'p>(
    program: &'p Program,
    scope: Scope<'p>,
    qualifier: &str,
    name: &str,
) -> Option<DeclRef<'p>> {
    let path = resolve_qualifier(program, scope.file, qualifier)?;
    program.package(path)?.lookup(name)
}

/// The declaration a named type expression refers to, looking through
/// pointers, parentheses and instantiation: the `T` of `*pkg.T[int]`.
pub fn resolve_named<'p>(program: &'p Program, scope: Scope<'p>, ty: &TypeExpr) -> Option<DeclRef<'p>> {
    match ty {
        TypeExpr::Name(name) => match resolve_name(program, scope, name) {
            NameResolution::Declared(decl) => Some(decl),
            _ => None,
        },
        TypeExpr::Qualified { package, name } => resolve_qualified(program, scope, package, name),
        TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => resolve_named(program, scope, inner),
        TypeExpr::Generic { base, .. } => resolve_named(program, scope, base),
        _ => None,
    }
}

/// Follow `type A = B` chains to the first non-alias declaration.
pub fn follow_alias<'p>(program: &'p Program, decl: DeclRef<'p>) -> Option<DeclRef<'p>> {
    let mut decl = decl;
    for _ in 0..MAX_ALIAS_DEPTH {
        if !decl.spec.alias {
            return Some(decl);
        }
        decl = resolve_named(program, decl.scope(), decl.spec.ty.unparen())?;
    }
    None
}

// ============================================================================
// Canonical type strings
// ============================================================================

/// A string that identifies the type `ty` denotes from `scope`.
///
/// Named types become `importpath.Name`, aliases are followed, `byte` and
/// `rune` become `uint8` and `int32`, `any` becomes `interface{}`, and
/// parameter names and parentheses disappear.
pub fn canonical(program: &Program, scope: Scope<'_>, ty: &TypeExpr) -> String {
    let mut out = String::new();
    write_canonical(program, scope, ty, 0, &mut out);
    out
}

fn write_canonical(program: &Program, scope: Scope<'_>, ty: &TypeExpr, depth: usize, out: &mut String) {
    match ty {
        TypeExpr::Name(name) => match resolve_name(program, scope, name) {
            NameResolution::Declared(decl) => write_declared(program, decl, depth, out),
            NameResolution::Universe => out.push_str(match name.as_str() {
                "byte" => "uint8",
                "rune" => "int32",
                "any" => "interface{}",
                other => other,
            }),
            NameResolution::Unresolved => out.push_str(name),
        },
        TypeExpr::Qualified { package, name } => {
            match resolve_qualifier(program, scope.file, package) {
                Some(path) => match program.package(path).and_then(|p| p.lookup(name)) {
                    Some(decl) => write_declared(program, decl, depth, out),
                    None => {
                        out.push_str(path);
                        out.push('.');
                        out.push_str(name);
                    }
                },
                None => {
                    out.push_str(package);
                    out.push('.');
                    out.push_str(name);
                }
            }
        }
        TypeExpr::Generic { base, args } => {
            write_canonical(program, scope, base, depth, out);
            out.push('[');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_canonical(program, scope, arg, depth, out);
            }
            out.push(']');
        }
        TypeExpr::Pointer(inner) => {
            out.push('*');
            write_canonical(program, scope, inner, depth, out);
        }
        TypeExpr::Slice(inner) | TypeExpr::Ellipsis(inner) => {
            out.push_str("[]");
            write_canonical(program, scope, inner, depth, out);
        }
        TypeExpr::Array { len, elem } => {
            out.push('[');
            out.push_str(len);
            out.push(']');
            write_canonical(program, scope, elem, depth, out);
        }
        TypeExpr::Map { key, value } => {
            out.push_str("map[");
            write_canonical(program, scope, key, depth, out);
            out.push(']');
            write_canonical(program, scope, value, depth, out);
        }
        TypeExpr::Chan { dir, elem } => {
            out.push_str(match dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            write_canonical(program, scope, elem, depth, out);
        }
        TypeExpr::Func(sig) => {
            out.push_str("func");
            out.push_str(&method_shape(program, scope, sig).to_string());
        }
        TypeExpr::Interface(iface) => {
            let mut elems: Vec<String> = iface
                .elems
                .iter()
                .map(|elem| match elem {
                    InterfaceElem::Method(m) => {
                        format!("{}{}", m.name, method_shape(program, scope, &m.sig))
                    }
                    InterfaceElem::Embed(t) => canonical(program, scope, t),
                })
                .collect();
            elems.sort();
            if elems.is_empty() {
                out.push_str("interface{}");
            } else {
                out.push_str("interface{");
                out.push_str(&elems.join("; "));
                out.push('}');
            }
        }
        TypeExpr::Struct(st) => {
            out.push_str("struct{");
            let mut first = true;
            for field in &st.fields {
                let ty = canonical(program, scope, &field.ty);
                let tag = field.tag.as_deref().map(|t| format!(" {}", t)).unwrap_or_default();
                let entries: Vec<String> = if field.is_embedded() {
                    vec![format!("{}{}", ty, tag)]
                } else {
                    field
                        .names
                        .iter()
                        .map(|n| format!("{} {}{}", n, ty, tag))
                        .collect()
                };
                for entry in entries {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(&entry);
                }
            }
            out.push('}');
        }
        TypeExpr::Paren(inner) => write_canonical(program, scope, inner, depth, out),
        TypeExpr::Union(terms) => {
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                if term.tilde {
                    out.push('~');
                }
                write_canonical(program, scope, &term.ty, depth, out);
            }
        }
    }
}

fn write_declared(program: &Program, decl: DeclRef<'_>, depth: usize, out: &mut String) {
    if decl.spec.alias && decl.spec.type_params.is_empty() && depth < MAX_ALIAS_DEPTH {
        write_canonical(program, decl.scope(), &decl.spec.ty, depth + 1, out);
    } else {
        out.push_str(&decl.qualified_name());
    }
}

// ============================================================================
// Method shapes
// ============================================================================

/// A signature reduced to canonical parameter and result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    pub params: Vec<String>,
    pub results: Vec<String>,
    /// The final parameter is `...T`; it appears in `params` as `[]T`.
    pub variadic: bool,
}

/// The shape of `sig` as written in `scope`.
pub fn method_shape(program: &Program, scope: Scope<'_>, sig: &FuncType) -> MethodShape {
    let expand = |params: &[Param]| -> Vec<String> {
        params
            .iter()
            .flat_map(|p| {
                let ty = canonical(program, scope, &p.ty);
                std::iter::repeat_n(ty, p.arity())
            })
            .collect()
    };
    MethodShape {
        params: expand(&sig.params),
        results: expand(&sig.results),
        variadic: sig.is_variadic(),
    }
}

impl fmt::Display for MethodShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match param.strip_prefix("[]") {
                Some(elem) if self.variadic && i == last => write!(f, "...{}", elem)?,
                _ => write!(f, "{}", param)?,
            }
        }
        write!(f, ")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [one] => write!(f, " {}", one),
            many => write!(f, " ({})", many.join(", ")),
        }
    }
}
