//! Method sets of concrete types.
//!
//! The set combines value and pointer receivers, since stubs are always
//! declared on the pointer receiver. Methods promoted through embedded
//! fields are found breadth first: a shallower method or field hides a
//! deeper one, and two candidates at the same depth hide each other.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use goimpl_syntax::{FuncType, Param, StructType, TypeExpr};

use crate::error::StubResult;
use crate::expand::{expand, Claimed};
use crate::program::{DeclRef, Program, Scope};
use crate::resolve::{follow_alias, resolve_named};

/// Hops allowed when looking for a type's underlying type.
const MAX_UNDERLYING_DEPTH: usize = 32;

/// One method of a concrete type.
#[derive(Debug, Clone)]
pub struct MethodEntry<'p> {
    /// Where the signature was written.
    pub scope: Scope<'p>,
    pub sig: FuncType,
    /// Embedding depth; 0 for methods declared on the type itself.
    pub depth: usize,
}

/// The methods reachable on a type, by name.
#[derive(Debug, Clone, Default)]
pub struct MethodSet<'p> {
    methods: BTreeMap<String, MethodEntry<'p>>,
}

impl<'p> MethodSet<'p> {
    pub fn get(&self, name: &str) -> Option<&MethodEntry<'p>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Method names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

/// A node of the embedding walk.
#[derive(Debug, Clone, Copy)]
enum Embedded<'p> {
    Decl(DeclRef<'p>),
    /// The predeclared `error`, embedded in a struct written in this scope.
    Error(Scope<'p>),
}

/// Compute the combined method set of the type `decl` declares.
pub fn method_set<'p>(program: &'p Program, decl: DeclRef<'p>) -> StubResult<MethodSet<'p>> {
    let Some(root) = follow_alias(program, decl) else {
        warn!("alias {} does not resolve; empty method set", decl.qualified_name());
        return Ok(MethodSet::default());
    };

    let mut set = MethodSet::default();
    let mut hidden: BTreeSet<String> = BTreeSet::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut current = vec![Embedded::Decl(root)];
    let mut depth = 0;

    while !current.is_empty() {
        let mut candidates: BTreeMap<String, Vec<MethodEntry<'p>>> = BTreeMap::new();
        let mut fields: BTreeSet<String> = BTreeSet::new();
        let mut next = Vec::new();

        for node in current {
            let decl = match node {
                Embedded::Decl(decl) => decl,
                Embedded::Error(scope) => {
                    let entry = MethodEntry {
                        scope,
                        sig: error_signature(),
                        depth,
                    };
                    candidates.entry("Error".to_string()).or_default().push(entry);
                    continue;
                }
            };
            if !seen.insert(decl.qualified_name()) {
                continue;
            }
            match declared_methods(program, decl, depth) {
                Ok(methods) => {
                    for (name, entry) in methods {
                        candidates.entry(name).or_default().push(entry);
                    }
                }
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    warn!("skipping embedded {}: {}", decl.qualified_name(), e);
                    continue;
                }
            }
            if let (scope, TypeExpr::Struct(st)) = underlying(program, decl) {
                collect_fields(program, scope, st, &mut fields, &mut next);
            }
        }

        for (name, mut entries) in candidates {
            if hidden.contains(&name) {
                continue;
            }
            if entries.len() == 1 && !fields.contains(&name) {
                if let Some(entry) = entries.pop() {
                    set.methods.insert(name.clone(), entry);
                }
            } else {
                debug!("{} is ambiguous at depth {}", name, depth);
            }
            hidden.insert(name);
        }
        hidden.extend(fields);

        current = next;
        depth += 1;
    }

    debug!(
        "method set of {}: {} methods",
        root.qualified_name(),
        set.len()
    );
    Ok(set)
}

/// Methods `decl` itself contributes at `depth`.
fn declared_methods<'p>(
    program: &'p Program,
    decl: DeclRef<'p>,
    depth: usize,
) -> StubResult<Vec<(String, MethodEntry<'p>)>> {
    if is_interface(program, decl) {
        let (groups, _) = expand(program, decl, Claimed::new())?;
        return Ok(groups
            .into_iter()
            .flat_map(|group| {
                let scope = group.scope;
                group.methods.into_iter().map(move |m| {
                    let entry = MethodEntry {
                        scope,
                        sig: m.sig,
                        depth,
                    };
                    (m.name, entry)
                })
            })
            .collect());
    }

    Ok(decl
        .package
        .methods_of(decl.name())
        .map(|(file, func)| {
            let entry = MethodEntry {
                scope: Scope {
                    package: decl.package,
                    file,
                },
                sig: func.sig.clone(),
                depth,
            };
            (func.name.clone(), entry)
        })
        .collect())
}

fn is_interface(program: &Program, decl: DeclRef<'_>) -> bool {
    match underlying(program, decl).1 {
        TypeExpr::Interface(_) => true,
        TypeExpr::Name(name) => name == "any" || name == "error",
        _ => false,
    }
}

/// Follow named types from `decl` to the type expression that defines them,
/// with the scope it was written in. Stops at names that do not resolve.
fn underlying<'p>(program: &'p Program, decl: DeclRef<'p>) -> (Scope<'p>, &'p TypeExpr) {
    let mut current = decl;
    for _ in 0..MAX_UNDERLYING_DEPTH {
        let ty = current.spec.ty.unparen();
        match ty {
            TypeExpr::Name(_) | TypeExpr::Qualified { .. } | TypeExpr::Generic { .. } => {
                match resolve_named(program, current.scope(), ty) {
                    Some(next) => current = next,
                    None => return (current.scope(), ty),
                }
            }
            _ => return (current.scope(), ty),
        }
    }
    (current.scope(), current.spec.ty.unparen())
}

/// Record the field names of `st` and queue its embedded types.
fn collect_fields<'p>(
    program: &'p Program,
    scope: Scope<'p>,
    st: &'p StructType,
    fields: &mut BTreeSet<String>,
    next: &mut Vec<Embedded<'p>>,
) {
    for field in &st.fields {
        if !field.is_embedded() {
            fields.extend(field.names.iter().cloned());
            continue;
        }
        if let Some(name) = embedded_field_name(&field.ty) {
            fields.insert(name.to_string());
        }
        match resolve_named(program, scope, &field.ty) {
            Some(decl) => match follow_alias(program, decl) {
                Some(decl) => next.push(Embedded::Decl(decl)),
                None => debug!("embedded alias {} does not resolve", decl.qualified_name()),
            },
            None if matches!(field.ty.unparen(), TypeExpr::Name(n) if n == "error") => {
                next.push(Embedded::Error(scope));
            }
            None => debug!("embedded field in {} does not resolve", scope.file.path),
        }
    }
}

/// The implicit field name of an embedded field: `T` for `*pkg.T[int]`.
fn embedded_field_name(ty: &TypeExpr) -> Option<&str> {
    match ty {
        TypeExpr::Name(name) => Some(name),
        TypeExpr::Qualified { name, .. } => Some(name),
        TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => embedded_field_name(inner),
        TypeExpr::Generic { base, .. } => embedded_field_name(base),
        _ => None,
    }
}

/// `() string`
fn error_signature() -> FuncType {
    FuncType {
        params: Vec::new(),
        results: vec![Param::unnamed(TypeExpr::Name("string".to_string()))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use goimpl_core::types::TypeRef;

    const BASE: &str = "package base\n\ntype Base struct{}\n\nfunc (Base) Hello() string { return \"\" }\n\nfunc (*Base) Close() error { return nil }\n\ntype Namer interface {\n\tName() string\n}\n";

    const KINDS: &str = "package kinds\n\nimport \"example.com/base\"\n\ntype Plain struct{}\n\nfunc (p Plain) Value() {}\n\nfunc (p *Plain) Pointer() {}\n\ntype Embeds struct {\n\t*base.Base\n\tbase.Namer\n}\n\ntype Shadows struct {\n\tbase.Base\n}\n\nfunc (Shadows) Hello() int { return 0 }\n\ntype Left struct{}\n\nfunc (Left) Both() {}\n\ntype Right struct{}\n\nfunc (Right) Both() {}\n\ntype Ambiguous struct {\n\tLeft\n\tRight\n}\n\ntype Fielded struct {\n\tHello string\n\tbase.Base\n}\n\ntype Deep struct {\n\tAmbiguous\n\tRight\n}\n\ntype Again = Plain\n\ntype Iface interface {\n\tbase.Namer\n\tRun()\n}\n\ntype Loop struct {\n\t*Loop\n}\n\nfunc (*Loop) Spin() {}\n\ntype Failure struct {\n\terror\n\tcode int\n}\n";

    fn program() -> Program {
        let source = MemorySource::new()
            .with_file("example.com/kinds", "kinds.go", KINDS)
            .with_file("example.com/base", "base.go", BASE);
        Program::load(&source, &["example.com/kinds"]).unwrap()
    }

    fn names(program: &Program, ty: &str) -> Vec<String> {
        let decl = program
            .lookup(&TypeRef::new("example.com/kinds", ty))
            .unwrap();
        method_set(program, decl)
            .unwrap()
            .names()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn value_and_pointer_receivers() {
        assert_eq!(names(&program(), "Plain"), ["Pointer", "Value"]);
    }

    #[test]
    fn promoted_through_embedding() {
        let program = program();
        assert_eq!(names(&program, "Embeds"), ["Close", "Hello", "Name"]);
        let decl = program
            .lookup(&TypeRef::new("example.com/kinds", "Embeds"))
            .unwrap();
        let set = method_set(&program, decl).unwrap();
        let hello = set.get("Hello").unwrap();
        assert_eq!(hello.depth, 1);
        assert_eq!(hello.scope.package.path, "example.com/base");
    }

    #[test]
    fn shallower_methods_shadow() {
        let program = program();
        let decl = program
            .lookup(&TypeRef::new("example.com/kinds", "Shadows"))
            .unwrap();
        let set = method_set(&program, decl).unwrap();
        assert_eq!(set.get("Hello").unwrap().depth, 0);
        assert!(set.contains("Close"));
    }

    #[test]
    fn same_depth_conflicts_cancel() {
        assert!(names(&program(), "Ambiguous").is_empty());
        // Right.Both at depth 1 hides the ambiguous pair at depth 2.
        assert_eq!(names(&program(), "Deep"), ["Both"]);
    }

    #[test]
    fn fields_hide_promoted_methods() {
        assert_eq!(names(&program(), "Fielded"), ["Close"]);
    }

    #[test]
    fn aliases_and_interfaces() {
        let program = program();
        assert_eq!(names(&program, "Again"), ["Pointer", "Value"]);
        assert_eq!(names(&program, "Iface"), ["Name", "Run"]);
    }

    #[test]
    fn embedded_error_promotes_error() {
        let program = program();
        assert_eq!(names(&program, "Failure"), ["Error"]);
        let decl = program
            .lookup(&TypeRef::new("example.com/kinds", "Failure"))
            .unwrap();
        let set = method_set(&program, decl).unwrap();
        assert_eq!(set.get("Error").unwrap().depth, 1);
    }

    #[test]
    fn self_embedding_terminates() {
        assert_eq!(names(&program(), "Loop"), ["Spin"]);
    }
}
