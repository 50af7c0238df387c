//! Interface expansion.
//!
//! Flattens an interface and everything it embeds into an ordered list of
//! [`MethodGroup`]s. Embedded interfaces are expanded depth first, in
//! declaration order, before the embedding interface's own methods. The
//! first occurrence of a method name claims it; later occurrences are
//! dropped even when their signatures differ.
//!
//! The set of claimed names is passed in and handed back rather than shared,
//! so an expansion can be started from any prior state and inspected after.

use std::collections::BTreeSet;

use tracing::debug;

use goimpl_syntax::{FuncType, InterfaceType, MethodSpec, Param, TypeExpr};

use crate::error::{StubError, StubResult};
use crate::program::{DeclRef, Program, Scope};
use crate::resolve::{dot_imports, resolve_name, resolve_qualifier, NameResolution};

static EMPTY: InterfaceType = InterfaceType { elems: Vec::new() };

/// Method names already claimed by an earlier point of the traversal.
pub type Claimed = BTreeSet<String>;

/// Methods contributed by one interface declaration.
#[derive(Debug, Clone)]
pub struct MethodGroup<'p> {
    /// `importpath.Name` of the declaring interface.
    pub interface: String,
    /// Where the methods' signatures were written.
    pub scope: Scope<'p>,
    pub methods: Vec<MethodSpec>,
}

/// Expand the interface `decl` declares.
///
/// Returns the groups in discovery order together with the claimed set
/// extended by every name discovered.
pub fn expand<'p>(
    program: &'p Program,
    decl: DeclRef<'p>,
    claimed: Claimed,
) -> StubResult<(Vec<MethodGroup<'p>>, Claimed)> {
    let mut stack = Vec::new();
    expand_decl(program, decl, claimed, &mut stack)
}

/// Follow named types from `decl` to the interface literal that defines it.
pub fn interface_of<'p>(
    program: &'p Program,
    decl: DeclRef<'p>,
) -> StubResult<(DeclRef<'p>, &'p InterfaceType)> {
    let mut current = decl;
    // Named types chain through at most one hop per declaration; the bound
    // only stops `type A B; type B A`.
    for _ in 0..32 {
        if !current.spec.type_params.is_empty() {
            return Err(generic_interface(decl));
        }
        let scope = current.scope();
        match current.spec.ty.unparen() {
            TypeExpr::Interface(iface) => return Ok((current, iface)),
            TypeExpr::Name(name) => match resolve_name(program, scope, name) {
                NameResolution::Declared(next) => current = next,
                NameResolution::Universe if name == "any" => return Ok((current, &EMPTY)),
                NameResolution::Universe if name == "error" => {
                    return Err(StubError::InvalidInterface {
                        name: decl.qualified_name(),
                        reason: "defined from predeclared error".to_string(),
                    })
                }
                NameResolution::Universe => {
                    return Err(StubError::NotAnInterface {
                        name: decl.qualified_name(),
                    })
                }
                NameResolution::Unresolved => return Err(unresolved_name(scope, name)),
            },
            TypeExpr::Qualified { package, name } => {
                current = resolve_embedded_qualified(program, scope, package, name)?;
            }
            TypeExpr::Generic { .. } => return Err(generic_interface(decl)),
            _ => {
                return Err(StubError::NotAnInterface {
                    name: decl.qualified_name(),
                })
            }
        }
    }
    Err(StubError::InvalidInterface {
        name: decl.qualified_name(),
        reason: "type definition cycle".to_string(),
    })
}

fn expand_decl<'p>(
    program: &'p Program,
    decl: DeclRef<'p>,
    claimed: Claimed,
    stack: &mut Vec<String>,
) -> StubResult<(Vec<MethodGroup<'p>>, Claimed)> {
    let (target, iface) = interface_of(program, decl)?;
    let name = target.qualified_name();
    if stack.contains(&name) {
        let root = stack.first().cloned().unwrap_or_else(|| name.clone());
        return Err(StubError::InvalidInterface {
            name: root,
            reason: format!("embedding cycle through {}", name),
        });
    }

    stack.push(name.clone());
    let result = expand_literal(program, target.scope(), &name, iface, claimed, stack);
    stack.pop();
    result
}

fn expand_literal<'p>(
    program: &'p Program,
    scope: Scope<'p>,
    interface: &str,
    iface: &'p InterfaceType,
    claimed: Claimed,
    stack: &mut Vec<String>,
) -> StubResult<(Vec<MethodGroup<'p>>, Claimed)> {
    let mut groups = Vec::new();
    let mut claimed = claimed;

    for embed in iface.embeds() {
        let (embedded, next) = match embed.unparen() {
            TypeExpr::Name(name) => match resolve_name(program, scope, name) {
                NameResolution::Declared(decl) => expand_embedded(program, decl, claimed, stack)?,
                NameResolution::Universe if name == "error" => {
                    let method = error_method();
                    claim_group(interface, scope, std::iter::once(method), claimed)
                }
                NameResolution::Universe => (Vec::new(), claimed),
                NameResolution::Unresolved => return Err(unresolved_name(scope, name)),
            },
            TypeExpr::Qualified { package, name } => {
                let decl = resolve_embedded_qualified(program, scope, package, name)?;
                expand_embedded(program, decl, claimed, stack)?
            }
            TypeExpr::Interface(inner) => {
                expand_literal(program, scope, interface, inner, claimed, stack)?
            }
            TypeExpr::Generic { .. } => {
                return Err(StubError::InvalidInterface {
                    name: interface.to_string(),
                    reason: "generic interfaces are not supported".to_string(),
                })
            }
            // Union and approximation terms constrain the type set only.
            _ => (Vec::new(), claimed),
        };
        groups.extend(embedded);
        claimed = next;
    }

    let (own, claimed) = claim_group(interface, scope, iface.methods().cloned(), claimed);
    groups.extend(own);
    Ok((groups, claimed))
}

/// Expand an embedded declaration. Non-interface types contribute nothing.
fn expand_embedded<'p>(
    program: &'p Program,
    decl: DeclRef<'p>,
    claimed: Claimed,
    stack: &mut Vec<String>,
) -> StubResult<(Vec<MethodGroup<'p>>, Claimed)> {
    match expand_decl(program, decl, claimed.clone(), stack) {
        Err(StubError::NotAnInterface { name }) => {
            debug!("embedded {} is not an interface; no methods", name);
            Ok((Vec::new(), claimed))
        }
        other => other,
    }
}

/// Claim each unclaimed method into one group for `interface`.
fn claim_group<'p>(
    interface: &str,
    scope: Scope<'p>,
    methods: impl Iterator<Item = MethodSpec>,
    claimed: Claimed,
) -> (Vec<MethodGroup<'p>>, Claimed) {
    let mut claimed = claimed;
    let mut kept = Vec::new();
    for method in methods {
        if claimed.insert(method.name.clone()) {
            kept.push(method);
        } else {
            debug!("{}.{} already claimed", interface, method.name);
        }
    }
    if kept.is_empty() {
        return (Vec::new(), claimed);
    }
    let group = MethodGroup {
        interface: interface.to_string(),
        scope,
        methods: kept,
    };
    (vec![group], claimed)
}

fn resolve_embedded_qualified<'p>(
    program: &'p Program,
    scope: Scope<'p>,
    qualifier: &str,
    name: &str,
) -> StubResult<DeclRef<'p>> {
    let Some(path) = resolve_qualifier(program, scope.file, qualifier) else {
        return Err(StubError::UnresolvedQualifier {
            qualifier: qualifier.to_string(),
            file: scope.file.path.clone(),
        });
    };
    let Some(package) = program.package(path) else {
        return Err(StubError::DependencyMissing {
            package: path.to_string(),
            interface: format!("{}.{}", qualifier, name),
        });
    };
    package
        .lookup(name)
        .ok_or_else(|| StubError::DeclarationNotFound {
            package: path.to_string(),
            name: name.to_string(),
        })
}

/// A bare name nothing declares: either it lives in a dot-imported package
/// that was not loaded, or it does not exist.
fn unresolved_name(scope: Scope<'_>, name: &str) -> StubError {
    match dot_imports(scope.file).next() {
        Some(path) => StubError::DependencyMissing {
            package: path.to_string(),
            interface: name.to_string(),
        },
        None => StubError::DeclarationNotFound {
            package: scope.package.path.clone(),
            name: name.to_string(),
        },
    }
}

fn generic_interface(decl: DeclRef<'_>) -> StubError {
    StubError::InvalidInterface {
        name: decl.qualified_name(),
        reason: "generic interfaces are not supported".to_string(),
    }
}

/// `Error() string`, the method of the predeclared `error` interface.
fn error_method() -> MethodSpec {
    MethodSpec {
        name: "Error".to_string(),
        sig: FuncType {
            params: Vec::new(),
            results: vec![Param::unnamed(TypeExpr::Name("string".to_string()))],
        },
    }
}
