// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor and transformer infrastructure for type expressions.
//!
//! [`TypeTransformer`] rewrites a tree in place. At every node the transformer
//! decides whether to descend, keep the node as is, or substitute it; a
//! substituted node is not visited again. [`TypeVisitor`] is the read-only
//! counterpart.
//!
//! Children are visited in source order: pointer targets, slice and array
//! elements, map keys then values, channel elements, function parameters then
//! results, interface elements, struct field types, generic bases then
//! arguments, union terms, variadic elements.

use crate::ast::{FuncType, InterfaceElem, TypeExpr};

// ============================================================================
// Transformer
// ============================================================================

/// What a transformer wants done with the node it was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Keep the node and descend into its children.
    Continue,
    /// Keep the node and do not descend.
    Skip,
    /// Substitute the node; the replacement is not visited.
    Replace(TypeExpr),
}

/// Rewrites type expressions node by node.
pub trait TypeTransformer {
    fn transform(&mut self, node: &TypeExpr) -> Rewrite;
}

impl<F: FnMut(&TypeExpr) -> Rewrite> TypeTransformer for F {
    fn transform(&mut self, node: &TypeExpr) -> Rewrite {
        self(node)
    }
}

/// Apply `t` to `node` and, unless told otherwise, to its children.
pub fn transform_type_expr<T: TypeTransformer + ?Sized>(t: &mut T, node: &mut TypeExpr) {
    match t.transform(node) {
        Rewrite::Replace(replacement) => {
            *node = replacement;
            return;
        }
        Rewrite::Skip => return,
        Rewrite::Continue => {}
    }

    match node {
        TypeExpr::Name(_) | TypeExpr::Qualified { .. } => {}
        TypeExpr::Generic { base, args } => {
            transform_type_expr(t, base);
            for arg in args {
                transform_type_expr(t, arg);
            }
        }
        TypeExpr::Pointer(inner)
        | TypeExpr::Slice(inner)
        | TypeExpr::Paren(inner)
        | TypeExpr::Ellipsis(inner) => transform_type_expr(t, inner),
        TypeExpr::Array { elem, .. } | TypeExpr::Chan { elem, .. } => transform_type_expr(t, elem),
        TypeExpr::Map { key, value } => {
            transform_type_expr(t, key);
            transform_type_expr(t, value);
        }
        TypeExpr::Func(sig) => transform_func_type(t, sig),
        TypeExpr::Interface(iface) => {
            for elem in &mut iface.elems {
                match elem {
                    InterfaceElem::Method(m) => transform_func_type(t, &mut m.sig),
                    InterfaceElem::Embed(ty) => transform_type_expr(t, ty),
                }
            }
        }
        TypeExpr::Struct(st) => {
            for field in &mut st.fields {
                transform_type_expr(t, &mut field.ty);
            }
        }
        TypeExpr::Union(terms) => {
            for term in terms {
                transform_type_expr(t, &mut term.ty);
            }
        }
    }
}

/// Apply `t` to every parameter and result type of `sig`.
pub fn transform_func_type<T: TypeTransformer + ?Sized>(t: &mut T, sig: &mut FuncType) {
    for param in sig.params.iter_mut().chain(sig.results.iter_mut()) {
        transform_type_expr(t, &mut param.ty);
    }
}

// ============================================================================
// Visitor
// ============================================================================

/// Result of visiting a node; controls traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue into children.
    #[default]
    Continue,
    /// Skip children, continue with siblings.
    SkipChildren,
    /// Stop traversal entirely.
    Stop,
}

/// Observes type expressions without changing them.
pub trait TypeVisitor<'a> {
    fn visit(&mut self, node: &'a TypeExpr) -> VisitResult;
}

/// Walk `node` depth first. Returns `false` if the visitor stopped early.
pub fn walk_type_expr<'a, V: TypeVisitor<'a> + ?Sized>(v: &mut V, node: &'a TypeExpr) -> bool {
    match v.visit(node) {
        VisitResult::Stop => return false,
        VisitResult::SkipChildren => return true,
        VisitResult::Continue => {}
    }

    match node {
        TypeExpr::Name(_) | TypeExpr::Qualified { .. } => true,
        TypeExpr::Generic { base, args } => {
            walk_type_expr(v, base) && args.iter().all(|a| walk_type_expr(v, a))
        }
        TypeExpr::Pointer(inner)
        | TypeExpr::Slice(inner)
        | TypeExpr::Paren(inner)
        | TypeExpr::Ellipsis(inner) => walk_type_expr(v, inner),
        TypeExpr::Array { elem, .. } | TypeExpr::Chan { elem, .. } => walk_type_expr(v, elem),
        TypeExpr::Map { key, value } => walk_type_expr(v, key) && walk_type_expr(v, value),
        TypeExpr::Func(sig) => walk_func_type(v, sig),
        TypeExpr::Interface(iface) => iface.elems.iter().all(|elem| match elem {
            InterfaceElem::Method(m) => walk_func_type(v, &m.sig),
            InterfaceElem::Embed(ty) => walk_type_expr(v, ty),
        }),
        TypeExpr::Struct(st) => st.fields.iter().all(|f| walk_type_expr(v, &f.ty)),
        TypeExpr::Union(terms) => terms.iter().all(|term| walk_type_expr(v, &term.ty)),
    }
}

/// Walk every parameter and result type of `sig`.
pub fn walk_func_type<'a, V: TypeVisitor<'a> + ?Sized>(v: &mut V, sig: &'a FuncType) -> bool {
    sig.params
        .iter()
        .chain(sig.results.iter())
        .all(|p| walk_type_expr(v, &p.ty))
}

struct RefCollector<F> {
    f: F,
}

impl<'a, F: FnMut(&'a TypeExpr)> TypeVisitor<'a> for RefCollector<F> {
    fn visit(&mut self, node: &'a TypeExpr) -> VisitResult {
        if matches!(node, TypeExpr::Name(_) | TypeExpr::Qualified { .. }) {
            (self.f)(node);
        }
        VisitResult::Continue
    }
}

/// Call `f` on every `Name` and `Qualified` reference in `sig`, in source order.
pub fn walk_type_refs<'a>(sig: &'a FuncType, f: impl FnMut(&'a TypeExpr)) {
    let mut collector = RefCollector { f };
    walk_func_type(&mut collector, sig);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_type_expr;
    use crate::printer::print_type;

    fn func(src: &str) -> FuncType {
        match parse_type_expr(src).unwrap() {
            TypeExpr::Func(f) => f,
            other => panic!("expected func, got {:?}", other),
        }
    }

    mod transform {
        use super::*;

        #[test]
        fn replace_every_bare_name() {
            let mut ty = parse_type_expr("map[Key][]*Value").unwrap();
            let mut qualify = |node: &TypeExpr| match node {
                TypeExpr::Name(n) => Rewrite::Replace(TypeExpr::qualified("m", n.clone())),
                _ => Rewrite::Continue,
            };
            transform_type_expr(&mut qualify, &mut ty);
            assert_eq!(print_type(&ty), "map[m.Key][]*m.Value");
        }

        #[test]
        fn replacement_is_not_revisited() {
            let mut ty = parse_type_expr("T").unwrap();
            let mut calls = 0;
            let mut wrap = |_: &TypeExpr| {
                calls += 1;
                Rewrite::Replace(TypeExpr::Pointer(Box::new(TypeExpr::Name("T".into()))))
            };
            transform_type_expr(&mut wrap, &mut ty);
            assert_eq!(calls, 1);
            assert_eq!(print_type(&ty), "*T");
        }

        #[test]
        fn skip_leaves_children_alone() {
            let mut ty = parse_type_expr("func(A) interface{ M(B) }").unwrap();
            let mut rename = |node: &TypeExpr| match node {
                TypeExpr::Interface(_) => Rewrite::Skip,
                TypeExpr::Name(n) => Rewrite::Replace(TypeExpr::Name(format!("{}2", n))),
                _ => Rewrite::Continue,
            };
            transform_type_expr(&mut rename, &mut ty);
            assert_eq!(print_type(&ty), "func(A2) interface {\n\tM(B)\n}");
        }

        #[test]
        fn reaches_generic_args_and_union_terms() {
            let mut ty = parse_type_expr("interface{ List[Item]; ~Base | Other }").unwrap();
            let mut seen = Vec::new();
            let mut record = |node: &TypeExpr| {
                if let TypeExpr::Name(n) = node {
                    seen.push(n.clone());
                }
                Rewrite::Continue
            };
            transform_type_expr(&mut record, &mut ty);
            assert_eq!(seen, vec!["List", "Item", "Base", "Other"]);
        }
    }

    mod walk {
        use super::*;

        #[test]
        fn refs_in_source_order() {
            let sig = func("func(c *crowd.Crowd, xs ...models.Beverage) (map[string]Problem, error)");
            let mut refs = Vec::new();
            walk_type_refs(&sig, |node| refs.push(print_type(node)));
            assert_eq!(
                refs,
                vec!["crowd.Crowd", "models.Beverage", "string", "Problem", "error"]
            );
        }

        #[test]
        fn stop_ends_walk() {
            struct FirstQualified<'a>(Option<&'a TypeExpr>);
            impl<'a> TypeVisitor<'a> for FirstQualified<'a> {
                fn visit(&mut self, node: &'a TypeExpr) -> VisitResult {
                    if let TypeExpr::Qualified { .. } = node {
                        self.0 = Some(node);
                        return VisitResult::Stop;
                    }
                    VisitResult::Continue
                }
            }
            let sig = func("func(a int, b io.Reader, c io.Writer)");
            let mut v = FirstQualified(None);
            assert!(!walk_func_type(&mut v, &sig));
            assert_eq!(v.0, Some(&TypeExpr::qualified("io", "Reader")));
        }
    }
}
