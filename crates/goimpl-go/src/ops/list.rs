//! Listing the exported interfaces under a package pattern.

use tracing::debug;

use goimpl_syntax::TypeExpr;

use crate::error::{StubError, StubResult};
use crate::expand::interface_of;
use crate::program::{DeclRef, Program};
use crate::source::PackageSource;

/// `<main module>/...`, the pattern used when none is given.
pub fn default_pattern(source: &dyn PackageSource) -> StubResult<String> {
    source
        .main_module()
        .map(|module| format!("{}/...", module))
        .ok_or_else(|| StubError::InvalidArguments("no go.mod found; pass a package pattern".to_string()))
}

/// Every exported interface in the packages matching `pattern`, as
/// `importpath.Name`.
pub fn list_interfaces(source: &dyn PackageSource, pattern: &str) -> StubResult<Vec<String>> {
    let roots = source.expand_pattern(pattern);
    debug!("{} matches {} packages", pattern, roots.len());
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let root_refs: Vec<&str> = roots.iter().map(String::as_str).collect();
    let program = Program::load(source, &root_refs)?;
    Ok(interfaces_in(&program, &roots))
}

/// The exported interfaces of the `roots` packages of `program`: packages in
/// path order, declarations in file then source order.
pub fn interfaces_in(program: &Program, roots: &[String]) -> Vec<String> {
    let mut roots: Vec<&str> = roots.iter().map(String::as_str).collect();
    roots.sort_unstable();
    roots.dedup();

    roots
        .into_iter()
        .filter_map(|path| program.package(path))
        .flat_map(|package| package.type_decls())
        .filter(|decl| is_exported(decl.name()) && is_interface(program, *decl))
        .map(|decl| decl.qualified_name())
        .collect()
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn is_interface(program: &Program, decl: DeclRef<'_>) -> bool {
    matches!(decl.spec.ty.unparen(), TypeExpr::Interface(_)) || interface_of(program, decl).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const SHAPES: &str = "package shapes\n\ntype Shape interface {\n\tArea() float64\n}\n\ntype square struct{}\n\ntype Solid interface {\n\tShape\n\tVolume() float64\n}\n\ntype hidden interface{}\n\ntype Figure = Shape\n\ntype Set[T any] interface {\n\tAdd(T)\n}\n\ntype Box struct{}\n\ntype Anything any\n";
    const DRAW: &str = "package draw\n\nimport \"example.com/shapes\"\n\ntype Canvas interface {\n\tDraw(s shapes.Shape)\n}\n";

    fn source() -> MemorySource {
        MemorySource::new()
            .with_module("example.com")
            .with_file("example.com/shapes", "shapes.go", SHAPES)
            .with_file("example.com/shapes/draw", "draw.go", DRAW)
    }

    #[test]
    fn exported_interfaces_in_path_then_source_order() {
        let names = list_interfaces(&source(), "example.com/shapes/...").unwrap();
        assert_eq!(
            names,
            [
                "example.com/shapes.Shape",
                "example.com/shapes.Solid",
                "example.com/shapes.Figure",
                "example.com/shapes.Set",
                "example.com/shapes.Anything",
                "example.com/shapes/draw.Canvas",
            ]
        );
    }

    #[test]
    fn single_package_pattern() {
        let names = list_interfaces(&source(), "example.com/shapes/draw").unwrap();
        assert_eq!(names, ["example.com/shapes/draw.Canvas"]);
    }

    #[test]
    fn unmatched_pattern_is_empty() {
        assert!(list_interfaces(&source(), "example.com/nothing/...")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn default_pattern_needs_a_module() {
        assert_eq!(default_pattern(&source()).unwrap(), "example.com/...");
        assert!(matches!(
            default_pattern(&MemorySource::new()),
            Err(StubError::InvalidArguments(_))
        ));
    }
}
