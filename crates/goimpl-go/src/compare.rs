//! Classifying interface methods against a concrete method set.

use tracing::debug;

use goimpl_syntax::MethodSpec;

use crate::error::{StubError, StubResult};
use crate::expand::MethodGroup;
use crate::method_set::MethodSet;
use crate::program::{Program, Scope};
use crate::resolve::method_shape;

/// An interface method the concrete type lacks.
#[derive(Debug, Clone)]
pub struct MissingMethod<'p> {
    /// Where the method's signature was written.
    pub scope: Scope<'p>,
    pub method: MethodSpec,
    /// `importpath.Name` of the interface that declared it.
    pub interface: String,
}

/// Collect the methods of `groups` that `set` does not have, in group order.
///
/// A method that is present with a different signature fails the whole
/// comparison.
pub fn find_missing<'p>(
    program: &'p Program,
    groups: &[MethodGroup<'p>],
    set: &MethodSet<'p>,
) -> StubResult<Vec<MissingMethod<'p>>> {
    let mut missing = Vec::new();
    for group in groups {
        for method in &group.methods {
            let Some(have) = set.get(&method.name) else {
                debug!("{}: {} missing", group.interface, method.name);
                missing.push(MissingMethod {
                    scope: group.scope,
                    method: method.clone(),
                    interface: group.interface.clone(),
                });
                continue;
            };

            let want = method_shape(program, group.scope, &method.sig);
            let got = method_shape(program, have.scope, &have.sig);
            if want != got {
                return Err(StubError::SignatureMismatch {
                    name: method.name.clone(),
                    want: want.to_string(),
                    have: got.to_string(),
                });
            }
            debug!("{}: {} present", group.interface, method.name);
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::{expand, Claimed};
    use crate::method_set::method_set;
    use crate::source::MemorySource;
    use goimpl_core::types::TypeRef;

    const API: &str = "package api\n\nimport \"example.com/models\"\n\ntype Store interface {\n\tGet(id string) (*models.Item, error)\n\tPut(item *models.Item) error\n\tList(prefix string, limit ...int) []models.Item\n}\n";
    const MODELS: &str = "package models\n\ntype Item struct{}\n";
    const IMPL: &str = "package impl\n\nimport (\n\tm \"example.com/models\"\n)\n\ntype Partial struct{}\n\nfunc (p *Partial) Get(key string) (*m.Item, error) { return nil, nil }\n\ntype Wrong struct{}\n\nfunc (w Wrong) Put(item m.Item) error { return nil }\n\ntype Slice struct{}\n\nfunc (s *Slice) List(prefix string, limit []int) []m.Item { return nil }\n";

    fn program() -> Program {
        let source = MemorySource::new()
            .with_file("example.com/api", "api.go", API)
            .with_file("example.com/models", "models.go", MODELS)
            .with_file("example.com/impl", "impl.go", IMPL);
        Program::load(&source, &["example.com/api", "example.com/impl"]).unwrap()
    }

    fn missing(program: &Program, concrete: &str) -> StubResult<Vec<String>> {
        let iface = program
            .lookup(&TypeRef::new("example.com/api", "Store"))
            .unwrap();
        let decl = program
            .lookup(&TypeRef::new("example.com/impl", concrete))
            .unwrap();
        let (groups, _) = expand(program, iface, Claimed::new())?;
        let set = method_set(program, decl)?;
        Ok(find_missing(program, &groups, &set)?
            .into_iter()
            .map(|m| m.method.name)
            .collect())
    }

    #[test]
    fn present_methods_match_across_aliases() {
        assert_eq!(missing(&program(), "Partial").unwrap(), ["Put", "List"]);
    }

    #[test]
    fn mismatch_aborts() {
        match missing(&program(), "Wrong") {
            Err(StubError::SignatureMismatch { name, want, have }) => {
                assert_eq!(name, "Put");
                assert_eq!(want, "(*example.com/models.Item) error");
                assert_eq!(have, "(example.com/models.Item) error");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn variadic_must_match() {
        assert!(matches!(
            missing(&program(), "Slice"),
            Err(StubError::SignatureMismatch { name, .. }) if name == "List"
        ));
    }
}
