//! Generating stubs for an interface on a concrete type.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use goimpl_core::output::Implementation;
use goimpl_core::patch::ContentHash;
use goimpl_core::types::TypeRef;

use super::{GenerateOptions, GenerateOutcome};
use crate::compare::find_missing;
use crate::emit::{emit, Stub};
use crate::error::{StubError, StubResult};
use crate::expand::{expand, Claimed};
use crate::method_set::method_set;
use crate::program::{DeclRef, Program};
use crate::rewrite::{ImportTable, Rewriter};
use crate::source::PackageSource;

fn lookup<'p>(program: &'p Program, r: &TypeRef) -> StubResult<DeclRef<'p>> {
    program
        .lookup(r)
        .ok_or_else(|| StubError::DeclarationNotFound {
            package: r.package.clone(),
            name: r.name.clone(),
        })
}

/// Compute the stubs `concrete` needs to implement `interface`.
///
/// Returns `Ok(None)` when nothing is missing. Nothing is written.
pub fn implement(
    program: &Program,
    interface: &TypeRef,
    concrete: &TypeRef,
) -> StubResult<Option<Implementation>> {
    let iface = lookup(program, interface)?;
    let dest = lookup(program, concrete)?;

    let (groups, claimed) = expand(program, iface, Claimed::new())?;
    debug!("{} flattens to {} methods", interface, claimed.len());
    let set = method_set(program, dest)?;
    let missing = find_missing(program, &groups, &set)?;
    if missing.is_empty() {
        info!("{} already implements {}", concrete, interface);
        return Ok(None);
    }

    let mut imports = ImportTable::from_file(&dest.file.ast);
    let mut rewriter = Rewriter::new(program, dest.scope(), &mut imports);
    let mut stubs = Vec::with_capacity(missing.len());
    for m in missing {
        let mut sig = m.method.sig;
        rewriter.rewrite_signature(m.scope, &mut sig)?;
        stubs.push(Stub {
            name: m.method.name,
            sig,
        });
    }

    let implementation = emit(dest.file, dest.spec, &interface.name, &stubs, &imports)?;
    info!(
        "{} stubs for {} in {} ({} new imports)",
        stubs.len(),
        concrete,
        implementation.file,
        implementation.added_imports.len()
    );
    Ok(Some(implementation))
}

/// Load both packages from `source`, run [`implement`], and write the result
/// back when asked.
pub fn generate_stubs(
    source: &dyn PackageSource,
    interface: &TypeRef,
    concrete: &TypeRef,
    options: &GenerateOptions,
) -> StubResult<GenerateOutcome> {
    let program = Program::load(source, &[interface.package.as_str(), concrete.package.as_str()])?;
    let Some(implementation) = implement(&program, interface, concrete)? else {
        return Ok(GenerateOutcome::default());
    };

    let mut written = false;
    if options.write_back {
        let dest = lookup(&program, concrete)?;
        write_back(&implementation, &dest.file.hash)?;
        written = true;
    }
    Ok(GenerateOutcome {
        implementation: Some(implementation),
        written,
    })
}

/// Replace the destination file with `implementation.file_content`.
///
/// The file must still hash to `loaded`. The new content goes to a temporary
/// file in the same directory that is then renamed over the original, so
/// readers never see a partial file.
pub fn write_back(implementation: &Implementation, loaded: &ContentHash) -> StubResult<()> {
    let file = implementation.file.as_str();
    let path = Path::new(file);
    let apply = |what: &str, e: &dyn std::fmt::Display| StubError::apply(format!("{}: {}", what, e), file);

    let current = fs::read(path).map_err(|e| apply("cannot read destination", &e))?;
    if ContentHash::compute(&current) != *loaded {
        return Err(StubError::apply("file changed since it was loaded", file));
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| apply("cannot create temporary file", &e))?;
    tmp.write_all(implementation.file_content.as_bytes())
        .map_err(|e| apply("cannot write temporary file", &e))?;
    let permissions = fs::metadata(path)
        .map_err(|e| apply("cannot stat destination", &e))?
        .permissions();
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| apply("cannot set permissions", &e))?;
    tmp.persist(path)
        .map_err(|e| apply("cannot replace destination", &e.error))?;

    info!("wrote {}", file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    const IO: &str = "package io\n\ntype Writer interface {\n\tWrite(p []byte) (n int, err error)\n}\n\ntype Closer interface {\n\tClose() error\n}\n\ntype WriteCloser interface {\n\tWriter\n\tCloser\n}\n";

    fn source(goer: &str) -> MemorySource {
        MemorySource::new()
            .with_file("io", "io.go", IO)
            .with_file("example.com/goer", "goer.go", goer.to_string())
    }

    fn refs(iface: &str) -> (TypeRef, TypeRef) {
        (
            TypeRef::parse(iface).unwrap(),
            TypeRef::new("example.com/goer", "Goer"),
        )
    }

    mod engine {
        use super::*;

        #[test]
        fn writer_on_an_empty_type() {
            let source = source("package goer\n\ntype Goer struct{}\n");
            let (iface, concrete) = refs("io.Writer");
            let program = Program::load(&source, &["io", "example.com/goer"]).unwrap();
            let imp = implement(&program, &iface, &concrete).unwrap().unwrap();
            assert_eq!(
                imp.methods,
                "// Write implements Writer\nfunc (*Goer) Write(p []byte) (n int, err error) {\n\tpanic(\"unimplemented\")\n}\n"
            );
            assert!(imp.added_imports.is_empty());
            assert_eq!(imp.file, "example.com/goer/goer.go");
        }

        #[test]
        fn only_missing_methods_are_stubbed() {
            let source = source("package goer\n\ntype Goer struct{}\n\nfunc (g *Goer) Close() error { return nil }\n");
            let (iface, concrete) = refs("io.WriteCloser");
            let program = Program::load(&source, &["io", "example.com/goer"]).unwrap();
            let imp = implement(&program, &iface, &concrete).unwrap().unwrap();
            assert!(imp.methods.contains("func (*Goer) Write("));
            assert!(!imp.methods.contains("func (*Goer) Close("));
            assert!(!imp.methods.contains("// Close implements"));
            assert_eq!(imp.methods.matches("panic(\"unimplemented\")").count(), 1);
        }

        #[test]
        fn complete_types_need_nothing() {
            let source = source("package goer\n\ntype Goer struct{}\n\nfunc (Goer) Write(b []byte) (int, error) { return 0, nil }\n");
            let (iface, concrete) = refs("io.Writer");
            let program = Program::load(&source, &["io", "example.com/goer"]).unwrap();
            assert!(implement(&program, &iface, &concrete).unwrap().is_none());
        }

        #[test]
        fn unknown_names_are_not_found() {
            let source = source("package goer\n\ntype Goer struct{}\n");
            let program = Program::load(&source, &["io", "example.com/goer"]).unwrap();
            let (iface, _) = refs("io.Writer");
            match implement(&program, &iface, &TypeRef::new("example.com/goer", "Nope")) {
                Err(StubError::DeclarationNotFound { package, name }) => {
                    assert_eq!(package, "example.com/goer");
                    assert_eq!(name, "Nope");
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    mod generate {
        use super::*;

        #[test]
        fn loads_what_it_needs() {
            let source = source("package goer\n\ntype Goer struct{}\n");
            let (iface, concrete) = refs("io.WriteCloser");
            let outcome = generate_stubs(&source, &iface, &concrete, &GenerateOptions::default()).unwrap();
            assert!(!outcome.written);
            let imp = outcome.implementation.unwrap();
            assert!(imp.methods.contains("// Close implements WriteCloser"));
        }

        #[test]
        fn missing_package_is_a_load_error() {
            let source = source("package goer\n\ntype Goer struct{}\n");
            let (iface, _) = refs("io.Writer");
            let concrete = TypeRef::new("example.com/absent", "Goer");
            assert!(matches!(
                generate_stubs(&source, &iface, &concrete, &GenerateOptions::default()),
                Err(StubError::Load(_))
            ));
        }
    }

    mod writing {
        use super::*;

        fn implementation(file: &Path, content: &str) -> Implementation {
            Implementation {
                file: file.to_string_lossy().into_owned(),
                file_content: content.to_string(),
                methods: String::new(),
                added_imports: Vec::new(),
                all_imports: Vec::new(),
            }
        }

        #[test]
        fn replaces_unchanged_files() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("goer.go");
            fs::write(&path, "package goer\n").unwrap();
            let loaded = ContentHash::compute(b"package goer\n");
            write_back(&implementation(&path, "package goer\n\n// new\n"), &loaded).unwrap();
            assert_eq!(fs::read_to_string(&path).unwrap(), "package goer\n\n// new\n");
        }

        #[test]
        fn refuses_files_changed_since_load() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("goer.go");
            fs::write(&path, "package goer\n\n// edited\n").unwrap();
            let loaded = ContentHash::compute(b"package goer\n");
            match write_back(&implementation(&path, "package goer\n"), &loaded) {
                Err(StubError::Apply { message, file }) => {
                    assert!(message.contains("changed"));
                    assert_eq!(file.as_deref(), Some(path.to_string_lossy().as_ref()));
                }
                other => panic!("unexpected: {:?}", other),
            }
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "package goer\n\n// edited\n"
            );
        }

        #[test]
        fn missing_destination_is_an_apply_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("gone.go");
            let loaded = ContentHash::compute(b"");
            assert!(matches!(
                write_back(&implementation(&path, "package goer\n"), &loaded),
                Err(StubError::Apply { .. })
            ));
        }

        #[cfg(unix)]
        #[test]
        fn keeps_permissions() {
            use std::os::unix::fs::PermissionsExt;

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("goer.go");
            fs::write(&path, "package goer\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
            let loaded = ContentHash::compute(b"package goer\n");
            write_back(&implementation(&path, "package goer\n\n"), &loaded).unwrap();
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o640);
        }
    }
}
