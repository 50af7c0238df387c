//! The program model: parsed packages and their symbol tables.
//!
//! A [`Program`] is loaded once per invocation from a [`PackageSource`] and
//! is immutable afterwards. Every engine step borrows it; the handles it
//! gives out ([`DeclRef`], [`Scope`]) are `Copy` references into it.
//!
//! Loading is eager: the root packages and the transitive closure of their
//! imports are read and parsed up front. A dependency that cannot be found is
//! remembered as missing so the engine can report it precisely later.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, warn};

use goimpl_core::patch::ContentHash;
use goimpl_core::types::TypeRef;
use goimpl_syntax::{parse_file, FuncDecl, SourceFile, SyntaxError, TypeSpec};

use crate::error::LoadError;
use crate::source::{PackageSource, SourceUnit};

/// Import paths that never name loadable packages.
const PSEUDO_PACKAGES: &[&str] = &["C", "unsafe"];

// ============================================================================
// Files and packages
// ============================================================================

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    /// Display path; a filesystem path for files read from disk.
    pub path: String,
    pub text: String,
    pub ast: SourceFile,
    /// Hash of `text` as loaded, checked again before write-back.
    pub hash: ContentHash,
}

impl GoFile {
    pub fn parse(unit: SourceUnit) -> Result<GoFile, SyntaxError> {
        let ast = parse_file(&unit.text)?;
        let hash = ContentHash::compute(unit.text.as_bytes());
        Ok(GoFile {
            path: unit.path,
            text: unit.text,
            ast,
            hash,
        })
    }
}

/// One loaded package.
#[derive(Debug, Clone)]
pub struct Package {
    /// Import path.
    pub path: String,
    /// Name from the package clause.
    pub name: String,
    pub files: Vec<GoFile>,
    /// Type name to (file index, position among the file's type specs).
    types: BTreeMap<String, (usize, usize)>,
    /// Names of package-level functions.
    funcs: BTreeSet<String>,
}

impl Package {
    fn new(path: String, name: String, files: Vec<GoFile>) -> Package {
        let mut types = BTreeMap::new();
        let mut funcs = BTreeSet::new();
        for (file_idx, file) in files.iter().enumerate() {
            for (spec_idx, spec) in file.ast.type_specs().enumerate() {
                types.entry(spec.name.clone()).or_insert((file_idx, spec_idx));
            }
            for func in file.ast.funcs().filter(|f| f.recv.is_none()) {
                funcs.insert(func.name.clone());
            }
        }
        Package {
            path,
            name,
            files,
            types,
            funcs,
        }
    }

    /// The type declared as `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<DeclRef<'_>> {
        let &(file_idx, spec_idx) = self.types.get(name)?;
        let file = self.files.get(file_idx)?;
        let spec = file.ast.type_specs().nth(spec_idx)?;
        Some(DeclRef {
            package: self,
            file,
            spec,
        })
    }

    /// Every type declaration, in file then source order.
    pub fn type_decls(&self) -> impl Iterator<Item = DeclRef<'_>> {
        self.files.iter().flat_map(move |file| {
            file.ast.type_specs().map(move |spec| DeclRef {
                package: self,
                file,
                spec,
            })
        })
    }

    /// Methods declared with receiver `type_name` or `*type_name`.
    pub fn methods_of<'p>(
        &'p self,
        type_name: &'p str,
    ) -> impl Iterator<Item = (&'p GoFile, &'p FuncDecl)> + 'p {
        self.files.iter().flat_map(move |file| {
            file.ast
                .funcs()
                .filter(move |f| f.recv.as_ref().is_some_and(|r| r.base == type_name))
                .map(move |f| (file, f))
        })
    }

    /// Whether `name` is a package-level type or function.
    pub fn declares(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.funcs.contains(name)
    }

    /// Package-level type and function names.
    pub fn declared_names(&self) -> BTreeSet<String> {
        self.types.keys().chain(self.funcs.iter()).cloned().collect()
    }
}

// ============================================================================
// Handles
// ============================================================================

/// A file within its package; the context identifiers resolve in.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'p> {
    pub package: &'p Package,
    pub file: &'p GoFile,
}

/// A named type declaration.
#[derive(Debug, Clone, Copy)]
pub struct DeclRef<'p> {
    pub package: &'p Package,
    pub file: &'p GoFile,
    pub spec: &'p TypeSpec,
}

impl<'p> DeclRef<'p> {
    pub fn scope(&self) -> Scope<'p> {
        Scope {
            package: self.package,
            file: self.file,
        }
    }

    pub fn name(&self) -> &'p str {
        &self.spec.name
    }

    /// `importpath.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package.path, self.spec.name)
    }
}

// ============================================================================
// Program
// ============================================================================

/// Every package reachable from the roots of one invocation.
#[derive(Debug, Default)]
pub struct Program {
    packages: BTreeMap<String, Package>,
    missing: BTreeSet<String>,
}

impl Program {
    /// Load `roots` and the transitive closure of their imports.
    ///
    /// A root that cannot be found, or whose files do not parse, fails the
    /// load. Dependencies are best effort.
    pub fn load(source: &dyn PackageSource, roots: &[&str]) -> Result<Program, LoadError> {
        let mut program = Program::default();
        let mut queue: VecDeque<(String, bool)> =
            roots.iter().map(|r| (r.to_string(), true)).collect();

        while let Some((path, is_root)) = queue.pop_front() {
            if program.packages.contains_key(&path)
                || program.missing.contains(&path)
                || PSEUDO_PACKAGES.contains(&path.as_str())
            {
                continue;
            }

            let package = source
                .read_package(&path)
                .map(|units| load_package(&path, units, is_root))
                .transpose()?
                .flatten();

            let Some(package) = package else {
                if is_root {
                    return Err(LoadError::PackageNotFound { path });
                }
                warn!("dependency {} not found", path);
                program.missing.insert(path);
                continue;
            };

            for file in &package.files {
                for spec in file.ast.import_specs() {
                    queue.push_back((spec.path.clone(), false));
                }
            }
            debug!(
                "loaded {} ({} files) as package {}",
                path,
                package.files.len(),
                package.name
            );
            program.packages.insert(path, package);
        }

        Ok(program)
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// Loaded packages in import path order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Whether `path` was imported but could not be located.
    pub fn is_missing(&self, path: &str) -> bool {
        self.missing.contains(path)
    }

    /// The declaration `r` names.
    pub fn lookup(&self, r: &TypeRef) -> Option<DeclRef<'_>> {
        self.package(&r.package)?.lookup(&r.name)
    }
}

/// Parse a package's files. Returns `Ok(None)` when no file survives.
fn load_package(
    path: &str,
    units: Vec<SourceUnit>,
    is_root: bool,
) -> Result<Option<Package>, LoadError> {
    let mut files: Vec<GoFile> = Vec::with_capacity(units.len());
    for unit in units {
        let file_path = unit.path.clone();
        match GoFile::parse(unit) {
            Ok(file) => files.push(file),
            Err(error) if is_root => {
                return Err(LoadError::Syntax {
                    file: file_path,
                    error,
                })
            }
            Err(error) => warn!("skipping {}: {}", file_path, error),
        }
    }

    let Some(name) = files.first().map(|f| f.ast.package.clone()) else {
        return Ok(None);
    };
    files.retain(|f| {
        let keep = f.ast.package == name;
        if !keep {
            debug!(
                "skipping {}: package {} is not {}",
                f.path, f.ast.package, name
            );
        }
        keep
    });

    Ok(Some(Package::new(path.to_string(), name, files)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_file(
                "example.com/app",
                "app.go",
                "package app\n\nimport (\n\t\"C\"\n\t\"example.com/lib\"\n\t\"example.com/gone\"\n)\n\ntype App struct{ lib.Base }\n\nfunc (a *App) Run() {}\n\nfunc New() *App { return nil }\n",
            )
            .with_file(
                "example.com/app",
                "doc.go",
                "// Package app is an app.\npackage app\n\ntype App int\n\ntype Other interface{}\n",
            )
            .with_file(
                "example.com/lib",
                "lib.go",
                "package lib\n\nimport \"unsafe\"\n\ntype Base struct{}\n\nfunc (Base) Hello() {}\n",
            )
            .with_file("example.com/lib", "broken.go", "package lib\n\nfunc (\n")
    }

    mod loading {
        use super::*;

        #[test]
        fn loads_the_import_closure() {
            let program = Program::load(&source(), &["example.com/app"]).unwrap();
            let paths: Vec<&str> = program.packages().map(|p| p.path.as_str()).collect();
            assert_eq!(paths, ["example.com/app", "example.com/lib"]);
            assert!(program.is_missing("example.com/gone"));
            assert!(!program.is_missing("C"));
            assert!(!program.is_missing("unsafe"));
        }

        #[test]
        fn dependency_parse_errors_skip_the_file() {
            let program = Program::load(&source(), &["example.com/app"]).unwrap();
            let lib = program.package("example.com/lib").unwrap();
            assert_eq!(lib.files.len(), 1);
            assert!(lib.lookup("Base").is_some());
        }

        #[test]
        fn root_parse_errors_fail() {
            let err = Program::load(&source(), &["example.com/lib"]).unwrap_err();
            match err {
                LoadError::Syntax { file, error } => {
                    assert_eq!(file, "example.com/lib/broken.go");
                    assert!(error.line >= 3);
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }

        #[test]
        fn missing_root_is_not_found() {
            let err = Program::load(&source(), &["example.com/nope"]).unwrap_err();
            assert!(matches!(err, LoadError::PackageNotFound { path } if path == "example.com/nope"));
        }

        #[test]
        fn files_of_another_package_are_skipped() {
            let source = MemorySource::new()
                .with_file("example.com/p", "a.go", "package p\n\ntype A int\n")
                .with_file("example.com/p", "b.go", "package p_test\n\ntype B int\n");
            let program = Program::load(&source, &["example.com/p"]).unwrap();
            let p = program.package("example.com/p").unwrap();
            assert_eq!(p.files.len(), 1);
            assert!(p.lookup("B").is_none());
        }
    }

    mod symbols {
        use super::*;

        #[test]
        fn first_declaration_wins() {
            let program = Program::load(&source(), &["example.com/app"]).unwrap();
            let decl = program
                .lookup(&TypeRef::new("example.com/app", "App"))
                .unwrap();
            // app.go sorts before doc.go
            assert_eq!(decl.file.path, "example.com/app/app.go");
            assert_eq!(decl.qualified_name(), "example.com/app.App");
        }

        #[test]
        fn methods_and_funcs() {
            let program = Program::load(&source(), &["example.com/app"]).unwrap();
            let app = program.package("example.com/app").unwrap();
            let methods: Vec<&str> = app.methods_of("App").map(|(_, f)| f.name.as_str()).collect();
            assert_eq!(methods, ["Run"]);
            assert!(app.declares("New"));
            assert!(app.declares("Other"));
            assert!(!app.declares("Run"));
        }

        #[test]
        fn type_decls_in_file_order() {
            let program = Program::load(&source(), &["example.com/app"]).unwrap();
            let app = program.package("example.com/app").unwrap();
            let names: Vec<&str> = app.type_decls().map(|d| d.name()).collect();
            assert_eq!(names, ["App", "App", "Other"]);
        }
    }
}
