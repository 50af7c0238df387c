//! Rewriting type references for a different file.
//!
//! A signature copied from an interface's file into the destination file
//! must name the same types from there. Each reference node goes through an
//! ordered rule chain; the first rule that applies decides the node and the
//! rest are not consulted:
//!
//! 1. **drop self qualifier**: `dest.T` becomes `T` when the destination is
//!    package `dest`.
//! 2. **reconcile or import**: `pkg.T` uses the destination's existing name
//!    for the package, or a new import is added for it.
//! 3. **qualify bare**: `T` declared in another package (the interface's own,
//!    or one dot-imported by the interface's file) becomes `pkg.T`.
//!
//! Nodes no rule claims are descended into, so element, key, value and
//! parameter types are rewritten independently.

use std::collections::BTreeSet;

use tracing::debug;

use goimpl_core::output::ImportInfo;
use goimpl_syntax::{transform_func_type, walk_type_refs, FuncType, Rewrite, SourceFile, TypeExpr};

use crate::error::{StubError, StubResult};
use crate::program::{Program, Scope};
use crate::resolve::{origin_alias, package_name_for, resolve_name, resolve_qualifier, NameResolution};

// ============================================================================
// Import table
// ============================================================================

/// One import of the destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    /// Explicit name: an identifier, `_`, or `.`.
    pub name: Option<String>,
    pub path: String,
    /// Added by the rewriter rather than present in the file.
    pub added: bool,
}

/// How the destination file can refer to a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Through this qualifier.
    Named(String),
    /// Unqualified, through a dot import.
    Dot,
}

/// The imports of the destination file, extended as references need them.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    pub fn from_file(file: &SourceFile) -> Self {
        let entries = file
            .import_specs()
            .map(|spec| ImportEntry {
                name: spec.name.clone(),
                path: spec.path.clone(),
                added: false,
            })
            .collect();
        ImportTable { entries }
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    /// Entries added by the rewriter, in the order they were added.
    pub fn added(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().filter(|e| e.added)
    }

    /// The qualifier an entry binds, if it binds one.
    fn bound_name(program: &Program, entry: &ImportEntry) -> Option<String> {
        match entry.name.as_deref() {
            Some("_") | Some(".") => None,
            Some(name) => Some(name.to_string()),
            None => Some(package_name_for(program, &entry.path)),
        }
    }

    /// How the file refers to `path`. Blank imports do not count.
    pub fn binding(&self, program: &Program, path: &str) -> Option<Binding> {
        let mut dot = false;
        for entry in self.entries.iter().filter(|e| e.path == path) {
            if entry.name.as_deref() == Some(".") {
                dot = true;
            } else if let Some(name) = Self::bound_name(program, entry) {
                return Some(Binding::Named(name));
            }
        }
        dot.then_some(Binding::Dot)
    }

    /// The path `qualifier` is bound to.
    pub fn bound_path(&self, program: &Program, qualifier: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| Self::bound_name(program, e).as_deref() == Some(qualifier))
            .map(|e| e.path.as_str())
    }

    /// Add an import; adding an existing path and name again is a no-op.
    pub fn add(&mut self, name: Option<String>, path: impl Into<String>) {
        let path = path.into();
        if self.entries.iter().any(|e| e.path == path && e.name == name) {
            return;
        }
        self.entries.push(ImportEntry {
            name,
            path,
            added: true,
        });
    }

    /// The entries as output records.
    pub fn to_infos<'e>(entries: impl IntoIterator<Item = &'e ImportEntry>) -> Vec<ImportInfo> {
        entries
            .into_iter()
            .map(|e| ImportInfo::new(e.name.clone().unwrap_or_default(), e.path.clone()))
            .collect()
    }
}

// ============================================================================
// Rewriter
// ============================================================================

type Rule<'a, 'p> = fn(&mut Rewriter<'a, 'p>, Scope<'p>, &TypeExpr) -> StubResult<Option<Rewrite>>;

/// Rewrites signatures written in some file so they resolve from the
/// destination file.
pub struct Rewriter<'a, 'p> {
    program: &'p Program,
    dest: Scope<'p>,
    imports: &'a mut ImportTable,
    /// Package-level names of the destination package; never import aliases.
    reserved: BTreeSet<String>,
}

impl<'a, 'p> Rewriter<'a, 'p> {
    pub fn new(program: &'p Program, dest: Scope<'p>, imports: &'a mut ImportTable) -> Self {
        Rewriter {
            program,
            dest,
            imports,
            reserved: dest.package.declared_names(),
        }
    }

    /// Rewrite every type reference of `sig`, written in `origin`, in place.
    pub fn rewrite_signature(&mut self, origin: Scope<'p>, sig: &mut FuncType) -> StubResult<()> {
        let mut failure = None;
        {
            let mut transformer = |node: &TypeExpr| -> Rewrite {
                if failure.is_some() {
                    return Rewrite::Skip;
                }
                match self.rewrite_node(origin, node) {
                    Ok(rewrite) => rewrite,
                    Err(e) => {
                        failure = Some(e);
                        Rewrite::Skip
                    }
                }
            };
            transform_func_type(&mut transformer, sig);
        }
        if let Some(e) = failure {
            return Err(e);
        }
        self.check_bound(sig)
    }

    /// Run the rule chain on one node.
    pub fn rewrite_node(&mut self, origin: Scope<'p>, node: &TypeExpr) -> StubResult<Rewrite> {
        let rules: [Rule<'a, 'p>; 3] = [
            Self::drop_self_qualifier,
            Self::reconcile_or_import,
            Self::qualify_bare,
        ];
        for rule in rules {
            if let Some(rewrite) = rule(self, origin, node)? {
                return Ok(rewrite);
            }
        }
        Ok(Rewrite::Continue)
    }

    /// Rule 1: `dest.T` becomes `T`.
    fn drop_self_qualifier(&mut self, origin: Scope<'p>, node: &TypeExpr) -> StubResult<Option<Rewrite>> {
        let TypeExpr::Qualified { package, name } = node else {
            return Ok(None);
        };
        let path = qualifier_path(self.program, origin, package)?;
        if path != self.dest.package.path {
            return Ok(None);
        }
        debug!("{}.{}: dropping self qualifier", package, name);
        Ok(Some(Rewrite::Replace(TypeExpr::Name(name.clone()))))
    }

    /// Rule 2: `pkg.T` takes the destination's qualifier for the package.
    fn reconcile_or_import(&mut self, origin: Scope<'p>, node: &TypeExpr) -> StubResult<Option<Rewrite>> {
        let TypeExpr::Qualified { package, name } = node else {
            return Ok(None);
        };
        let path = qualifier_path(self.program, origin, package)?;
        let qualifier = match self.imports.binding(self.program, path) {
            Some(Binding::Named(existing)) => existing,
            Some(Binding::Dot) => return Ok(Some(Rewrite::Replace(TypeExpr::Name(name.clone())))),
            None => {
                let (preferred, explicit) = match origin_alias(origin.file, path) {
                    Some(alias) => (alias.to_string(), true),
                    None => (package_name_for(self.program, path), false),
                };
                self.add_import(path, &preferred, explicit)
            }
        };
        if qualifier == *package {
            return Ok(Some(Rewrite::Skip));
        }
        debug!("{}.{}: qualifier becomes {}", package, name, qualifier);
        Ok(Some(Rewrite::Replace(TypeExpr::qualified(qualifier, name.clone()))))
    }

    /// Rule 3: `T` from another package becomes `pkg.T`.
    fn qualify_bare(&mut self, origin: Scope<'p>, node: &TypeExpr) -> StubResult<Option<Rewrite>> {
        let TypeExpr::Name(name) = node else {
            return Ok(None);
        };
        let NameResolution::Declared(decl) = resolve_name(self.program, origin, name) else {
            return Ok(None);
        };
        let path = decl.package.path.as_str();
        if path == self.dest.package.path {
            return Ok(None);
        }
        let qualifier = match self.imports.binding(self.program, path) {
            Some(Binding::Named(existing)) => existing,
            Some(Binding::Dot) => return Ok(Some(Rewrite::Skip)),
            None => {
                let preferred = package_name_for(self.program, path);
                self.add_import(path, &preferred, false)
            }
        };
        debug!("{}: qualified as {}.{}", name, qualifier, name);
        Ok(Some(Rewrite::Replace(TypeExpr::qualified(qualifier, name.clone()))))
    }

    /// Import `path`, binding `preferred` or the first free `preferredN`.
    /// Returns the qualifier to use.
    fn add_import(&mut self, path: &str, preferred: &str, explicit: bool) -> String {
        let mut alias = preferred.to_string();
        let mut n = 2;
        while self.name_taken(&alias) {
            alias = format!("{}{}", preferred, n);
            n += 1;
        }
        let name = if explicit || alias != package_name_for(self.program, path) {
            Some(alias.clone())
        } else {
            None
        };
        debug!("adding import {:?} {}", name, path);
        self.imports.add(name, path);
        alias
    }

    fn name_taken(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.imports.bound_path(self.program, name).is_some()
    }

    /// Every qualifier left in `sig` must be bound by the import table.
    fn check_bound(&self, sig: &FuncType) -> StubResult<()> {
        let mut unbound = None;
        walk_type_refs(sig, |node| {
            if let TypeExpr::Qualified { package, .. } = node {
                if unbound.is_none() && self.imports.bound_path(self.program, package).is_none() {
                    unbound = Some(package.clone());
                }
            }
        });
        match unbound {
            Some(qualifier) => Err(StubError::Internal(format!(
                "rewritten signature uses unbound qualifier {}",
                qualifier
            ))),
            None => Ok(()),
        }
    }
}

fn qualifier_path<'p>(program: &Program, origin: Scope<'p>, qualifier: &str) -> StubResult<&'p str> {
    resolve_qualifier(program, origin.file, qualifier).ok_or_else(|| StubError::UnresolvedQualifier {
        qualifier: qualifier.to_string(),
        file: origin.file.path.clone(),
    })
}
