//! Struct resolution across packages.
//!
//! Given a parameter type such as `b.User` or `User`, the resolver finds the
//! struct's field list:
//!
//! - `alias.Type` with a known import: served from the cache, or found by
//!   walking the imported package's directory (first match in lexical order).
//! - bare `Type`: a struct of the current package, registered from the file
//!   being analyzed or, failing that, from its sibling files.
//!
//! Anything else is a resolution miss and produces nothing.

mod cache;
mod locate;

pub use cache::{CacheKey, StructCache};
pub use locate::{
    GoModLocator, GopathLocator, GorootLocator, LocatorChain, PackageLocator, WorkspaceLocator,
};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use crate::analysis::{
    find_struct_fields, struct_fields, struct_specs, AnalysisError, GoScanner, ImportIndex,
    SourceUnit, StructField, TypeExpr,
};

/// Origin recorded for structs declared in the analyzed package.
pub const SAME_PACKAGE: &str = "same package";

/// Identifiers predeclared by the language; never looked up as structs.
const PREDECLARED: &[&str] = &[
    "any", "bool", "byte", "comparable", "complex64", "complex128", "error", "float32",
    "float64", "int", "int8", "int16", "int32", "int64", "rune", "string", "uint", "uint8",
    "uint16", "uint32", "uint64", "uintptr",
];

/// A resolved struct: its name, where it was found, and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDefinition {
    pub name: String,
    /// `"same package"` or the import path the struct was first found under.
    #[serde(rename = "from")]
    pub origin: String,
    pub fields: Vec<StructField>,
}

/// A parameter type that may name a struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// `alias.Name`
    Imported { alias: String, name: String },
    /// `Name`
    Local { name: String },
}

impl TypeRef {
    /// Only selector expressions and bare identifiers are candidates.
    pub fn from_type(ty: &TypeExpr) -> Option<Self> {
        match ty {
            TypeExpr::Qualified { package, name } => Some(TypeRef::Imported {
                alias: package.clone(),
                name: name.clone(),
            }),
            TypeExpr::Named(name) => Some(TypeRef::Local { name: name.clone() }),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeRef::Imported { name, .. } | TypeRef::Local { name } => name,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Imported { alias, name } => write!(f, "{}.{}", alias, name),
            TypeRef::Local { name } => f.write_str(name),
        }
    }
}

/// Resolves type references against one file's imports and package.
pub struct StructResolver<'a> {
    cache: &'a mut StructCache,
    locator: &'a dyn PackageLocator,
    scanner: &'a GoScanner,
}

impl<'a> StructResolver<'a> {
    pub fn new(
        cache: &'a mut StructCache,
        locator: &'a dyn PackageLocator,
        scanner: &'a GoScanner,
    ) -> Self {
        Self {
            cache,
            locator,
            scanner,
        }
    }

    /// Register every struct declared in `unit` under its package-local key.
    pub fn register_local(&mut self, unit: &SourceUnit) {
        let dir = package_dir(unit);
        for spec in struct_specs(unit) {
            let def = StructDefinition {
                name: spec.name.clone(),
                origin: SAME_PACKAGE.to_string(),
                fields: struct_fields(spec),
            };
            self.cache
                .insert(CacheKey::local(&dir, &unit.package, &spec.name), def);
        }
    }

    /// Resolve one reference found in `unit`.
    ///
    /// `Ok(None)` is a resolution miss. Errors come from walking or parsing
    /// an imported package; nothing is cached for a failed walk.
    pub fn resolve(
        &mut self,
        reference: &TypeRef,
        unit: &SourceUnit,
        imports: &ImportIndex,
    ) -> Result<Option<StructDefinition>, AnalysisError> {
        match reference {
            TypeRef::Imported { alias, name } => self.resolve_imported(alias, name, imports),
            TypeRef::Local { name } => self.resolve_local(name, unit),
        }
    }

    fn resolve_imported(
        &mut self,
        alias: &str,
        name: &str,
        imports: &ImportIndex,
    ) -> Result<Option<StructDefinition>, AnalysisError> {
        let Some(import_path) = imports.resolve(alias) else {
            tracing::trace!("{}.{}: no import named {}", alias, name, alias);
            return Ok(None);
        };

        let key = CacheKey::imported(name);
        if let Some(def) = self.cache.lookup(&key) {
            if def.origin != import_path {
                tracing::debug!(
                    "{} requested from {} but cached from {}",
                    name,
                    import_path,
                    def.origin
                );
            }
            return Ok(Some(def));
        }

        let Some(dir) = self.locator.locate(import_path) else {
            tracing::debug!("no package directory for import {}", import_path);
            return Ok(None);
        };

        tracing::debug!("walking {} for struct {}", dir.display(), name);
        match self.walk_for_struct(&dir, name)? {
            Some(fields) => {
                let def = StructDefinition {
                    name: name.to_string(),
                    origin: import_path.to_string(),
                    fields,
                };
                Ok(Some(self.cache.insert(key, def).clone()))
            }
            None => {
                tracing::trace!("struct {} not found under {}", name, dir.display());
                Ok(None)
            }
        }
    }

    fn resolve_local(
        &mut self,
        name: &str,
        unit: &SourceUnit,
    ) -> Result<Option<StructDefinition>, AnalysisError> {
        if PREDECLARED.contains(&name) {
            return Ok(None);
        }

        let dir = package_dir(unit);
        let key = CacheKey::local(&dir, &unit.package, name);
        if let Some(def) = self.cache.lookup(&key) {
            return Ok(Some(def));
        }

        if self.cache.mark_indexed(&dir) {
            self.index_siblings(&dir, unit)?;
            return Ok(self.cache.lookup(&key));
        }
        Ok(None)
    }

    /// Register structs from the other non-test files of the unit's package.
    ///
    /// Only `dir` itself is read; subdirectories are other packages. Sibling
    /// files that fail to parse are skipped with a warning.
    fn index_siblings(&mut self, dir: &Path, unit: &SourceUnit) -> Result<(), AnalysisError> {
        let entries = fs::read_dir(dir).map_err(|source| AnalysisError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_go_source(p) && !is_test_file(p))
            .filter(|p| !same_file(p, &unit.path))
            .collect();
        paths.sort();

        for path in paths {
            match self.scanner.scan_file(&path) {
                Ok(sibling) if sibling.package == unit.package => self.register_local(&sibling),
                Ok(_) => {}
                Err(e) => tracing::warn!("skipping sibling {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    /// Walk `dir` recursively in lexical order; the first struct named `name` wins.
    fn walk_for_struct(
        &self,
        dir: &Path,
        name: &str,
    ) -> Result<Option<Vec<StructField>>, AnalysisError> {
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_go_source(entry.path()) {
                continue;
            }
            let unit = self.scanner.scan_file(entry.path())?;
            if let Some(fields) = find_struct_fields(&unit, name) {
                tracing::debug!("found {} in {}", name, entry.path().display());
                return Ok(Some(fields));
            }
        }
        Ok(None)
    }
}

/// Directories the go tool ignores: hidden, `_`-prefixed, vendor and testdata.
pub(crate) fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || name == "vendor" || name == "testdata"
}

pub(crate) fn is_go_source(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("go")
}

pub(crate) fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

/// Directory of the unit's package, canonical when it can be resolved.
fn package_dir(unit: &SourceUnit) -> PathBuf {
    let dir = match unit.path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
