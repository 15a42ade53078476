//! Cache of resolved struct definitions.
//!
//! One cache lives for a whole run and is owned by the `Analyzer`; the
//! resolver borrows it mutably, so there is a single writer at any time.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::StructDefinition;

/// Key under which a struct definition is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// A struct found by walking an imported package, keyed by bare name.
    Imported(String),
    /// A struct declared in the package being analyzed. Packages are told
    /// apart by directory, since many share a name (`main`).
    Local {
        dir: PathBuf,
        package: String,
        name: String,
    },
}

impl CacheKey {
    pub fn imported(name: &str) -> Self {
        CacheKey::Imported(name.to_string())
    }

    pub fn local(dir: &Path, package: &str, name: &str) -> Self {
        CacheKey::Local {
            dir: dir.to_path_buf(),
            package: package.to_string(),
            name: name.to_string(),
        }
    }
}

/// Struct definitions resolved so far in this run.
///
/// Entries are never replaced: the first definition inserted for a key is
/// the one every later lookup sees, origin included.
#[derive(Debug, Default)]
pub struct StructCache {
    entries: HashMap<CacheKey, StructDefinition>,
    /// Package directories whose sibling files have been indexed.
    indexed_dirs: HashSet<PathBuf>,
    hits: usize,
    misses: usize,
}

impl StructCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at an entry without touching the hit/miss counters.
    pub fn get(&self, key: &CacheKey) -> Option<&StructDefinition> {
        self.entries.get(key)
    }

    /// Look up an entry, counting the hit or miss.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<StructDefinition> {
        match self.entries.get(key) {
            Some(def) => {
                self.hits += 1;
                Some(def.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert a definition unless the key is already present.
    ///
    /// Returns the definition now stored under `key`, which is the earlier
    /// one when the key was taken.
    pub fn insert(&mut self, key: CacheKey, def: StructDefinition) -> &StructDefinition {
        self.entries.entry(key).or_insert(def)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark a package directory as indexed. Returns false if it already was.
    pub fn mark_indexed(&mut self, dir: &Path) -> bool {
        self.indexed_dirs.insert(dir.to_path_buf())
    }

    /// Cache statistics as `(hits, misses)`.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
