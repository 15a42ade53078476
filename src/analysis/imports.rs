//! Per-file import alias index.

use std::collections::BTreeMap;

use super::{Import, SourceUnit};

/// Mapping from import alias to import path, scoped to one file.
///
/// The alias is the explicit name when one is given, otherwise the last
/// segment of the import path. Dot and blank imports cannot be named by a
/// selector and are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportIndex {
    aliases: BTreeMap<String, String>,
}

impl ImportIndex {
    /// Build the index for a source unit.
    pub fn build(unit: &SourceUnit) -> Self {
        Self::from_imports(unit.imports())
    }

    /// Build the index from import specs. Later specs win on alias collision.
    pub fn from_imports<'a>(imports: impl IntoIterator<Item = &'a Import>) -> Self {
        let mut aliases = BTreeMap::new();
        for import in imports {
            let alias = match import.alias.as_deref() {
                Some("." | "_") => continue,
                Some(alias) => alias,
                None => default_alias(&import.path),
            };
            aliases.insert(alias.to_string(), import.path.clone());
        }
        Self { aliases }
    }

    /// Look up the import path for an alias.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Iterate `(alias, path)` pairs in alias order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, p)| (a.as_str(), p.as_str()))
    }
}

/// Alias implied by an import path: its last segment.
pub fn default_alias(path: &str) -> &str {
    let path = path.trim_matches('"');
    path.rsplit('/').next().unwrap_or(path)
}
