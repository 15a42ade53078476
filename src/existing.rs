//! Index of test functions that already exist.
//!
//! Built by walking `*_test.go` files and collecting `Test*` functions, so
//! the selector can ask before generating a test that may already exist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::analysis::{AnalysisError, GoScanner};
use crate::resolve::{is_go_source, is_skipped_dir, is_test_file};

/// Mapping from existing test function name to the file defining it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingTests {
    tests: BTreeMap<String, PathBuf>,
}

impl ExistingTests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `root` for `*_test.go` files and index their `Test*` functions.
    ///
    /// `root` may also be a single Go file, in which case its directory is
    /// walked. Hidden, `_`-prefixed, vendor and testdata directories are
    /// not entered.
    pub fn index(root: &Path, scanner: &GoScanner) -> Result<Self, AnalysisError> {
        let root = if root.is_file() {
            root.parent().unwrap_or(root)
        } else {
            root
        };

        let mut index = Self::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped_dir(e));

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_go_source(path) || !is_test_file(path) {
                continue;
            }
            for name in test_function_names(path, scanner)? {
                index.insert(name, path);
            }
        }
        tracing::debug!("indexed {} existing tests under {}", index.len(), root.display());
        Ok(index)
    }

    pub fn insert<P: AsRef<Path>>(&mut self, name: impl Into<String>, path: P) {
        self.tests.insert(name.into(), path.as_ref().to_path_buf());
    }

    /// First existing test (in name order) whose name contains `function`.
    pub fn find_overlap(&self, function: &str) -> Option<(&str, &Path)> {
        self.tests
            .iter()
            .find(|(name, _)| name.contains(function))
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl<S: Into<String>, P: Into<PathBuf>> FromIterator<(S, P)> for ExistingTests {
    fn from_iter<I: IntoIterator<Item = (S, P)>>(iter: I) -> Self {
        Self {
            tests: iter
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }
}

/// Names of all functions in `path` that start with `Test`.
pub fn test_function_names(path: &Path, scanner: &GoScanner) -> Result<Vec<String>, AnalysisError> {
    let unit = scanner.scan_file(path)?;
    Ok(unit
        .functions()
        .filter(|f| f.receiver.is_none() && f.name.starts_with("Test"))
        .map(|f| f.name.clone())
        .collect())
}
