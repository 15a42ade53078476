//! Context assembly.
//!
//! `Analyzer` ties the pieces together for one run: it scans a file, builds
//! its import index, asks the selector which functions qualify, resolves
//! the struct types those functions take, and packages the result.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::analysis::{source_text, AnalysisError, GoScanner, ImportIndex};
use crate::resolve::{
    is_go_source, is_skipped_dir, is_test_file, PackageLocator, StructCache, StructDefinition,
    StructResolver,
};
use crate::select::{candidates, Selector};

/// Mocking convention recorded verbatim from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Mock {
    pub name: String,
    pub dir: String,
}

/// Everything the prompt needs about one analyzed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub file: PathBuf,
    /// Functions that qualified, in declaration order.
    pub functions: Vec<String>,
    pub source_code: String,
    pub structs: Vec<StructDefinition>,
    pub mock: Option<Mock>,
}

impl AnalysisResult {
    /// True when no function qualified, so there is nothing to generate.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Runs the analysis pipeline with one cache and one selector for the run.
pub struct Analyzer {
    scanner: GoScanner,
    cache: StructCache,
    locator: Box<dyn PackageLocator>,
    selector: Selector,
    mock: Mock,
}

impl Analyzer {
    pub fn new(locator: Box<dyn PackageLocator>, selector: Selector, mock: Mock) -> Self {
        Self {
            scanner: GoScanner::new(),
            cache: StructCache::new(),
            locator,
            selector,
            mock,
        }
    }

    pub fn scanner(&self) -> &GoScanner {
        &self.scanner
    }

    pub fn cache(&self) -> &StructCache {
        &self.cache
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Analyze a single Go source file.
    pub fn analyze_file(&mut self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let unit = self.scanner.scan_file(path)?;
        let imports = ImportIndex::build(&unit);
        tracing::debug!(
            "scanned {}: package {}, {} declarations, {} imports",
            path.display(),
            unit.package,
            unit.declarations.len(),
            imports.len()
        );

        let mut result = AnalysisResult {
            file: path.to_path_buf(),
            ..Default::default()
        };

        let mut resolver =
            StructResolver::new(&mut self.cache, self.locator.as_ref(), &self.scanner);
        resolver.register_local(&unit);

        for func in unit.functions() {
            if !self.selector.qualifies(func) {
                continue;
            }
            result.functions.push(func.qualified_name());
            result.mock = Some(self.mock.clone());

            for reference in candidates(func) {
                match resolver.resolve(&reference, &unit, &imports)? {
                    Some(def) => result.structs.push(def),
                    None => tracing::trace!("{}: {} is not a known struct", func.name, reference),
                }
            }
        }

        if unit.has_functions() {
            result.source_code = source_text(&unit)?;
        }

        Ok(result)
    }

    /// Analyze every non-test Go file under `root`, in lexical order.
    pub fn analyze_dir(&mut self, root: &Path) -> Result<Vec<AnalysisResult>, AnalysisError> {
        collect_sources(root)?
            .iter()
            .map(|path| self.analyze_file(path))
            .collect()
    }

    /// Analyze a file or a directory.
    pub fn analyze_path(&mut self, path: &Path) -> Result<Vec<AnalysisResult>, AnalysisError> {
        if path.is_dir() {
            self.analyze_dir(path)
        } else {
            Ok(vec![self.analyze_file(path)?])
        }
    }
}

/// Non-test `.go` files under `root`, sorted, skipping hidden, `_`-prefixed,
/// vendor and testdata directories.
pub fn collect_sources(root: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && is_go_source(path) && !is_test_file(path) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::existing::ExistingTests;
    use crate::resolve::{LocatorChain, WorkspaceLocator, SAME_PACKAGE};
    use crate::select::{Decision, FixedConfirm, SelectionConfig};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn mock() -> Mock {
        Mock {
            name: "mockery".into(),
            dir: "mocks".into(),
        }
    }

    fn analyzer(root: &Path, selector: Selector) -> Analyzer {
        Analyzer::new(Box::new(WorkspaceLocator::new(root)), selector, mock())
    }

    #[test]
    fn test_end_to_end_imported_struct() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/a.go",
            "package a\n\nimport \"other/b\"\n\nfunc F(x b.User) {}\n",
        );
        write(
            temp.path(),
            "other/b/user.go",
            "package b\n\ntype User struct {\n\tName string\n\tAge  int\n}\n",
        );

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let result = analyzer.analyze_file(&file).unwrap();

        assert_eq!(
            result.source_code,
            "package a\n\nimport \"other/b\"\n\nfunc F(x b.User) {}"
        );
        assert_eq!(result.functions, vec!["F".to_string()]);
        assert_eq!(result.structs.len(), 1);
        let user = &result.structs[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.origin, "other/b");
        let fields: Vec<(&str, &str)> = user
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.ty.as_str()))
            .collect();
        assert_eq!(fields, vec![("Name", "string"), ("Age", "int")]);
        assert_eq!(result.mock, Some(mock()));
    }

    #[test]
    fn test_same_package_struct() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/a.go",
            "package a\n\ntype Order struct {\n\tID    int\n\tItems []string\n}\n\nfunc Place(o Order, n int) error { return nil }\n",
        );

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let result = analyzer.analyze_file(&file).unwrap();

        assert_eq!(result.structs.len(), 1);
        assert_eq!(result.structs[0].origin, SAME_PACKAGE);
        assert_eq!(result.structs[0].fields[1].ty, "[]string");
    }

    #[test]
    fn test_no_functions_gives_empty_source() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/types.go",
            "package a\n\ntype User struct {\n\tName string\n}\n",
        );

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let result = analyzer.analyze_file(&file).unwrap();

        assert!(result.source_code.is_empty());
        assert!(result.structs.is_empty());
        assert!(result.mock.is_none());
        assert!(result.is_empty());
    }

    #[test]
    fn test_function_filter_limits_structs() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/a.go",
            "package a\n\ntype In struct{ A int }\n\ntype Out struct{ B string }\n\nfunc F(x In) {}\n\nfunc G(y Out) {}\n",
        );

        let selector = Selector::new(
            SelectionConfig {
                function_name: Some("G".into()),
                existing_tests: None,
            },
            Box::new(FixedConfirm(Decision::Proceed)),
        );
        let mut analyzer = analyzer(temp.path(), selector);
        let result = analyzer.analyze_file(&file).unwrap();

        assert_eq!(result.functions, vec!["G".to_string()]);
        let names: Vec<&str> = result.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Out"]);
        // The source is the whole file regardless of the filter.
        assert!(result.source_code.contains("func F(x In) {}"));
    }

    #[test]
    fn test_skip_all_spans_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pkg/a/a.go", "package a\n\nfunc Alpha() {}\n\nfunc Beta() {}\n");
        write(temp.path(), "pkg/a/b.go", "package a\n\nfunc Gamma() {}\n");

        let existing: ExistingTests = [
            ("TestAlpha", "pkg/a/a_test.go"),
            ("TestGamma", "pkg/a/b_test.go"),
        ]
        .into_iter()
        .collect();
        let selector = Selector::new(
            SelectionConfig {
                function_name: None,
                existing_tests: Some(existing),
            },
            Box::new(FixedConfirm(Decision::SkipAll)),
        );
        let mut analyzer = analyzer(temp.path(), selector);
        let results = analyzer.analyze_dir(&temp.path().join("pkg")).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].functions, vec!["Beta".to_string()]);
        assert!(results[1].functions.is_empty());
        assert!(analyzer.selector().skip_all_latched());
    }

    #[test]
    fn test_repeated_analysis_hits_cache() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/a.go",
            "package a\n\nimport \"other/b\"\n\nfunc F(x b.User) {}\n\nfunc G(y b.User) {}\n",
        );
        write(temp.path(), "other/b/user.go", "package b\n\ntype User struct{ Name string }\n");

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let first = analyzer.analyze_file(&file).unwrap();
        let second = analyzer.analyze_file(&file).unwrap();

        assert_eq!(first, second);
        // Duplicates across functions are kept.
        assert_eq!(first.structs.len(), 2);
        assert_eq!(analyzer.cache().len(), 1);
        assert_eq!(analyzer.cache().stats(), (3, 1));
    }

    #[test]
    fn test_same_package_name_in_two_dirs() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "cmd/a/main.go",
            "package main\n\ntype Config struct {\n\tA int\n}\n\nfunc run(c Config) {}\n",
        );
        write(
            temp.path(),
            "cmd/b/main.go",
            "package main\n\ntype Config struct {\n\tB string\n}\n\nfunc run(c Config) {}\n",
        );

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let results = analyzer.analyze_dir(&temp.path().join("cmd")).unwrap();

        let fields: Vec<Vec<(&str, &str)>> = results
            .iter()
            .map(|r| {
                r.structs[0]
                    .fields
                    .iter()
                    .map(|f| (f.name.as_str(), f.ty.as_str()))
                    .collect()
            })
            .collect();
        assert_eq!(fields, vec![vec![("A", "int")], vec![("B", "string")]]);
    }

    #[test]
    fn test_missing_package_dir_through_chain_fails() {
        let temp = TempDir::new().unwrap();
        let file = write(
            temp.path(),
            "pkg/a/a.go",
            "package a\n\nimport \"other/b\"\n\nfunc F(x b.User) {}\n",
        );

        let chain = LocatorChain::new().with(WorkspaceLocator::new(temp.path()));
        let mut analyzer = Analyzer::new(Box::new(chain), Selector::all(), mock());
        let err = analyzer.analyze_file(&file).unwrap_err();

        assert!(matches!(err, AnalysisError::Walk(_)));
        assert!(analyzer.cache().is_empty());
    }

    #[test]
    fn test_collect_sources_skips_tests_and_ignored_dirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.go", "package a\n");
        write(temp.path(), "a.go", "package a\n");
        write(temp.path(), "a_test.go", "package a\n");
        write(temp.path(), "vendor/x/x.go", "package x\n");
        write(temp.path(), "testdata/t.go", "package t\n");
        write(temp.path(), ".git/h.go", "package h\n");
        write(temp.path(), "sub/c.go", "package sub\n");
        write(temp.path(), "README.md", "hi\n");

        let files: Vec<PathBuf> = collect_sources(temp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.go"),
                PathBuf::from("b.go"),
                PathBuf::from("sub/c.go")
            ]
        );
    }

    #[test]
    fn test_parse_error_propagates() {
        let temp = TempDir::new().unwrap();
        let file = write(temp.path(), "bad.go", "package a\n\nfunc (\n");

        let mut analyzer = analyzer(temp.path(), Selector::all());
        let err = analyzer.analyze_file(&file).unwrap_err();
        assert!(err.is_parse());
    }
}
