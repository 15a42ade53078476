//! Mapping import paths to package directories.
//!
//! How an import path becomes a directory depends on the host setup: a GOPATH
//! tree, a module checkout with a `go.mod`, or the Go toolchain's own `src`.
//! Each strategy is a `PackageLocator`; `LocatorChain` combines them.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Maps an import path to the directory holding that package's sources.
pub trait PackageLocator {
    /// Returns the candidate directory, or `None` when this locator cannot
    /// place the import at all.
    fn locate(&self, import_path: &str) -> Option<PathBuf>;
}

impl<T: PackageLocator + ?Sized> PackageLocator for Box<T> {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        (**self).locate(import_path)
    }
}

/// Joins the import path onto a fixed root directory.
#[derive(Debug, Clone)]
pub struct WorkspaceLocator {
    root: PathBuf,
}

impl WorkspaceLocator {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl PackageLocator for WorkspaceLocator {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        Some(self.root.join(import_path))
    }
}

/// Classic GOPATH layout: `$GOPATH/src/<import path>`.
#[derive(Debug, Clone)]
pub struct GopathLocator {
    gopath: PathBuf,
}

impl GopathLocator {
    pub fn new<P: AsRef<Path>>(gopath: P) -> Self {
        Self {
            gopath: gopath.as_ref().to_path_buf(),
        }
    }

    /// Build from `GOPATH`, falling back to `$HOME/go` like the go tool.
    pub fn from_env() -> Option<Self> {
        let gopath = env::var_os("GOPATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join("go")))?;
        // GOPATH may list several roots; the first one is where `go get` writes.
        let first = env::split_paths(&gopath).next()?;
        Some(Self::new(first))
    }
}

impl PackageLocator for GopathLocator {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        Some(self.gopath.join("src").join(import_path))
    }
}

/// Standard library packages under `$GOROOT/src`.
#[derive(Debug, Clone)]
pub struct GorootLocator {
    goroot: PathBuf,
}

impl GorootLocator {
    pub fn new<P: AsRef<Path>>(goroot: P) -> Self {
        Self {
            goroot: goroot.as_ref().to_path_buf(),
        }
    }

    /// Build from `GOROOT`, or ask the go tool when the variable is unset.
    pub fn from_env() -> Option<Self> {
        if let Some(goroot) = env::var_os("GOROOT").filter(|v| !v.is_empty()) {
            return Some(Self::new(goroot));
        }
        let output = Command::new("go").args(["env", "GOROOT"]).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let goroot = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!goroot.is_empty()).then(|| Self::new(goroot))
    }
}

impl PackageLocator for GorootLocator {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        // Standard library paths have no dot in their first element.
        let first = import_path.split('/').next().unwrap_or("");
        if first.contains('.') {
            return None;
        }
        Some(self.goroot.join("src").join(import_path))
    }
}

/// Resolves imports inside the current module from its `go.mod`.
///
/// Imports under the module path map into the module root; `replace`
/// directives pointing at local directories are honored as well.
#[derive(Debug, Clone)]
pub struct GoModLocator {
    /// Directory containing go.mod.
    root: PathBuf,
    /// Module path (e.g., "github.com/acme/app").
    module: String,
    /// Replace directives with local targets: module path → directory.
    local_replaces: HashMap<String, PathBuf>,
}

impl GoModLocator {
    /// Parse `go.mod` in `root`.
    pub fn from_root(root: &Path) -> anyhow::Result<Self> {
        let go_mod = root.join("go.mod");
        let content = fs::read_to_string(&go_mod)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", go_mod.display(), e))?;
        Self::parse(root, &content)
    }

    /// Search `start` and its ancestors for a go.mod.
    pub fn discover(start: &Path) -> Option<Self> {
        let start = if start.is_file() { start.parent()? } else { start };
        start
            .ancestors()
            .find(|dir| dir.join("go.mod").is_file())
            .and_then(|dir| Self::from_root(dir).ok())
    }

    /// Parse go.mod content.
    fn parse(root: &Path, content: &str) -> anyhow::Result<Self> {
        let mut module = String::new();
        let mut local_replaces = HashMap::new();
        let mut in_replace_block = false;

        for line in content.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix("module ") {
                module = rest.trim().trim_matches('"').to_string();
                continue;
            }

            if line == "replace (" {
                in_replace_block = true;
                continue;
            }
            if line == ")" {
                in_replace_block = false;
                continue;
            }

            let directive = if in_replace_block {
                Some(line)
            } else {
                line.strip_prefix("replace ")
            };
            if let Some((from, to)) = directive.and_then(parse_replace) {
                if to.starts_with("./") || to.starts_with("../") || to.starts_with('/') {
                    local_replaces.insert(from, root.join(to));
                }
            }
        }

        if module.is_empty() {
            anyhow::bail!("no module declaration found in go.mod");
        }

        Ok(Self {
            root: root.to_path_buf(),
            module,
            local_replaces,
        })
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PackageLocator for GoModLocator {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        if let Some(dir) = map_prefix(import_path, &self.module, &self.root) {
            return Some(dir);
        }
        self.local_replaces
            .iter()
            .find_map(|(from, dir)| map_prefix(import_path, from, dir))
    }
}

/// Tries each locator in order and returns the first candidate that exists.
///
/// When none exists, the first candidate is returned anyway so the caller's
/// walk reports the missing directory.
#[derive(Default)]
pub struct LocatorChain {
    locators: Vec<Box<dyn PackageLocator>>,
}

impl LocatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<L: PackageLocator + 'static>(mut self, locator: L) -> Self {
        self.locators.push(Box::new(locator));
        self
    }

    pub fn push(&mut self, locator: Box<dyn PackageLocator>) {
        self.locators.push(locator);
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl PackageLocator for LocatorChain {
    fn locate(&self, import_path: &str) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = self
            .locators
            .iter()
            .filter_map(|l| l.locate(import_path))
            .collect();
        match candidates.iter().find(|dir| dir.is_dir()) {
            Some(dir) => Some(dir.clone()),
            None => candidates.into_iter().next(),
        }
    }
}

/// Map `import_path` under `prefix` onto `dir`.
fn map_prefix(import_path: &str, prefix: &str, dir: &Path) -> Option<PathBuf> {
    if import_path == prefix {
        return Some(dir.to_path_buf());
    }
    let rest = import_path.strip_prefix(prefix)?.strip_prefix('/')?;
    Some(dir.join(rest))
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Parse `old [version] => new [version]`.
fn parse_replace(line: &str) -> Option<(String, String)> {
    let (from, to) = line.split_once("=>")?;
    let from = from.split_whitespace().next()?;
    let to = to.split_whitespace().next()?;
    Some((from.to_string(), to.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_workspace_and_gopath_join() {
        let ws = WorkspaceLocator::new("/ws");
        assert_eq!(ws.locate("other/b"), Some(PathBuf::from("/ws/other/b")));

        let gopath = GopathLocator::new("/home/u/go");
        assert_eq!(
            gopath.locate("github.com/acme/app/models"),
            Some(PathBuf::from("/home/u/go/src/github.com/acme/app/models"))
        );
    }

    #[test]
    fn test_goroot_only_places_stdlib() {
        let goroot = GorootLocator::new("/usr/local/go");
        assert_eq!(
            goroot.locate("net/http"),
            Some(PathBuf::from("/usr/local/go/src/net/http"))
        );
        assert_eq!(goroot.locate("github.com/acme/app"), None);
    }

    #[test]
    fn test_go_mod_maps_module_imports() {
        let content = r#"
module github.com/acme/app // main module

go 1.22

require (
	github.com/google/uuid v1.6.0
)

replace github.com/acme/shared => ../shared

replace (
	github.com/acme/lib v1.0.0 => ./third_party/lib
	github.com/acme/remote => github.com/fork/remote v1.2.0
)
"#;
        let locator = GoModLocator::parse(Path::new("/src/app"), content).unwrap();
        assert_eq!(locator.module(), "github.com/acme/app");

        assert_eq!(
            locator.locate("github.com/acme/app/internal/models"),
            Some(PathBuf::from("/src/app/internal/models"))
        );
        assert_eq!(
            locator.locate("github.com/acme/app"),
            Some(PathBuf::from("/src/app"))
        );
        assert_eq!(
            locator.locate("github.com/acme/shared/types"),
            Some(PathBuf::from("/src/app/../shared/types"))
        );
        assert_eq!(
            locator.locate("github.com/acme/lib"),
            Some(PathBuf::from("/src/app/./third_party/lib"))
        );
        assert_eq!(locator.locate("github.com/acme/remote"), None);
        assert_eq!(locator.locate("github.com/acme/application"), None);
        assert_eq!(locator.locate("github.com/google/uuid"), None);
    }

    #[test]
    fn test_go_mod_without_module_fails() {
        assert!(GoModLocator::parse(Path::new("/x"), "go 1.22\n").is_err());
    }

    #[test]
    fn test_discover_walks_up() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "module example.org/m\n").unwrap();
        let nested = temp.path().join("pkg").join("a");
        fs::create_dir_all(&nested).unwrap();

        let locator = GoModLocator::discover(&nested).unwrap();
        assert_eq!(locator.module(), "example.org/m");
        assert_eq!(locator.root(), temp.path());
    }

    #[test]
    fn test_chain_returns_first_existing_dir() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("other").join("b")).unwrap();

        let chain = LocatorChain::new()
            .with(WorkspaceLocator::new(first.path()))
            .with(WorkspaceLocator::new(second.path()));

        assert_eq!(chain.len(), 2);
        assert_eq!(
            chain.locate("other/b"),
            Some(second.path().join("other").join("b"))
        );
        assert_eq!(
            chain.locate("missing/pkg"),
            Some(first.path().join("missing").join("pkg"))
        );
    }

    #[test]
    fn test_chain_without_candidates() {
        let chain = LocatorChain::new().with(GorootLocator::new("/usr/local/go"));
        assert_eq!(chain.locate("github.com/acme/app"), None);
        assert_eq!(LocatorChain::new().locate("net/http"), None);
    }
}
