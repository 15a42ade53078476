//! Go declaration scanner using tree-sitter.
//!
//! Extracts:
//! - The package name
//! - Function declarations (including methods with receivers) and their parameters
//! - Import specs (single and grouped)
//! - Type specs with their underlying type expression
//! - The file span used to recover the exact source text

use std::fs;
use std::path::{Path, PathBuf};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    parameter_list, AnalysisError, Declaration, FunctionDecl, Import, SourceUnit, Span,
    TypeExpr, TypeSpecDecl,
};

/// Tree-sitter query for package declaration.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Holds a parsed tree-sitter tree and the bytes it was parsed from.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: PathBuf,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Go source scanner.
pub struct GoScanner {
    language: Language,
}

impl GoScanner {
    /// Create a new Go scanner.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> Result<Parser, AnalysisError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Read and scan a file from disk.
    pub fn scan_file(&self, path: &Path) -> Result<SourceUnit, AnalysisError> {
        let source = fs::read(path).map_err(|source| AnalysisError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.scan_source(path, &source)
    }

    /// Scan in-memory source attributed to `path`.
    pub fn scan_source(&self, path: &Path, source: &[u8]) -> Result<SourceUnit, AnalysisError> {
        let parsed = self.parse(path, source)?;
        self.extract(&parsed)
    }

    /// Parse source into a tree.
    ///
    /// Any syntax error is fatal: a tree with ERROR or MISSING nodes is
    /// rejected with the location of the first one.
    pub fn parse(&self, path: &Path, source: &[u8]) -> Result<ParsedFile, AnalysisError> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| AnalysisError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: "parser produced no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let bad = first_error(root);
            let pos = bad.start_position();
            let message = if bad.is_missing() {
                format!("syntax error: missing {}", bad.kind())
            } else {
                let snippet: String = bad
                    .utf8_text(source)
                    .unwrap_or("")
                    .chars()
                    .take(40)
                    .collect();
                format!("syntax error near {:?}", snippet.trim())
            };
            return Err(AnalysisError::Parse {
                path: path.to_path_buf(),
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            });
        }

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
            path: path.to_path_buf(),
        })
    }

    /// Extract the source unit from a parsed file.
    pub fn extract(&self, parsed: &ParsedFile) -> Result<SourceUnit, AnalysisError> {
        let (package, clause) =
            self.extract_package(parsed)
                .ok_or_else(|| AnalysisError::Parse {
                    path: parsed.path.clone(),
                    line: 1,
                    column: 1,
                    message: "missing package clause".to_string(),
                })?;

        let root = parsed.tree.root_node();
        let mut cursor = root.walk();
        let last = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .last()
            .unwrap_or(clause);

        Ok(SourceUnit {
            path: parsed.path.clone(),
            package,
            declarations: self.extract_declarations(parsed),
            span: Span::between(clause, last),
        })
    }

    /// Extract the package name and its clause node.
    fn extract_package<'t>(&self, parsed: &'t ParsedFile) -> Option<(String, Node<'t>)> {
        let query = Query::new(&self.language, PACKAGE_QUERY).ok()?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    let clause = capture.node.parent()?;
                    return Some((parsed.node_text(capture.node).to_string(), clause));
                }
            }
        }
        None
    }

    /// Extract top-level declarations in source order.
    fn extract_declarations(&self, parsed: &ParsedFile) -> Vec<Declaration> {
        let root = parsed.tree.root_node();
        let mut cursor = root.walk();
        let mut declarations = Vec::new();

        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "function_declaration" => {
                    if let Some(func) = self.extract_function(parsed, node, None) {
                        declarations.push(Declaration::Function(func));
                    }
                }
                "method_declaration" => {
                    let receiver = node
                        .child_by_field_name("receiver")
                        .and_then(|list| self.receiver_type(parsed, list));
                    if let Some(func) = self.extract_function(parsed, node, receiver) {
                        declarations.push(Declaration::Function(func));
                    }
                }
                "import_declaration" => self.extract_imports(parsed, node, &mut declarations),
                "type_declaration" => self.extract_type_specs(parsed, node, &mut declarations),
                _ => {}
            }
        }

        declarations
    }

    fn extract_function(
        &self,
        parsed: &ParsedFile,
        node: Node,
        receiver: Option<String>,
    ) -> Option<FunctionDecl> {
        let name = parsed.node_text(node.child_by_field_name("name")?).to_string();
        let params = node
            .child_by_field_name("parameters")
            .map(|list| parameter_list(list, &parsed.source))
            .unwrap_or_default();

        Some(FunctionDecl {
            name,
            receiver,
            params,
            span: Span::from_node(node),
        })
    }

    /// Receiver type name, without pointer or type parameters.
    fn receiver_type(&self, parsed: &ParsedFile, list: Node) -> Option<String> {
        let params = parameter_list(list, &parsed.source);
        params
            .first()
            .and_then(|p| p.ty.base_name())
            .map(str::to_string)
    }

    fn extract_imports(&self, parsed: &ParsedFile, node: Node, out: &mut Vec<Declaration>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => out.extend(self.import_spec(parsed, child)),
                "import_spec_list" => {
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if spec.kind() == "import_spec" {
                            out.extend(self.import_spec(parsed, spec));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn import_spec(&self, parsed: &ParsedFile, spec: Node) -> Option<Declaration> {
        let raw = parsed.node_text(spec.child_by_field_name("path")?);
        let path = raw.trim_matches(|c| c == '"' || c == '`').to_string();
        let alias = spec
            .child_by_field_name("name")
            .map(|n| parsed.node_text(n).to_string());

        Some(Declaration::Import(Import {
            path,
            alias,
            span: Span::from_node(spec),
        }))
    }

    fn extract_type_specs(&self, parsed: &ParsedFile, node: Node, out: &mut Vec<Declaration>) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            let is_alias = match spec.kind() {
                "type_spec" => false,
                "alias_type" | "type_alias" => true,
                _ => continue,
            };
            let (Some(name), Some(ty)) = (
                spec.child_by_field_name("name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };

            out.push(Declaration::Type(TypeSpecDecl {
                name: parsed.node_text(name).to_string(),
                ty: TypeExpr::from_node(ty, &parsed.source),
                is_alias,
                span: Span::from_node(spec),
            }));
        }
    }
}

impl Default for GoScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first ERROR or MISSING node under `node`.
fn first_error<'t>(node: Node<'t>) -> Node<'t> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_error() || child.is_missing() {
            return child;
        }
        if child.has_error() {
            return first_error(child);
        }
    }
    node
}

/// Recover the exact source text of a unit.
///
/// Re-reads the file and slices the unit's byte span, so comments and
/// formatting come back verbatim.
pub fn source_text(unit: &SourceUnit) -> Result<String, AnalysisError> {
    let bytes = fs::read(&unit.path).map_err(|source| AnalysisError::Read {
        path: unit.path.clone(),
        source,
    })?;
    let slice = bytes
        .get(unit.span.start_byte..unit.span.end_byte)
        .ok_or_else(|| AnalysisError::SourceChanged {
            path: unit.path.clone(),
        })?;
    Ok(String::from_utf8_lossy(slice).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> SourceUnit {
        GoScanner::new()
            .scan_source(Path::new("test.go"), source.as_bytes())
            .unwrap()
    }

    #[test]
    fn test_extract_package() {
        let unit = scan("package main\n");
        assert_eq!(unit.package, "main");
        assert!(unit.declarations.is_empty());
    }

    #[test]
    fn test_extract_functions() {
        let source = r#"
package main

func main() {
    println("hello")
}

func helper(x int, names ...string) int {
    return x + 1
}
"#;
        let unit = scan(source);
        let names: Vec<_> = unit.functions().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main", "helper"]);

        let helper = unit.find_function("helper").unwrap();
        assert_eq!(helper.params.len(), 2);
        assert_eq!(helper.params[0].names, vec!["x".to_string()]);
        assert_eq!(helper.params[0].ty, TypeExpr::Named("int".to_string()));
        assert_eq!(helper.params[1].ty.to_string(), "...string");
    }

    #[test]
    fn test_extract_methods() {
        let source = r#"
package main

type Config struct {
    Name string
}

func (c *Config) Validate(u user.User) error {
    return nil
}

func (c Config) String() string {
    return c.Name
}
"#;
        let unit = scan(source);
        let validate = unit.find_function("Validate").unwrap();
        assert_eq!(validate.receiver, Some("Config".to_string()));
        assert_eq!(
            validate.params[0].ty.as_qualified(),
            Some(("user", "User"))
        );

        let string_method = unit.find_function("String").unwrap();
        assert_eq!(string_method.receiver, Some("Config".to_string()));
        assert!(string_method.params.is_empty());
    }

    #[test]
    fn test_extract_imports() {
        let source = r#"
package main

import "strings"

import (
    "fmt"
    log "github.com/sirupsen/logrus"
    _ "embed"
    . "math"
)
"#;
        let unit = scan(source);
        let imports: Vec<_> = unit.imports().collect();

        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].path, "strings");
        assert!(imports[1].alias.is_none());
        assert_eq!(imports[2].path, "github.com/sirupsen/logrus");
        assert_eq!(imports[2].alias, Some("log".to_string()));
        assert_eq!(imports[3].alias, Some("_".to_string()));
        assert_eq!(imports[4].alias, Some(".".to_string()));
    }

    #[test]
    fn test_extract_type_specs() {
        let source = r#"
package main

type Handler struct {
    name string
}

type (
    Service interface {
        Run() error
    }
    ID = string
)
"#;
        let unit = scan(source);
        let specs: Vec<_> = unit.type_specs().collect();

        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, "Handler");
        assert!(specs[0].is_struct());
        assert_eq!(specs[1].name, "Service");
        assert!(!specs[1].is_struct());
        assert_eq!(specs[2].name, "ID");
        assert!(specs[2].is_alias);
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = GoScanner::new()
            .scan_source(Path::new("broken.go"), b"package main\n\nfunc broken( {\n")
            .unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().starts_with("broken.go:"));
    }

    #[test]
    fn test_missing_package_is_fatal() {
        let err = GoScanner::new()
            .scan_source(Path::new("nopkg.go"), b"func main() {}\n")
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_span_excludes_leading_and_trailing_comments() {
        let source = "// Copyright header\n\npackage main\n\nfunc A() {}\n\n// trailing\n";
        let unit = scan(source);
        let text = &source[unit.span.start_byte..unit.span.end_byte];
        assert_eq!(text, "package main\n\nfunc A() {}");
    }

    #[test]
    fn test_source_text_is_byte_exact() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("a.go");
        let source = "package a\n\n// Sum adds.\nfunc Sum(a, b int) int {\n\treturn a + b // done\n}\n";
        fs::write(&path, source).unwrap();

        let unit = GoScanner::new().scan_file(&path).unwrap();
        let text = source_text(&unit).unwrap();
        assert_eq!(text.as_bytes(), &source.as_bytes()[unit.span.start_byte..unit.span.end_byte]);
        assert!(text.contains("// done"));
        assert!(text.starts_with("package a"));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = GoScanner::new()
            .scan_file(Path::new("/nonexistent/dir/a.go"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Read { .. }));
    }
}
