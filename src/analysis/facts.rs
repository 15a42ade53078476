//! Declaration structures extracted from a parsed Go file.

use std::fmt;
use std::path::PathBuf;

use super::{FieldDecl, TypeExpr};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }

    /// Create a span covering `start` through the end of `end`.
    pub fn between(start: tree_sitter::Node, end: tree_sitter::Node) -> Self {
        let first = Self::from_node(start);
        let last = Self::from_node(end);
        Self {
            start_byte: first.start_byte,
            end_byte: last.end_byte,
            start_line: first.start_line,
            start_col: first.start_col,
            end_line: last.end_line,
            end_col: last.end_col,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// The function name.
    pub name: String,
    /// For methods: the receiver type (e.g., "Config" for `func (c *Config) Validate()`).
    pub receiver: Option<String>,
    /// Parameters in declaration order (receiver excluded).
    /// Variadic parameters carry `TypeExpr::Ellipsis`.
    pub params: Vec<FieldDecl>,
    /// Source span for the entire declaration.
    pub span: Span,
}

impl FunctionDecl {
    /// Get the fully qualified name (receiver.name for methods).
    pub fn qualified_name(&self) -> String {
        if let Some(ref recv) = self.receiver {
            format!("{}.{}", recv, self.name)
        } else {
            self.name.clone()
        }
    }

    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }
}

/// An import spec.
#[derive(Debug, Clone)]
pub struct Import {
    /// The import path without quotes.
    pub path: String,
    /// Optional alias (e.g., `import foo "bar"` -> alias is "foo"). Also "." or "_".
    pub alias: Option<String>,
    /// Source span.
    pub span: Span,
}

/// A type spec (`type Name <type>` or `type Name = <type>`).
#[derive(Debug, Clone)]
pub struct TypeSpecDecl {
    pub name: String,
    /// The underlying type expression.
    pub ty: TypeExpr,
    /// Whether this is an alias declaration (`type A = B`).
    pub is_alias: bool,
    pub span: Span,
}

impl TypeSpecDecl {
    /// Whether the underlying type is a struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self.ty, TypeExpr::Struct(_))
    }
}

/// A top-level declaration, in source order.
#[derive(Debug, Clone)]
pub enum Declaration {
    Function(FunctionDecl),
    Import(Import),
    Type(TypeSpecDecl),
}

/// One parsed Go source file.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// File path the unit was parsed from.
    pub path: PathBuf,
    /// Package name as written in the package clause.
    pub package: String,
    /// All functions, imports and type specs in source order.
    pub declarations: Vec<Declaration>,
    /// From the `package` keyword to the end of the last top-level declaration.
    pub span: Span,
}

impl SourceUnit {
    /// All functions and methods in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Function(f) => Some(f),
            _ => None,
        })
    }

    /// All import specs in declaration order.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Import(i) => Some(i),
            _ => None,
        })
    }

    /// All type specs in declaration order.
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpecDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Find a function or method by name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions().find(|f| f.name == name)
    }

    pub fn has_functions(&self) -> bool {
        self.functions().next().is_some()
    }
}
