//! Typed Go type expressions.
//!
//! Types are lifted from the tree-sitter tree into a small recursive enum and
//! rendered back through `Display`. The rendering follows the Go toolchain's
//! own expression printer (`go/types.ExprString`): no spaces inside brackets,
//! `; ` between struct fields, and a single space before a result type. The
//! output is valid Go when pasted back into source.

use std::fmt;

use tree_sitter::Node;

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// A named-or-unnamed field: a parameter, result, or struct field.
///
/// `a, b int` is one `FieldDecl` with two names; an embedded struct field or
/// an unnamed parameter has no names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub names: Vec<String>,
    pub ty: TypeExpr,
}

/// Parameter and result lists of a function type or method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<FieldDecl>,
    pub results: Vec<FieldDecl>,
}

/// An element of an interface body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    /// `Name(params) results`
    Method { name: String, signature: Signature },
    /// Embedded interface or type-set term (`io.Reader`, `~int | ~string`).
    Type(TypeExpr),
}

/// A Go type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `User`, `string`
    Named(String),
    /// `pkg.User`
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// `[N]T`; `len` is the literal length text (`...` for implicit length).
    Array { len: String, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(Signature),
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceElem>),
    /// `List[int]`
    Generic { base: Box<TypeExpr>, args: Vec<TypeExpr> },
    /// Variadic parameter type `...T`.
    Ellipsis(Box<TypeExpr>),
    Paren(Box<TypeExpr>),
    /// `~T`
    Negated(Box<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// Anything the tree did not describe; raw text with whitespace collapsed.
    Other(String),
}

impl TypeExpr {
    /// Lift a tree-sitter type node into a `TypeExpr`.
    pub fn from_node(node: Node, source: &[u8]) -> Self {
        match node.kind() {
            "type_identifier" | "identifier" | "package_identifier" => {
                TypeExpr::Named(text(node, source).to_string())
            }
            "qualified_type" => {
                let package = node.child_by_field_name("package");
                let name = node.child_by_field_name("name");
                match (package, name) {
                    (Some(p), Some(n)) => TypeExpr::Qualified {
                        package: text(p, source).to_string(),
                        name: text(n, source).to_string(),
                    },
                    _ => TypeExpr::Other(collapse(text(node, source))),
                }
            }
            "pointer_type" => TypeExpr::Pointer(Box::new(first_named(node, source))),
            "slice_type" => TypeExpr::Slice(Box::new(field(node, "element", source))),
            "array_type" => TypeExpr::Array {
                len: node
                    .child_by_field_name("length")
                    .map(|n| collapse(text(n, source)))
                    .unwrap_or_default(),
                elem: Box::new(field(node, "element", source)),
            },
            "implicit_length_array_type" => TypeExpr::Array {
                len: "...".to_string(),
                elem: Box::new(field(node, "element", source)),
            },
            "map_type" => TypeExpr::Map {
                key: Box::new(field(node, "key", source)),
                value: Box::new(field(node, "value", source)),
            },
            "channel_type" => TypeExpr::Chan {
                dir: chan_dir(node),
                elem: Box::new(field(node, "value", source)),
            },
            "function_type" => TypeExpr::Func(Signature::from_node(node, source)),
            "struct_type" => TypeExpr::Struct(struct_fields(node, source)),
            "interface_type" => TypeExpr::Interface(interface_elems(node, source)),
            "generic_type" => {
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| {
                        named_children(list)
                            .map(|n| TypeExpr::from_node(n, source))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeExpr::Generic {
                    base: Box::new(field(node, "type", source)),
                    args,
                }
            }
            "parenthesized_type" => TypeExpr::Paren(Box::new(first_named(node, source))),
            "negated_type" => TypeExpr::Negated(Box::new(first_named(node, source))),
            "type_elem" | "constraint_elem" => {
                let mut terms: Vec<TypeExpr> = named_children(node)
                    .map(|n| TypeExpr::from_node(n, source))
                    .collect();
                if terms.len() == 1 {
                    terms.remove(0)
                } else {
                    TypeExpr::Union(terms)
                }
            }
            _ => TypeExpr::Other(collapse(text(node, source))),
        }
    }

    /// The bare type name of a `Named` type.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// `(package, name)` of a `Qualified` type.
    pub fn as_qualified(&self) -> Option<(&str, &str)> {
        match self {
            TypeExpr::Qualified { package, name } => Some((package.as_str(), name.as_str())),
            _ => None,
        }
    }

    /// Innermost named type, looking through pointers and generic instantiation.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) | TypeExpr::Qualified { name, .. } => Some(name.as_str()),
            TypeExpr::Pointer(inner) | TypeExpr::Paren(inner) => inner.base_name(),
            TypeExpr::Generic { base, .. } => base.base_name(),
            _ => None,
        }
    }
}

impl Signature {
    /// Build from any node carrying `parameters` and optional `result` fields
    /// (function types, method elements, declarations).
    pub fn from_node(node: Node, source: &[u8]) -> Self {
        let params = node
            .child_by_field_name("parameters")
            .map(|list| parameter_list(list, source))
            .unwrap_or_default();

        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => parameter_list(result, source),
            Some(result) => vec![FieldDecl {
                names: Vec::new(),
                ty: TypeExpr::from_node(result, source),
            }],
            None => Vec::new(),
        };

        Self { params, results }
    }
}

/// Parse a `parameter_list` node into field declarations.
pub fn parameter_list(list: Node, source: &[u8]) -> Vec<FieldDecl> {
    let mut fields = Vec::new();
    for param in named_children(list) {
        match param.kind() {
            "parameter_declaration" => fields.push(FieldDecl {
                names: field_names(param, source),
                ty: field(param, "type", source),
            }),
            "variadic_parameter_declaration" => fields.push(FieldDecl {
                names: field_names(param, source),
                ty: TypeExpr::Ellipsis(Box::new(field(param, "type", source))),
            }),
            _ => {}
        }
    }
    fields
}

fn struct_fields(node: Node, source: &[u8]) -> Vec<FieldDecl> {
    let Some(list) = named_children(node).find(|n| n.kind() == "field_declaration_list") else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for decl in named_children(list).filter(|n| n.kind() == "field_declaration") {
        let names = field_names(decl, source);
        let mut ty = field(decl, "type", source);
        // Embedded `*T` keeps the star as an anonymous token before the type.
        if names.is_empty() && decl.child(0).is_some_and(|c| c.kind() == "*") {
            ty = TypeExpr::Pointer(Box::new(ty));
        }
        fields.push(FieldDecl { names, ty });
    }
    fields
}

fn interface_elems(node: Node, source: &[u8]) -> Vec<InterfaceElem> {
    named_children(node)
        .filter_map(|elem| match elem.kind() {
            "method_elem" | "method_spec" => Some(InterfaceElem::Method {
                name: elem
                    .child_by_field_name("name")
                    .map(|n| text(n, source).to_string())
                    .unwrap_or_default(),
                signature: Signature::from_node(elem, source),
            }),
            _ => Some(InterfaceElem::Type(TypeExpr::from_node(elem, source))),
        })
        .collect()
}

fn chan_dir(node: Node) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node.children(&mut cursor).map(|c| c.kind()).collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        _ if tokens.contains(&"<-") => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn field(node: Node, name: &str, source: &[u8]) -> TypeExpr {
    node.child_by_field_name(name)
        .map(|n| TypeExpr::from_node(n, source))
        .unwrap_or_else(|| TypeExpr::Other(String::new()))
}

fn first_named(node: Node, source: &[u8]) -> TypeExpr {
    named_children(node)
        .next()
        .map(|n| TypeExpr::from_node(n, source))
        .unwrap_or_else(|| TypeExpr::Other(String::new()))
}

fn field_names(node: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .map(|n| text(n, source).to_string())
        .collect()
}

/// Named children without comments.
fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count())
        .filter_map(move |i| node.named_child(i))
        .filter(|n| n.kind() != "comment")
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[FieldDecl], sep: &str) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if !field.names.is_empty() {
            write!(f, "{} ", field.names.join(", "))?;
        }
        write!(f, "{}", field.ty)?;
    }
    Ok(())
}

fn write_joined(f: &mut fmt::Formatter<'_>, types: &[TypeExpr], sep: &str) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_fields(f, &self.params, ", ")?;
        f.write_str(")")?;

        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.names.is_empty() => write!(f, " {}", single.ty),
            results => {
                f.write_str(" (")?;
                write_fields(f, results, ", ")?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Qualified { package, name } => write!(f, "{}.{}", package, name),
            TypeExpr::Pointer(inner) => write!(f, "*{}", inner),
            TypeExpr::Slice(elem) => write!(f, "[]{}", elem),
            TypeExpr::Array { len, elem } => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map { key, value } => write!(f, "map[{}]{}", key, value),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", elem),
                ChanDir::Send => write!(f, "chan<- {}", elem),
                ChanDir::Recv => write!(f, "<-chan {}", elem),
            },
            TypeExpr::Func(sig) => write!(f, "func{}", sig),
            TypeExpr::Struct(fields) => {
                f.write_str("struct{")?;
                write_fields(f, fields, "; ")?;
                f.write_str("}")
            }
            TypeExpr::Interface(elems) => {
                f.write_str("interface{")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    match elem {
                        InterfaceElem::Method { name, signature } => {
                            write!(f, "{}{}", name, signature)?
                        }
                        InterfaceElem::Type(ty) => write!(f, "{}", ty)?,
                    }
                }
                f.write_str("}")
            }
            TypeExpr::Generic { base, args } => {
                write!(f, "{}[", base)?;
                write_joined(f, args, ", ")?;
                f.write_str("]")
            }
            TypeExpr::Ellipsis(elem) => write!(f, "...{}", elem),
            TypeExpr::Paren(inner) => write!(f, "({})", inner),
            TypeExpr::Negated(inner) => write!(f, "~{}", inner),
            TypeExpr::Union(terms) => write_joined(f, terms, " | "),
            TypeExpr::Other(raw) => f.write_str(raw),
        }
    }
}
