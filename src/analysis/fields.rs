//! Struct field extraction.

use serde::{Deserialize, Serialize};

use super::{SourceUnit, TypeExpr, TypeSpecDecl};

/// One named struct field with its type rendered as Go source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Find the fields of the struct named `struct_name` declared in `unit`.
///
/// Returns `None` when no type spec with that name has a struct type. Fields
/// come back in declaration order; `A, B int` yields two entries and embedded
/// fields are skipped since they carry no name.
pub fn find_struct_fields(unit: &SourceUnit, struct_name: &str) -> Option<Vec<StructField>> {
    unit.type_specs()
        .find(|spec| spec.name == struct_name && spec.is_struct())
        .map(struct_fields)
}

/// All struct type specs in `unit`, in declaration order.
pub fn struct_specs(unit: &SourceUnit) -> impl Iterator<Item = &TypeSpecDecl> {
    unit.type_specs().filter(|spec| spec.is_struct())
}

/// Fields of a struct type spec; empty for non-struct specs.
pub fn struct_fields(spec: &TypeSpecDecl) -> Vec<StructField> {
    let TypeExpr::Struct(fields) = &spec.ty else {
        return Vec::new();
    };

    fields
        .iter()
        .flat_map(|field| {
            let ty = field.ty.to_string();
            field.names.iter().map(move |name| StructField {
                name: name.clone(),
                ty: ty.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GoScanner;
    use std::path::Path;

    fn scan(source: &str) -> SourceUnit {
        GoScanner::new()
            .scan_source(Path::new("fields.go"), source.as_bytes())
            .unwrap()
    }

    fn pairs(fields: &[StructField]) -> Vec<(&str, &str)> {
        fields.iter().map(|f| (f.name.as_str(), f.ty.as_str())).collect()
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let unit = scan(
            r#"
package b

type User struct {
	Name    string
	Age     int
	Tags    []string
	Manager *User
	Meta    map[string]interface{}
}
"#,
        );
        let fields = find_struct_fields(&unit, "User").unwrap();
        assert_eq!(
            pairs(&fields),
            vec![
                ("Name", "string"),
                ("Age", "int"),
                ("Tags", "[]string"),
                ("Manager", "*User"),
                ("Meta", "map[string]interface{}"),
            ]
        );
    }

    #[test]
    fn test_multi_name_fields_expand_and_embedded_skip() {
        let unit = scan(
            r#"
package b

type Point struct {
	Base
	X, Y float64
}
"#,
        );
        let fields = find_struct_fields(&unit, "Point").unwrap();
        assert_eq!(pairs(&fields), vec![("X", "float64"), ("Y", "float64")]);
    }

    #[test]
    fn test_non_struct_or_missing_is_none() {
        let unit = scan(
            r#"
package b

type Status int

type Store interface {
	Get(id string) error
}
"#,
        );
        assert!(find_struct_fields(&unit, "Status").is_none());
        assert!(find_struct_fields(&unit, "Store").is_none());
        assert!(find_struct_fields(&unit, "Missing").is_none());
    }

    #[test]
    fn test_empty_struct_has_no_fields() {
        let unit = scan("package b\n\ntype Empty struct{}\n");
        assert_eq!(find_struct_fields(&unit, "Empty"), Some(Vec::new()));
        assert_eq!(struct_specs(&unit).count(), 1);
    }

    #[test]
    fn test_serializes_type_key() {
        let field = StructField {
            name: "Name".to_string(),
            ty: "string".to_string(),
        };
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, r#"{"name":"Name","type":"string"}"#);
    }
}
