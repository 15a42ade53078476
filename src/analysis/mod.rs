//! AST-backed Go source analysis.
//!
//! This module turns one Go file into a `SourceUnit`: the package name, the
//! file span, and the top-level functions, imports and type specs. Type
//! expressions are lifted into the typed `TypeExpr` tree so they can be
//! rendered back as canonical Go text.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌─────────────┐
//! │ *.go file   │────▶│ GoScanner  │────▶│ SourceUnit  │
//! └─────────────┘     └────────────┘     └─────────────┘
//!                                               │
//!                          ┌────────────────────┼──────────────────┐
//!                          ▼                    ▼                  ▼
//!                   ┌─────────────┐   ┌──────────────────┐  ┌─────────────┐
//!                   │ ImportIndex │   │ find_struct_     │  │ source_text │
//!                   │             │   │ fields           │  │ (raw bytes) │
//!                   └─────────────┘   └──────────────────┘  └─────────────┘
//! ```

mod error;
mod facts;
mod fields;
mod go;
mod imports;
mod types;

pub use error::AnalysisError;
pub use facts::{Declaration, FunctionDecl, Import, SourceUnit, Span, TypeSpecDecl};
pub use fields::{find_struct_fields, struct_fields, struct_specs, StructField};
pub use go::{source_text, GoScanner, ParsedFile};
pub use imports::{default_alias, ImportIndex};
pub use types::{parameter_list, ChanDir, FieldDecl, InterfaceElem, Signature, TypeExpr};
