//! Dolphin - unit-test prompt builder for Go.
//!
//! Dolphin reads a Go source file, decides which functions need a test,
//! and collects the context a model needs to write one: the file's source
//! text and the definitions of the structs those functions take, resolved
//! across package boundaries.
//!
//! # Architecture
//!
//! - `analysis`: tree-sitter based Go scanning (declarations, imports, types)
//! - `resolve`: struct resolution, the run-wide struct cache, package location
//! - `select`: which functions qualify, with a confirmation port
//! - `existing`: index of `Test*` functions already present
//! - `context`: the `Analyzer` pipeline producing an `AnalysisResult`
//! - `prompt`: rendering the natural-language prompt
//! - `generate`: streaming generation through Ollama
//! - `config`: YAML configuration

pub mod analysis;
pub mod cli;
pub mod config;
pub mod context;
pub mod existing;
pub mod generate;
pub mod prompt;
pub mod resolve;
pub mod select;

pub use analysis::{AnalysisError, GoScanner, ImportIndex, SourceUnit, StructField, TypeExpr};
pub use config::Config;
pub use context::{AnalysisResult, Analyzer, Mock};
pub use existing::ExistingTests;
pub use generate::{GenerateError, Generator, OllamaGenerator};
pub use resolve::{
    CacheKey, LocatorChain, PackageLocator, StructCache, StructDefinition, StructResolver,
    TypeRef, WorkspaceLocator,
};
pub use select::{Confirm, Decision, FixedConfirm, SelectionConfig, Selector, TerminalConfirm};
