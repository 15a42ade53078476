//! Errors raised while scanning and resolving Go sources.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the analysis of a file.
///
/// Resolution misses are not errors; they simply produce fewer structs.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}:{line}:{column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{} changed on disk after it was parsed", .path.display())]
    SourceChanged { path: PathBuf },
    #[error("failed to load Go grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("failed to walk package directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl AnalysisError {
    /// Whether this is a syntax error in a Go source file.
    pub fn is_parse(&self) -> bool {
        matches!(self, AnalysisError::Parse { .. })
    }
}
