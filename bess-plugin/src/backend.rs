use std::path::PathBuf;

use lsp_types::{Diagnostic, DocumentHighlight, Location, Position};

use crate::document::SourceDocument;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend error: {}", self.message)
    }
}

impl std::error::Error for BackendError {}

#[derive(Clone, Debug, Default)]
pub struct InitializeContext {
    pub root_path: PathBuf,
    /// Raw settings object from the client, `{"plugins": {...}}`.
    pub settings: serde_json::Value,
}

/// Operations the host language server exposes to plugins.
///
/// Implementations read document text through
/// [`SourceDocument::source`](crate::SourceDocument::source) in analysis mode,
/// and report positions in the coordinates of that text.
pub trait LanguageBackend {
    /// Default settings contributed by this backend.
    fn settings(&self) -> serde_json::Value;

    fn initialize(&mut self, ctx: &InitializeContext) -> Result<(), BackendError>;

    /// Directories searched for imports of `document`.
    fn source_roots(&self, document: &SourceDocument) -> Vec<PathBuf>;

    fn lint(&self, document: &SourceDocument) -> Result<Vec<Diagnostic>, BackendError>;

    fn definitions(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<Location>, BackendError>;

    fn references(
        &self,
        document: &SourceDocument,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>, BackendError>;

    fn document_highlight(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<DocumentHighlight>, BackendError>;
}
