use std::sync::OnceLock;

use lsp_types::{TextDocumentContentChangeEvent, Url};
use sugar::{ArrowPosition, SourceText, SugarRows, desugar};
use tracing::debug;

use crate::offset::{LineOffset, inject_header, is_dsl_uri};

/// Which text a caller wants from a document.
///
/// Analysis requests see the desugared text; incremental edits must splice
/// into the text the user actually typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceMode {
    Analysis,
    IncrementalEdit,
}

/// Backend view of a DSL document. `sugar_rows` are rows of `text`, so they
/// include the header row shift when one was injected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub offset: LineOffset,
    pub sugar_rows: SugarRows,
    pub arrows: Vec<ArrowPosition>,
}

impl Rewritten {
    pub fn from_source(source: &str) -> Self {
        let (with_header, injected) = inject_header(source);
        let desugared = desugar(&with_header);
        Self {
            text: desugared.text,
            offset: LineOffset::new(injected),
            sugar_rows: desugared.sugar_rows,
            arrows: desugared.arrows,
        }
    }
}

#[derive(Debug)]
pub struct SourceDocument {
    uri: Url,
    text: String,
    version: Option<i32>,
    rewritten: OnceLock<Rewritten>,
}

impl SourceDocument {
    pub fn new(uri: Url, text: impl Into<String>) -> Self {
        Self {
            uri,
            text: text.into(),
            version: None,
            rewritten: OnceLock::new(),
        }
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn is_dsl(&self) -> bool {
        is_dsl_uri(&self.uri)
    }

    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// Desugared view, computed on first use. `None` for host-language files.
    pub fn rewritten(&self) -> Option<&Rewritten> {
        if !self.is_dsl() {
            return None;
        }
        Some(self.rewritten.get_or_init(|| {
            let rewritten = Rewritten::from_source(&self.text);
            debug!(
                uri = %self.uri,
                arrows = rewritten.arrows.len(),
                sugar_rows = rewritten.sugar_rows.len(),
                "rewrote document"
            );
            rewritten
        }))
    }

    pub fn source(&self, mode: SourceMode) -> &str {
        match (mode, self.rewritten()) {
            (SourceMode::Analysis, Some(rewritten)) => &rewritten.text,
            _ => &self.text,
        }
    }

    pub fn offset(&self) -> LineOffset {
        self.rewritten()
            .map(|rewritten| rewritten.offset)
            .unwrap_or_default()
    }

    /// Applies an editor change to the raw text. Positions in `change` are in
    /// user coordinates and character columns.
    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent, version: Option<i32>) {
        let source = self.source(SourceMode::IncrementalEdit);
        let text = match change.range {
            None => change.text,
            Some(range) => {
                let lines = SourceText::new(source);
                let start = byte_offset_or_end(&lines, range.start.line, range.start.character);
                let end = byte_offset_or_end(&lines, range.end.line, range.end.character).max(start);
                let mut text = String::with_capacity(source.len() + change.text.len());
                text.push_str(&source[..start]);
                text.push_str(&change.text);
                text.push_str(&source[end..]);
                text
            }
        };
        self.text = text;
        self.version = version.or(self.version);
        self.rewritten = OnceLock::new();
    }
}

fn byte_offset_or_end(lines: &SourceText<'_>, line: u32, character: u32) -> usize {
    lines
        .byte_offset(line as usize, character as usize)
        .unwrap_or(lines.text().len())
}
