#![allow(dead_code, unused_imports)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::{Compression, write::GzEncoder};
use lsp_types::{
    Diagnostic, DocumentHighlight, Location, MessageType, Position, Range, Url,
};
pub use plugin::{
    BackendError, HEADER_LINE, InitializeContext, LanguageBackend, LazySchema, Notifier,
    SCHEMA_DATA, SCHEMA_DOCUMENT, SourceDocument, SourceMode, SugaredBackend,
};

/// Backend double that records what it was asked and answers from canned data.
#[derive(Default)]
pub struct FakeBackend {
    pub fail: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub locations: Vec<Location>,
    pub highlights: Vec<DocumentHighlight>,
    pub seen_positions: Mutex<Vec<Position>>,
    pub seen_sources: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn record(&self, document: &SourceDocument, position: Option<Position>) {
        self.seen_sources
            .lock()
            .expect("sources lock should not be poisoned")
            .push(document.source(SourceMode::Analysis).to_string());
        if let Some(position) = position {
            self.seen_positions
                .lock()
                .expect("positions lock should not be poisoned")
                .push(position);
        }
    }

    fn answer<T: Clone>(&self, items: &[T]) -> Result<Vec<T>, BackendError> {
        if self.fail {
            Err(BackendError::new("backend crashed"))
        } else {
            Ok(items.to_vec())
        }
    }

    pub fn positions(&self) -> Vec<Position> {
        self.seen_positions
            .lock()
            .expect("positions lock should not be poisoned")
            .clone()
    }

    pub fn sources(&self) -> Vec<String> {
        self.seen_sources
            .lock()
            .expect("sources lock should not be poisoned")
            .clone()
    }
}

impl LanguageBackend for FakeBackend {
    fn settings(&self) -> serde_json::Value {
        serde_json::json!({"plugins": {"pyflakes": {"enabled": true}}})
    }

    fn initialize(&mut self, _ctx: &InitializeContext) -> Result<(), BackendError> {
        Ok(())
    }

    fn source_roots(&self, _document: &SourceDocument) -> Vec<PathBuf> {
        vec![PathBuf::from("/workspace")]
    }

    fn lint(&self, document: &SourceDocument) -> Result<Vec<Diagnostic>, BackendError> {
        self.record(document, None);
        self.answer(&self.diagnostics)
    }

    fn definitions(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<Location>, BackendError> {
        self.record(document, Some(position));
        self.answer(&self.locations)
    }

    fn references(
        &self,
        document: &SourceDocument,
        position: Position,
        _include_declaration: bool,
    ) -> Result<Vec<Location>, BackendError> {
        self.record(document, Some(position));
        self.answer(&self.locations)
    }

    fn document_highlight(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<DocumentHighlight>, BackendError> {
        self.record(document, Some(position));
        self.answer(&self.highlights)
    }
}

/// Collects notices instead of showing them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(MessageType, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(MessageType, String)> {
        self.messages
            .lock()
            .expect("messages lock should not be poisoned")
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_message(&self, kind: MessageType, message: String) {
        self.messages
            .lock()
            .expect("messages lock should not be poisoned")
            .push((kind, message));
    }
}

pub fn file_uri(path: &Path) -> Url {
    Url::from_file_path(path).expect("absolute path should convert to uri")
}

pub fn open_document(name: &str, text: &str) -> SourceDocument {
    let uri = Url::parse(&format!("file:///work/{name}")).expect("test uri should parse");
    SourceDocument::new(uri, text)
}

pub fn range_on(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

pub fn write_schema(dir: &Path, json: &serde_json::Value) {
    let file = std::fs::File::create(dir.join(SCHEMA_DATA)).expect("schema file should be created");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(json.to_string().as_bytes())
        .expect("schema should be written");
    encoder.finish().expect("gzip stream should finish");
}

/// Wraps `inner` with a schema loaded from `schema_dir` and initializes it
/// against `source_dir`.
pub fn sugared(
    inner: FakeBackend,
    schema_dir: &Path,
    source_dir: &Path,
    bess_settings: serde_json::Value,
) -> (SugaredBackend<FakeBackend>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut backend = SugaredBackend::new(
        inner,
        Arc::new(LazySchema::new(schema_dir)),
        notifier.clone(),
    )
    .with_notice_delay(Duration::ZERO);

    let mut section = bess_settings;
    if let Some(map) = section.as_object_mut() {
        map.insert(
            "source_directory".to_string(),
            serde_json::Value::String(source_dir.display().to_string()),
        );
    }
    backend
        .initialize(&InitializeContext {
            root_path: source_dir.to_path_buf(),
            settings: serde_json::json!({"plugins": {"bess": section}}),
        })
        .expect("initialize should succeed");
    (backend, notifier)
}
