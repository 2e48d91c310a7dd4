//! Wraps a host backend so that DSL documents can be analysed as host code.
//!
//! The wrapper owns all position bookkeeping: positions going in are moved to
//! backend coordinates once, results coming out are moved back once.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lsp_types::{Diagnostic, DocumentHighlight, Location, MessageType, Position};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::backend::{BackendError, InitializeContext, LanguageBackend};
use crate::config::{GotoKind, PLUGIN_NAME, PluginSettings};
use crate::diagnostics::LintFilter;
use crate::document::SourceDocument;
use crate::enrich::{EnrichContext, enrich};
use crate::logging::category_backend;
use crate::notice::{NOTICE_DELAY, Notifier, schedule_notice, version_notice};
use crate::offset::LineOffset;
use crate::schema::{LazySchema, Schema};

pub struct SugaredBackend<B> {
    inner: B,
    schema: Arc<LazySchema>,
    settings: PluginSettings,
    source_dir: PathBuf,
    lint_filter: LintFilter,
    notifier: Arc<dyn Notifier>,
    notice_delay: Duration,
}

impl<B: LanguageBackend> SugaredBackend<B> {
    pub fn new(inner: B, schema: Arc<LazySchema>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner,
            schema,
            settings: PluginSettings::default(),
            source_dir: PathBuf::new(),
            lint_filter: LintFilter::new(),
            notifier,
            notice_delay: NOTICE_DELAY,
        }
    }

    pub fn with_notice_delay(mut self, delay: Duration) -> Self {
        self.notice_delay = delay;
        self
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn plugin_settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn notify(&self, kind: MessageType, message: String) {
        schedule_notice(self.notice_delay, Arc::clone(&self.notifier), kind, message);
    }

    fn swallow<T>(
        &self,
        operation: &str,
        document: &SourceDocument,
        result: Result<Vec<T>, BackendError>,
    ) -> Vec<T> {
        result.unwrap_or_else(|err| {
            warn!(
                "{} {operation} failed for {}: {err}",
                category_backend(),
                document.uri()
            );
            Vec::new()
        })
    }

    fn goto(
        &self,
        kind: GotoKind,
        document: &SourceDocument,
        locations: Vec<Location>,
    ) -> Vec<Location> {
        let locations: Vec<Location> = locations
            .into_iter()
            .filter_map(|location| {
                let offset = if location.uri == *document.uri() {
                    document.offset()
                } else {
                    LineOffset::for_target(&location.uri)
                };
                offset.location_from_backend(location)
            })
            .collect();

        let schema_uri = self.schema.document_uri();
        if schema_uri.is_none() {
            debug!(
                "{} schema directory {} is not absolute; no schema hits",
                category_backend(),
                self.schema.dir().display()
            );
        }
        let empty = Schema::default();
        let ctx = EnrichContext {
            schema: self.schema.get().unwrap_or(&empty),
            schema_uri: schema_uri.as_ref(),
            schema_dir: self.schema.dir(),
            source_dir: &self.source_dir,
        };
        enrich(&ctx, locations, self.settings.categories(kind))
    }
}

impl<B: LanguageBackend> LanguageBackend for SugaredBackend<B> {
    fn settings(&self) -> Value {
        with_plugin_section(self.inner.settings())
    }

    fn initialize(&mut self, ctx: &InitializeContext) -> Result<(), BackendError> {
        self.settings = PluginSettings::from_host_settings(&ctx.settings).unwrap_or_else(|err| {
            warn!("{} {err}", category_backend());
            self.notify(MessageType::ERROR, err.to_string());
            PluginSettings::default()
        });
        self.source_dir = self.settings.source_dir().unwrap_or_else(|err| {
            warn!("{} {err}", category_backend());
            self.notify(MessageType::ERROR, err.to_string());
            ctx.root_path.clone()
        });
        debug!(
            "{} source directory: {}",
            category_backend(),
            self.source_dir.display()
        );

        let schema_version = self.schema.get().map(Schema::version);
        if let Some(message) = version_notice(&self.source_dir, schema_version) {
            self.notify(MessageType::ERROR, message);
        }

        self.inner.initialize(ctx)
    }

    fn source_roots(&self, document: &SourceDocument) -> Vec<PathBuf> {
        let mut roots = vec![self.source_dir.clone()];
        roots.extend(self.inner.source_roots(document));
        roots
    }

    fn lint(&self, document: &SourceDocument) -> Result<Vec<Diagnostic>, BackendError> {
        let Some(rewritten) = document.rewritten() else {
            return self.inner.lint(document);
        };
        let diagnostics = self.swallow("lint", document, self.inner.lint(document));
        Ok(self.lint_filter.apply(diagnostics, rewritten))
    }

    fn definitions(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<Location>, BackendError> {
        let position = document.offset().to_backend(position);
        let found = self.swallow(
            "definitions",
            document,
            self.inner.definitions(document, position),
        );
        Ok(self.goto(GotoKind::Definitions, document, found))
    }

    fn references(
        &self,
        document: &SourceDocument,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>, BackendError> {
        let position = document.offset().to_backend(position);
        let found = self.swallow(
            "references",
            document,
            self.inner.references(document, position, include_declaration),
        );
        Ok(self.goto(GotoKind::References, document, found))
    }

    fn document_highlight(
        &self,
        document: &SourceDocument,
        position: Position,
    ) -> Result<Vec<DocumentHighlight>, BackendError> {
        let offset = document.offset();
        let found = self.swallow(
            "document highlight",
            document,
            self.inner.document_highlight(document, offset.to_backend(position)),
        );
        Ok(found
            .into_iter()
            .filter_map(|mut highlight| {
                highlight.range = offset.range_from_backend(highlight.range)?;
                Some(highlight)
            })
            .collect())
    }
}

/// Adds an empty `plugins.bess` section so clients see the plugin's settings
/// namespace even before it is configured.
fn with_plugin_section(settings: Value) -> Value {
    let mut root = match settings {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let plugins = root
        .entry("plugins")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(plugins) = plugins {
        plugins
            .entry(PLUGIN_NAME)
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plugin_section_is_added_without_clobbering() {
        assert_eq!(with_plugin_section(Value::Null), json!({"plugins": {"bess": {}}}));
        assert_eq!(
            with_plugin_section(json!({"plugins": {"pyflakes": {"enabled": true}}})),
            json!({"plugins": {"pyflakes": {"enabled": true}, "bess": {}}})
        );
        assert_eq!(
            with_plugin_section(json!({"plugins": {"bess": {"sourceDirectory": "/b"}}})),
            json!({"plugins": {"bess": {"sourceDirectory": "/b"}}})
        );
    }
}
