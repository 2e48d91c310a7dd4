mod backend;
mod config;
mod diagnostics;
mod document;
mod enrich;
mod logging;
mod notice;
mod offset;
mod schema;
mod sugared;

pub use backend::{BackendError, InitializeContext, LanguageBackend};
pub use config::{
    ConfigError, GotoKind, PLUGIN_NAME, PluginSettings, RefCategory, SOURCE_DIR_ENV,
    resolve_source_dir,
};
pub use diagnostics::LintFilter;
pub use document::{Rewritten, SourceDocument, SourceMode};
pub use enrich::{EnrichContext, enrich};
pub use logging::{ansi_enabled, category_rewrite, init as init_logging, row_label};
pub use notice::{
    NOTICE_DELAY, Notifier, UNKNOWN_VERSION, schedule_notice, source_version, version_notice,
};
pub use offset::{DSL_EXTENSION, HEADER_LINE, LineOffset, inject_header, is_dsl_uri};
pub use schema::{
    CommandEntry, FileRef, LazySchema, ModuleEntry, SCHEMA_DATA, SCHEMA_DOCUMENT, Schema,
    SchemaError, SourceLoc, TypeEntry,
};
pub use sugared::SugaredBackend;
