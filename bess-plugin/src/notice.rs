use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use lsp_types::MessageType;
use regex::Regex;
use tracing::{debug, warn};

use crate::logging::category_backend;

/// How long a notice waits so the client has finished the handshake.
pub const NOTICE_DELAY: Duration = Duration::from_secs(2);

pub const UNKNOWN_VERSION: &str = "unknown";

/// Sink for user-visible messages, usually `window/showMessage`.
pub trait Notifier: Send + Sync {
    fn show_message(&self, kind: MessageType, message: String);
}

/// Shows `message` after `delay` without blocking the caller. Runs on the
/// current tokio runtime when there is one, otherwise on its own thread.
pub fn schedule_notice(
    delay: Duration,
    notifier: Arc<dyn Notifier>,
    kind: MessageType,
    message: String,
) {
    debug!("{} notice in {delay:?}: {message}", category_backend());
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            notifier.show_message(kind, message);
        });
        return;
    }

    let spawned = std::thread::Builder::new()
        .name("bess-notice".to_string())
        .spawn(move || {
            std::thread::sleep(delay);
            notifier.show_message(kind, message);
        });
    if let Err(err) = spawned {
        warn!("{} failed to schedule notice: {err}", category_backend());
    }
}

static VERSION_STRING: OnceLock<Regex> = OnceLock::new();

fn version_string() -> &'static Regex {
    VERSION_STRING.get_or_init(|| Regex::new(r#""(.*)""#).expect("static pattern should be valid"))
}

/// Version declared by the sources in `core/version.h`, if readable.
pub fn source_version(source_dir: &Path) -> Option<String> {
    let header = std::fs::read_to_string(source_dir.join("core").join("version.h")).ok()?;
    let captures = version_string().captures(&header)?;
    Some(captures[1].to_string())
}

/// Message to show when the source tree is missing or was built from a
/// different version than the bundled schema.
pub fn version_notice(source_dir: &Path, schema_version: Option<&str>) -> Option<String> {
    if !source_dir.join("bessctl").exists() {
        return Some(format!("Bess sources not found in {}", source_dir.display()));
    }
    let version = source_version(source_dir).unwrap_or_else(|| UNKNOWN_VERSION.to_string());
    match schema_version {
        Some(schema_version) if version != UNKNOWN_VERSION && version != schema_version => Some(
            format!("Different bess versions. Source: {version}, pyls_bess: {schema_version}"),
        ),
        _ => None,
    }
}
