use owo_colors::OwoColorize;
use std::sync::OnceLock;
use supports_color::Stream;
use tracing_subscriber::EnvFilter;

static ANSI_ENABLED: OnceLock<bool> = OnceLock::new();

/// Installs the global subscriber. Output goes to stderr; stdout belongs to
/// the protocol stream.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let ansi = detect_ansi();
    let _ = ANSI_ENABLED.set(ansi);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    Ok(())
}

pub fn category_backend() -> String {
    label("BACKEND", |text| format!("{}", text.bright_cyan().bold()))
}

pub fn category_schema() -> String {
    label("SCHEMA", |text| format!("{}", text.bright_magenta().bold()))
}

pub fn category_rewrite() -> String {
    label("REWRITE", |text| format!("{}", text.bright_green().bold()))
}

/// Row number as printed by `bess-desugar`, dimmed when colour is on.
pub fn row_label(row: usize) -> String {
    let text = format!("{row:>5}");
    if ansi_enabled() {
        format!("{}", text.dimmed())
    } else {
        text
    }
}

pub fn ansi_enabled() -> bool {
    *ANSI_ENABLED.get_or_init(detect_ansi)
}

fn label(text: &'static str, paint: impl Fn(&str) -> String) -> String {
    if ansi_enabled() {
        paint(text)
    } else {
        text.to_string()
    }
}

fn detect_ansi() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    supports_color::on_cached(Stream::Stderr).is_some()
}
