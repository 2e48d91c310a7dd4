use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable consulted when no source directory is configured.
pub const SOURCE_DIR_ENV: &str = "BESS";

/// Key of this plugin under the host's `plugins` settings object.
pub const PLUGIN_NAME: &str = "bess";

/// Group a symbol-resolution result is reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefCategory {
    /// Hits in real project files, as the backend found them.
    Project,
    /// Native implementation of a module command.
    #[serde(alias = "cpp_definition")]
    NativeDefinition,
    /// Hits inside the generated schema document.
    #[serde(alias = "globals")]
    Schema,
    /// Argument and return message types.
    #[serde(alias = "protobuf")]
    TypeSchema,
    Examples,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GotoKind {
    Definitions,
    References,
    Highlight,
}

impl GotoKind {
    pub fn default_categories(self) -> &'static [RefCategory] {
        match self {
            GotoKind::Definitions => &[RefCategory::Project, RefCategory::NativeDefinition],
            GotoKind::References => &[
                RefCategory::Project,
                RefCategory::NativeDefinition,
                RefCategory::Schema,
                RefCategory::TypeSchema,
                RefCategory::Examples,
            ],
            GotoKind::Highlight => &[],
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Settings(serde_json::Error),
    SourceDir { path: PathBuf, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Settings(err) => write!(f, "invalid bess plugin settings: {err}"),
            ConfigError::SourceDir { path, message } => {
                write!(f, "source directory {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        ConfigError::Settings(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    #[serde(alias = "sourceDirectory")]
    pub source_directory: Option<String>,
    pub definitions: Vec<RefCategory>,
    pub references: Vec<RefCategory>,
}

impl PluginSettings {
    /// Reads `plugins.bess` from the host's settings object. A missing section
    /// yields the defaults.
    pub fn from_host_settings(settings: &serde_json::Value) -> Result<Self, ConfigError> {
        match settings.get("plugins").and_then(|plugins| plugins.get(PLUGIN_NAME)) {
            Some(section) if !section.is_null() => Ok(Self::deserialize(section)?),
            _ => Ok(Self::default()),
        }
    }

    /// Categories to emit for `kind`; an empty configured list means defaults.
    pub fn categories(&self, kind: GotoKind) -> &[RefCategory] {
        let configured = match kind {
            GotoKind::Definitions => &self.definitions,
            GotoKind::References => &self.references,
            GotoKind::Highlight => return &[],
        };
        if configured.is_empty() {
            kind.default_categories()
        } else {
            configured.as_slice()
        }
    }

    pub fn source_dir(&self) -> Result<PathBuf, ConfigError> {
        let env_value = std::env::var(SOURCE_DIR_ENV).ok();
        let cwd = std::env::current_dir().map_err(|err| ConfigError::SourceDir {
            path: PathBuf::new(),
            message: err.to_string(),
        })?;
        Ok(resolve_source_dir(
            self.source_directory.as_deref(),
            env_value.as_deref(),
            &cwd,
        ))
    }
}

/// Setting first, then the environment, then the current directory.
pub fn resolve_source_dir(setting: Option<&str>, env_value: Option<&str>, cwd: &Path) -> PathBuf {
    let Some(raw) = setting.or(env_value).filter(|raw| !raw.is_empty()) else {
        return cwd.to_path_buf();
    };
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
