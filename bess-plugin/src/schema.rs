//! Module and message schema shipped next to the generated `globals.py`.
//!
//! The data file is a gzipped JSON record produced offline. It is loaded at
//! most once per [`LazySchema`] and never mutated afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flate2::read::GzDecoder;
use lsp_types::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::logging::category_schema;

pub const SCHEMA_DOCUMENT: &str = "globals.py";
pub const SCHEMA_DATA: &str = "globals.min.json.gz";

/// A file referenced by the schema: either an id into `files` or a path.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileRef {
    Id(u32),
    Path(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SourceLoc {
    pub file: FileRef,
    /// 1-indexed.
    pub line: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandEntry {
    pub name: String,
    /// Declaration row in `globals.py`, 1-indexed; 0 when unknown.
    pub line: u32,
    pub definition: Option<SourceLoc>,
    pub arg: Option<String>,
    #[serde(rename = "return")]
    pub return_type: Option<String>,
    pub examples: Vec<SourceLoc>,
}

impl CommandEntry {
    pub fn declared_at(&self, row: u32) -> bool {
        self.line.checked_sub(1) == Some(row)
    }
}

/// A module type. The module itself behaves like a command (its constructor).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ModuleEntry {
    #[serde(flatten)]
    pub entry: CommandEntry,
    #[serde(default)]
    pub cmds: Vec<CommandEntry>,
}

impl ModuleEntry {
    /// The constructor followed by the commands, in schema order.
    pub fn entries(&self) -> impl Iterator<Item = &CommandEntry> {
        std::iter::once(&self.entry).chain(self.cmds.iter())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TypeEntry {
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub file: FileRef,
    pub line: u32,
    #[serde(default)]
    pub fields: Vec<serde_json::Value>,
}

impl TypeEntry {
    pub fn location(&self) -> SourceLoc {
        SourceLoc {
            file: self.file.clone(),
            line: self.line,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct SchemaData {
    #[serde(rename = "bess-version", default)]
    version: String,
    #[serde(default)]
    files: HashMap<String, String>,
    #[serde(rename = "globals", default)]
    modules: Vec<ModuleEntry>,
    #[serde(rename = "msg", default)]
    types: Vec<TypeEntry>,
}

#[derive(Debug)]
pub enum SchemaError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Io(err) => write!(f, "failed to read schema data: {err}"),
            SchemaError::Json(err) => write!(f, "invalid schema data: {err}"),
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchemaError::Io(err) => Some(err),
            SchemaError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SchemaError {
    fn from(value: std::io::Error) -> Self {
        SchemaError::Io(value)
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(value: serde_json::Error) -> Self {
        SchemaError::Json(value)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Schema {
    data: SchemaData,
    by_name: HashMap<String, usize>,
    by_full_name: HashMap<String, usize>,
}

impl Schema {
    fn new(data: SchemaData) -> Self {
        let mut by_name = HashMap::new();
        let mut by_full_name = HashMap::new();
        for (idx, entry) in data.types.iter().enumerate() {
            by_name.insert(entry.name.clone(), idx);
            by_full_name.insert(entry.full_name.clone(), idx);
        }
        Self {
            data,
            by_name,
            by_full_name,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load_gz(path: &Path) -> Result<Self, SchemaError> {
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Self::new(serde_json::from_reader(decoder)?))
    }

    pub fn version(&self) -> &str {
        &self.data.version
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.data.modules
    }

    pub fn file_path(&self, id: u32) -> Option<&str> {
        self.data.files.get(&id.to_string()).map(String::as_str)
    }

    pub fn type_by_name(&self, name: &str) -> Option<&TypeEntry> {
        self.by_name.get(name).map(|idx| &self.data.types[*idx])
    }

    pub fn type_by_full_name(&self, full_name: &str) -> Option<&TypeEntry> {
        self.by_full_name
            .get(full_name)
            .map(|idx| &self.data.types[*idx])
    }

    /// For each module, the first of its entries declared on `row` (0-indexed).
    pub fn commands_at_row(&self, row: u32) -> Vec<&CommandEntry> {
        self.modules()
            .iter()
            .filter_map(|module| module.entries().find(|entry| entry.declared_at(row)))
            .collect()
    }
}

/// Schema loaded from a directory on first use.
#[derive(Debug)]
pub struct LazySchema {
    dir: PathBuf,
    cell: OnceLock<Option<Schema>>,
}

impl LazySchema {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cell: OnceLock::new(),
        }
    }

    /// An already-loaded schema rooted at `dir`.
    pub fn from_schema(dir: impl Into<PathBuf>, schema: Schema) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Some(schema));
        Self {
            dir: dir.into(),
            cell,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(SCHEMA_DOCUMENT)
    }

    pub fn document_uri(&self) -> Option<Url> {
        Url::from_file_path(self.document_path()).ok()
    }

    /// The schema, or `None` when it could not be loaded. A failed load is
    /// reported once and not retried.
    pub fn get(&self) -> Option<&Schema> {
        self.cell
            .get_or_init(|| {
                let path = self.dir.join(SCHEMA_DATA);
                match Schema::load_gz(&path) {
                    Ok(schema) => {
                        debug!(
                            "{} loaded {} modules from {}",
                            category_schema(),
                            schema.modules().len(),
                            path.display()
                        );
                        Some(schema)
                    }
                    Err(err) => {
                        warn!("{} {}: {err}", category_schema(), path.display());
                        None
                    }
                }
            })
            .as_ref()
    }
}
