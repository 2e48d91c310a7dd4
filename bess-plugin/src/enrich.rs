use std::path::{Path, PathBuf};

use lsp_types::{Location, Position, Range, Url};

use crate::config::RefCategory;
use crate::schema::{CommandEntry, FileRef, Schema, SourceLoc};

/// Everything needed to turn schema records into editor locations.
#[derive(Clone, Copy, Debug)]
pub struct EnrichContext<'a> {
    pub schema: &'a Schema,
    /// `None` when the schema document has no file URI; nothing then counts
    /// as a schema hit.
    pub schema_uri: Option<&'a Url>,
    pub schema_dir: &'a Path,
    pub source_dir: &'a Path,
}

impl EnrichContext<'_> {
    fn resolve_file(&self, file: &FileRef) -> Option<PathBuf> {
        let path = match file {
            FileRef::Id(0) => self.schema_dir.join(self.schema.file_path(0)?),
            FileRef::Id(id) => PathBuf::from(self.schema.file_path(*id)?),
            FileRef::Path(path) => PathBuf::from(path),
        };
        if path.is_absolute() {
            Some(path)
        } else {
            Some(self.source_dir.join(path))
        }
    }

    /// Start of the referenced line. Unknown files resolve to nothing.
    pub fn location(&self, loc: &SourceLoc) -> Option<Location> {
        let path = self.resolve_file(&loc.file)?;
        let uri = Url::from_file_path(path).ok()?;
        let line = loc.line.saturating_sub(1);
        let start = Position::new(line, 0);
        Some(Location::new(uri, Range::new(start, start)))
    }
}

#[derive(Debug, Default)]
struct Groups {
    project: Vec<Location>,
    native_definition: Vec<Location>,
    schema: Vec<Location>,
    type_schema: Vec<Location>,
    examples: Vec<Location>,
}

impl Groups {
    fn take(&mut self, category: RefCategory) -> Vec<Location> {
        std::mem::take(match category {
            RefCategory::Project => &mut self.project,
            RefCategory::NativeDefinition => &mut self.native_definition,
            RefCategory::Schema => &mut self.schema,
            RefCategory::TypeSchema => &mut self.type_schema,
            RefCategory::Examples => &mut self.examples,
        })
    }

    fn add_command(&mut self, ctx: &EnrichContext<'_>, command: &CommandEntry) {
        if let Some(definition) = command.definition.as_ref()
            && let Some(location) = ctx.location(definition)
        {
            self.native_definition.push(location);
        }

        if let Some(arg) = command.arg.as_deref()
            && let Some(entry) = ctx.schema.type_by_name(arg)
            && let Some(location) = ctx.location(&entry.location())
        {
            self.type_schema.push(location);
        }

        if let Some(ret) = command.return_type.as_deref()
            && let Some(entry) = ctx.schema.type_by_full_name(ret)
            && let Some(location) = ctx.location(&entry.location())
            && !self.type_schema.contains(&location)
        {
            self.type_schema.push(location);
        }

        self.examples.extend(
            command
                .examples
                .iter()
                .filter_map(|example| ctx.location(example)),
        );
    }
}

/// Sorts locations (already in user coordinates) into categories, adds the
/// schema-derived ones for hits inside the schema document and returns the
/// enabled categories in the order given.
pub fn enrich(
    ctx: &EnrichContext<'_>,
    locations: Vec<Location>,
    categories: &[RefCategory],
) -> Vec<Location> {
    let mut groups = Groups::default();
    for location in locations {
        if ctx.schema_uri != Some(&location.uri) {
            groups.project.push(location);
            continue;
        }
        let row = location.range.start.line;
        groups.schema.push(location);
        for command in ctx.schema.commands_at_row(row) {
            groups.add_command(ctx, command);
        }
    }

    let mut enriched = Vec::new();
    for category in categories {
        enriched.extend(groups.take(*category));
    }
    enriched
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "bess-version": "v0.4.0",
        "files": {"0": "globals.py", "3": "/abs/bess/core/modules/queue.cc"},
        "globals": [{
            "name": "Queue",
            "line": 10,
            "definition": {"file": 3, "line": 40},
            "cmds": [],
            "examples": [{"file": 7, "line": 1}]
        }],
        "msg": []
    }"#;

    #[test]
    fn unknown_file_ids_contribute_nothing() {
        let schema = Schema::from_json_str(SAMPLE).expect("sample should parse");
        let schema_uri = Url::parse("file:///doc/globals.py").expect("uri");
        let ctx = EnrichContext {
            schema: &schema,
            schema_uri: Some(&schema_uri),
            schema_dir: Path::new("/doc"),
            source_dir: Path::new("/src/bess"),
        };
        let hit = Location::new(
            schema_uri.clone(),
            Range::new(Position::new(9, 4), Position::new(9, 9)),
        );
        let enriched = enrich(
            &ctx,
            vec![hit.clone()],
            &[RefCategory::Schema, RefCategory::NativeDefinition, RefCategory::Examples],
        );
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0], hit);
        assert_eq!(
            enriched[1].uri.as_str(),
            "file:///abs/bess/core/modules/queue.cc"
        );
        assert_eq!(enriched[1].range.start, Position::new(39, 0));
    }

    #[test]
    fn file_zero_lives_next_to_the_schema() {
        let schema = Schema::from_json_str(SAMPLE).expect("sample should parse");
        let schema_uri = Url::parse("file:///doc/globals.py").expect("uri");
        let ctx = EnrichContext {
            schema: &schema,
            schema_uri: Some(&schema_uri),
            schema_dir: Path::new("/doc"),
            source_dir: Path::new("/src/bess"),
        };
        let loc = SourceLoc {
            file: FileRef::Id(0),
            line: 5,
        };
        let location = ctx.location(&loc).expect("file 0 resolves");
        assert_eq!(location.uri, schema_uri);

        let relative = SourceLoc {
            file: FileRef::Path("bessctl/conf/x.bess".to_string()),
            line: 1,
        };
        assert_eq!(
            ctx.location(&relative).expect("relative path resolves").uri.as_str(),
            "file:///src/bess/bessctl/conf/x.bess"
        );
    }
}
