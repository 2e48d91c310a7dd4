use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};

use lsp_types::{Location, Position, Range, Url};

/// Line prepended to DSL documents so the backend sees the stage types.
pub const HEADER_LINE: &str = "from pyls_bess.bess_doc.globals import *";

pub const DSL_EXTENSION: &str = ".bess";

pub fn is_dsl_uri(uri: &Url) -> bool {
    uri.path().ends_with(DSL_EXTENSION)
}

/// Prepends [`HEADER_LINE`] unless the text already starts with it.
/// Returns the text the backend should see and whether a line was added.
pub fn inject_header(source: &str) -> (Cow<'_, str>, bool) {
    if source.starts_with(HEADER_LINE) {
        return (Cow::Borrowed(source), false);
    }
    let mut text = String::with_capacity(HEADER_LINE.len() + 1 + source.len());
    text.push_str(HEADER_LINE);
    text.push('\n');
    text.push_str(source);
    (Cow::Owned(text), true)
}

/// Row translation between the document the user edits and the text the
/// backend analyses. Each crossing applies the shift exactly once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineOffset {
    header_injected: bool,
}

impl LineOffset {
    pub fn new(header_injected: bool) -> Self {
        Self { header_injected }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn header_injected(&self) -> bool {
        self.header_injected
    }

    pub fn delta(&self) -> u32 {
        u32::from(self.header_injected)
    }

    /// Caller position to backend position.
    pub fn to_backend(&self, position: Position) -> Position {
        Position::new(position.line + self.delta(), position.character)
    }

    /// Backend position to caller position. A position on the injected header
    /// has no counterpart in the user's document.
    pub fn from_backend(&self, position: Position) -> Option<Position> {
        let line = position.line.checked_sub(self.delta())?;
        Some(Position::new(line, position.character))
    }

    pub fn range_from_backend(&self, range: Range) -> Option<Range> {
        Some(Range::new(
            self.from_backend(range.start)?,
            self.from_backend(range.end)?,
        ))
    }

    /// Offset the backend saw for a file other than the open document. DSL
    /// files get the header unless their first line already is the header; a
    /// DSL file that cannot be read is assumed to have received it.
    pub fn for_target(uri: &Url) -> Self {
        if !is_dsl_uri(uri) {
            return Self::identity();
        }
        let has_header = uri
            .to_file_path()
            .ok()
            .and_then(|path| File::open(path).ok())
            .and_then(|file| BufReader::new(file).lines().next()?.ok())
            .is_some_and(|line| line.starts_with(HEADER_LINE));
        Self::new(!has_header)
    }

    pub fn location_from_backend(&self, location: Location) -> Option<Location> {
        let range = self.range_from_backend(location.range)?;
        Some(Location::new(location.uri, range))
    }
}
