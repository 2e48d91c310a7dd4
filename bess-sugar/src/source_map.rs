use std::collections::BTreeSet;

/// Splits text into lines the way the rewriters see them: only `\n` ends a
/// line and every line keeps its terminator.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Byte offset of character column `col` inside `line`, clamped to the line length.
pub fn char_col_to_byte(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

#[derive(Clone, Debug)]
pub struct SourceText<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            line_starts: compute_line_starts(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line `row` (0-indexed) including its terminator.
    pub fn line(&self, row: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(row)?;
        let end = self
            .line_starts
            .get(row + 1)
            .copied()
            .unwrap_or(self.text.len());
        self.text.get(start..end)
    }

    /// Line `row` without its `\n` or `\r\n` terminator.
    pub fn line_content(&self, row: usize) -> Option<&'a str> {
        self.line(row)
            .map(|line| line.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// Converts a 0-indexed row and a character column into a byte offset.
    /// Columns past the end of the line clamp to the end of its content.
    pub fn byte_offset(&self, row: usize, col: usize) -> Option<usize> {
        let start = *self.line_starts.get(row)?;
        let content = self.line_content(row)?;
        Some(start + char_col_to_byte(content, col))
    }

    /// 0-indexed row and character column for a byte offset.
    pub fn row_col_for_offset(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.text.len() {
            return None;
        }
        let row = line_index_for_offset(&self.line_starts, offset)?;
        let start = self.line_starts[row];
        let col = self.text.get(start..offset)?.chars().count();
        Some((row, col))
    }
}

/// Rows (0-indexed) of the rewritten document that a sugar rewrite touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SugarRows {
    rows: BTreeSet<usize>,
}

impl SugarRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, row: usize) {
        self.rows.insert(row);
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().copied()
    }
}

impl Extend<usize> for SugarRows {
    fn extend<T: IntoIterator<Item = usize>>(&mut self, iter: T) {
        self.rows.extend(iter);
    }
}

impl FromIterator<usize> for SugarRows {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0usize];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

fn line_index_for_offset(line_starts: &[usize], offset: usize) -> Option<usize> {
    if line_starts.is_empty() {
        return None;
    }
    let mut lo = 0usize;
    let mut hi = line_starts.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if line_starts[mid] <= offset {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Some(lo.saturating_sub(1))
}
