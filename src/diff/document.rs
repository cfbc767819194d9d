use super::highlight::{Highlighter, NoHighlight};
use super::hunk::HunkHeader;
use super::line::{DiffLine, LineKind};
use crate::change::Change;

/// How a document is displayed and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffOption {
    pub side_by_side: bool,
    /// The working-copy change this diff belongs to; `None` for commit diffs
    pub working_copy: Option<Change>,
    /// The diff compares the index with the working tree (rather than HEAD
    /// with the index)
    pub unstaged: bool,
}

/// The parsed line model of one file's diff
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffDocument {
    pub path: String,
    pub lines: Vec<DiffLine>,
    /// Largest line number on either side, for gutter width
    pub max_line_number: u32,
    pub option: DiffOption,
}

/// Rows belonging to one hunk: the indicator row and the rows after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRows {
    /// Index of the indicator row
    pub indicator: usize,
    /// Index one past the last row of the hunk
    pub end: usize,
}

impl HunkRows {
    /// Indices of the content rows
    pub fn body(&self) -> std::ops::Range<usize> {
        self.indicator + 1..self.end
    }
}

impl DiffDocument {
    /// Parse unified diff text for a single file, without highlights.
    ///
    /// ```
    /// use git_chunks::diff::{DiffDocument, LineKind};
    ///
    /// let doc = DiffDocument::from_raw("--- a/x\n+++ b/x\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
    /// assert_eq!(doc.path, "x");
    /// assert_eq!(doc.lines.len(), 4);
    /// assert_eq!(doc.lines[2].kind, LineKind::Deleted);
    /// ```
    pub fn from_raw(text: &str) -> Self {
        Self::from_raw_with(text, &NoHighlight)
    }

    /// Parse unified diff text, asking `highlighter` for intra-line ranges of
    /// every deleted/added pair.
    ///
    /// Only the first file section is read. Rows outside a hunk, and rows
    /// with an unknown marker, are skipped.
    pub fn from_raw_with(text: &str, highlighter: &dyn Highlighter) -> Self {
        let mut doc = DiffDocument::default();
        let mut old_line = 0u32;
        let mut new_line = 0u32;
        let mut in_hunk = false;
        let mut seen_file = false;

        for line in text.lines() {
            if line.starts_with("diff --git ") {
                if seen_file {
                    break;
                }
                seen_file = true;
                in_hunk = false;
                continue;
            }

            if !in_hunk {
                if let Some(path) = line.strip_prefix("+++ b/") {
                    doc.path = path.to_string();
                } else if let Some(path) = line.strip_prefix("--- a/")
                    && doc.path.is_empty()
                {
                    doc.path = path.to_string();
                }
            }

            if line.starts_with("@@") {
                let Some(header) = HunkHeader::parse(line) else {
                    in_hunk = false;
                    continue;
                };
                seen_file = true;
                in_hunk = true;
                old_line = header.old.lines_before();
                new_line = header.new.lines_before();
                doc.lines.push(DiffLine::indicator(line));
                continue;
            }

            if !in_hunk {
                continue;
            }

            if line.starts_with('\\') {
                if let Some(last) = doc.lines.last_mut() {
                    last.no_newline = true;
                }
            } else if let Some(content) = line.strip_prefix(' ') {
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                doc.lines.push(DiffLine::normal(old_line, new_line, content));
            } else if let Some(content) = line.strip_prefix('+') {
                new_line = new_line.saturating_add(1);
                doc.lines.push(DiffLine::added(new_line, content));
            } else if let Some(content) = line.strip_prefix('-') {
                old_line = old_line.saturating_add(1);
                doc.lines.push(DiffLine::deleted(old_line, content));
            } else if line.is_empty() {
                // An empty context line whose leading space was stripped by an
                // editor. `git apply` accepts these as context too.
                old_line = old_line.saturating_add(1);
                new_line = new_line.saturating_add(1);
                doc.lines.push(DiffLine::normal(old_line, new_line, ""));
            }
        }

        doc.max_line_number = doc
            .lines
            .iter()
            .map(DiffLine::max_line_number)
            .max()
            .unwrap_or(0);
        apply_highlights(&mut doc.lines, highlighter);
        doc
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_option(mut self, option: DiffOption) -> Self {
        self.option = option;
        self
    }

    /// Kind of every row, in order
    pub fn kinds(&self) -> Vec<LineKind> {
        self.lines.iter().map(|line| line.kind).collect()
    }

    /// Whether any row is an actual modification
    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|line| line.kind.is_change())
    }

    /// Row ranges of every hunk, in order
    pub fn hunks(&self) -> Vec<HunkRows> {
        let indicators: Vec<usize> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.kind == LineKind::Indicator)
            .map(|(i, _)| i)
            .collect();

        indicators
            .iter()
            .enumerate()
            .map(|(n, &indicator)| HunkRows {
                indicator,
                end: indicators.get(n + 1).copied().unwrap_or(self.lines.len()),
            })
            .collect()
    }
}

/// Pair each run of deleted rows with the run of added rows right after it
fn apply_highlights(lines: &mut [DiffLine], highlighter: &dyn Highlighter) {
    let mut i = 0;
    while i < lines.len() {
        if lines[i].kind != LineKind::Deleted {
            i += 1;
            continue;
        }

        let deleted_start = i;
        while i < lines.len() && lines[i].kind == LineKind::Deleted {
            i += 1;
        }
        let added_start = i;
        while i < lines.len() && lines[i].kind == LineKind::Added {
            i += 1;
        }

        let pairs = (added_start - deleted_start).min(i - added_start);
        for n in 0..pairs {
            let (old, new) = highlighter.highlight(
                &lines[deleted_start + n].content,
                &lines[added_start + n].content,
            );
            lines[deleted_start + n].highlights = old;
            lines[added_start + n].highlights = new;
        }
    }
}
