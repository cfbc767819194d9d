//! Classification of a selected row range.

use crate::chunk::ChunkRange;
use crate::diff::{DiffDocument, LineKind, Side, SideBySideView};

/// Which row sequence a selection was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The combined document
    Combined,
    /// One column of the side-by-side view; only that side's changes count
    SingleSide(Side),
}

/// Where a selection was made
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Combined(&'a DiffDocument),
    Column(&'a SideBySideView, Side),
}

/// A classified selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub mode: Mode,
    /// Rows as selected, in the sequence that produced them
    pub range: ChunkRange,
    /// The same rows in combined-document indices
    pub combined_range: ChunkRange,
    /// At least one change is selected
    pub has_changes: bool,
    /// At least one change of the document is not selected, so the file
    /// cannot be handled as a whole
    pub has_lines_outside_selection: bool,
}

impl Selection {
    pub fn is_combined(&self) -> bool {
        self.mode == Mode::Combined
    }

    pub fn is_old_side(&self) -> bool {
        self.mode == Mode::SingleSide(Side::Old)
    }

    /// Whether the combined row at `index` is a selected change
    pub fn selects(&self, index: usize, kind: LineKind) -> bool {
        if !self.combined_range.contains(index) {
            return false;
        }
        match self.mode {
            Mode::Combined => kind.is_change(),
            Mode::SingleSide(Side::Old) => kind == LineKind::Deleted,
            Mode::SingleSide(Side::New) => kind == LineKind::Added,
        }
    }
}

/// Classify rows `start..=end` of `target`.
///
/// Indices are clamped to the row sequence and swapped when reversed.
/// Returns `None` for an empty sequence, or for a column range made only of
/// filler rows.
pub fn evaluate_selection(target: Target<'_>, start: usize, end: usize) -> Option<Selection> {
    let (document, len) = match target {
        Target::Combined(doc) => (doc, doc.lines.len()),
        Target::Column(view, _) => (view.document().as_ref(), view.len()),
    };

    let last = len.checked_sub(1)?;
    let (start, end) = (start.min(last), end.min(last));
    let range = ChunkRange::new(start.min(end), start.max(end));

    let (mode, combined_range) = match target {
        Target::Combined(_) => (Mode::Combined, range),
        Target::Column(view, side) => (Mode::SingleSide(side), view.to_combined_range(side, range)?),
    };

    let mut selection = Selection {
        mode,
        range,
        combined_range,
        has_changes: false,
        has_lines_outside_selection: false,
    };

    for (index, line) in document.lines.iter().enumerate() {
        if !line.kind.is_change() {
            continue;
        }
        if selection.selects(index, line.kind) {
            selection.has_changes = true;
        } else {
            selection.has_lines_outside_selection = true;
        }
    }

    Some(selection)
}
