pub mod document;
pub mod highlight;
pub mod hunk;
pub mod line;
pub mod side_by_side;

pub use document::{DiffDocument, DiffOption, HunkRows};
pub use highlight::{Highlighter, NoHighlight, WordHighlighter};
pub use hunk::{HunkHeader, HunkRange};
pub use line::{DiffLine, FILLER, Highlight, LineKind};
pub use side_by_side::{ScrollOffset, Side, SideBySideView, ViewCache, build_side_by_side};

use std::num::NonZeroU32;

fn marker(kind: LineKind) -> char {
    match kind {
        LineKind::Added => '+',
        LineKind::Deleted => '-',
        _ => ' ',
    }
}

fn number(n: Option<NonZeroU32>, width: usize) -> String {
    match n {
        Some(n) => format!("{:>width$}", n),
        None => " ".repeat(width),
    }
}

fn width(max_line_number: u32) -> usize {
    max_line_number.max(1).to_string().len()
}

/// Render a combined document for display, one row per line, prefixed with
/// the row index used to select chunks.
///
/// Example output:
/// ```text
///    0 @@ -9,3 +9,3 @@
///    1  9  9    gtk = {
///    2 10    -    gtk.theme.name = "Adwaita";
///    3    10 +    # Theme managed by Stylix
///    4 11 11   };
/// ```
pub fn format_document(doc: &DiffDocument) -> String {
    let w = width(doc.max_line_number);
    let mut result = String::new();

    for (index, line) in doc.lines.iter().enumerate() {
        if line.kind == LineKind::Indicator {
            result.push_str(&format!("{:>4} {}\n", index, line.content));
            continue;
        }
        result.push_str(&format!(
            "{:>4} {} {} {}{}\n",
            index,
            number(line.old_line, w),
            number(line.new_line, w),
            marker(line.kind),
            line.content
        ));
    }

    result
}

/// Render a side-by-side view, old column on the left
pub fn format_side_by_side(view: &SideBySideView) -> String {
    let w = width(view.max_line_number());
    let column_width = view
        .lines(Side::Old)
        .map(|line| line.content.chars().count())
        .max()
        .unwrap_or(0);
    let mut result = String::new();

    for (row, (old, new)) in view.lines(Side::Old).zip(view.lines(Side::New)).enumerate() {
        if old.kind == LineKind::Indicator {
            result.push_str(&format!("{:>4} {}\n", row, old.content));
            continue;
        }
        result.push_str(&format!(
            "{:>4} {} {}{:<column_width$} | {} {}{}\n",
            row,
            number(old.old_line, w),
            marker(old.kind),
            old.content,
            number(new.new_line, w),
            marker(new.kind),
            new.content,
        ));
    }

    result
}
