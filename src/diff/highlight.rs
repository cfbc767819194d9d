use super::line::Highlight;
use similar::{ChangeTag, TextDiff};

/// Computes intra-line emphasis for a deleted line and the added line
/// paired with it.
pub trait Highlighter {
    /// Returns the ranges to emphasize in `deleted` and in `added`
    fn highlight(&self, deleted: &str, added: &str) -> (Vec<Highlight>, Vec<Highlight>);
}

/// Leaves every row without highlights
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHighlight;

impl Highlighter for NoHighlight {
    fn highlight(&self, _deleted: &str, _added: &str) -> (Vec<Highlight>, Vec<Highlight>) {
        (Vec::new(), Vec::new())
    }
}

/// Word-level highlighting
#[derive(Debug, Default, Clone, Copy)]
pub struct WordHighlighter;

impl Highlighter for WordHighlighter {
    fn highlight(&self, deleted: &str, added: &str) -> (Vec<Highlight>, Vec<Highlight>) {
        let mut old_ranges = Vec::new();
        let mut new_ranges = Vec::new();
        let mut old_offset = 0;
        let mut new_offset = 0;

        let diff = TextDiff::from_words(deleted, added);
        for change in diff.iter_all_changes() {
            let len = change.value().len();
            match change.tag() {
                ChangeTag::Equal => {
                    old_offset += len;
                    new_offset += len;
                }
                ChangeTag::Delete => {
                    push_merged(&mut old_ranges, old_offset, len);
                    old_offset += len;
                }
                ChangeTag::Insert => {
                    push_merged(&mut new_ranges, new_offset, len);
                    new_offset += len;
                }
            }
        }

        (old_ranges, new_ranges)
    }
}

fn push_merged(ranges: &mut Vec<Highlight>, start: usize, len: usize) {
    if len == 0 {
        return;
    }
    match ranges.last_mut() {
        Some(last) if last.start + last.len == start => last.len += len,
        _ => ranges.push(Highlight { start, len }),
    }
}
