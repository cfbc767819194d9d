use super::document::DiffDocument;
use super::line::{DiffLine, FILLER, LineKind};
use crate::chunk::{ChunkRange, locate_chunk};
use std::sync::Arc;

/// One column of a side-by-side view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Old,
    New,
}

/// Scroll position shared by both columns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// Two equal-length columns derived from a combined [`DiffDocument`].
///
/// Every column row stores the index of the combined row it shows, or `None`
/// for a filler. The inverse map is built alongside, so translating in either
/// direction is a lookup.
#[derive(Debug, Clone)]
pub struct SideBySideView {
    document: Arc<DiffDocument>,
    old: Vec<Option<usize>>,
    new: Vec<Option<usize>>,
    /// Combined index -> row in the column(s) that show it
    rows: Vec<usize>,
    scroll_offset: ScrollOffset,
}

/// Build the side-by-side view of `document`.
///
/// When `previous` shows the same file its scroll offset is kept.
pub fn build_side_by_side(
    document: Arc<DiffDocument>,
    previous: Option<&SideBySideView>,
) -> SideBySideView {
    let mut old = Vec::with_capacity(document.lines.len());
    let mut new = Vec::with_capacity(document.lines.len());
    let mut rows = Vec::with_capacity(document.lines.len());

    for (index, line) in document.lines.iter().enumerate() {
        match line.kind {
            LineKind::Added => {
                rows.push(new.len());
                new.push(Some(index));
            }
            LineKind::Deleted => {
                rows.push(old.len());
                old.push(Some(index));
            }
            _ => {
                fill_empty_rows(&mut old, &mut new);
                rows.push(old.len());
                old.push(Some(index));
                new.push(Some(index));
            }
        }
    }
    fill_empty_rows(&mut old, &mut new);

    let scroll_offset = previous
        .filter(|prev| prev.document.path == document.path)
        .map(|prev| prev.scroll_offset)
        .unwrap_or_default();

    SideBySideView {
        document,
        old,
        new,
        rows,
        scroll_offset,
    }
}

fn fill_empty_rows(old: &mut Vec<Option<usize>>, new: &mut Vec<Option<usize>>) {
    let len = old.len().max(new.len());
    old.resize(len, None);
    new.resize(len, None);
}

impl SideBySideView {
    pub fn document(&self) -> &Arc<DiffDocument> {
        &self.document
    }

    pub fn path(&self) -> &str {
        &self.document.path
    }

    pub fn max_line_number(&self) -> u32 {
        self.document.max_line_number
    }

    /// Number of rows in each column
    pub fn len(&self) -> usize {
        self.old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty()
    }

    /// Combined indices shown by a column, `None` for fillers
    pub fn column(&self, side: Side) -> &[Option<usize>] {
        match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        }
    }

    /// The row shown at `row` in a column; fillers resolve to [`FILLER`]
    pub fn line(&self, side: Side, row: usize) -> Option<&DiffLine> {
        let origin = *self.column(side).get(row)?;
        Some(match origin {
            Some(index) => &self.document.lines[index],
            None => &FILLER,
        })
    }

    pub fn lines(&self, side: Side) -> impl Iterator<Item = &DiffLine> + '_ {
        self.column(side).iter().map(|origin| match origin {
            Some(index) => &self.document.lines[*index],
            None => &FILLER,
        })
    }

    pub fn kinds(&self, side: Side) -> Vec<LineKind> {
        self.lines(side).map(|line| line.kind).collect()
    }

    /// Combined index of a column row
    pub fn to_combined(&self, side: Side, row: usize) -> Option<usize> {
        self.column(side).get(row).copied().flatten()
    }

    /// Column row showing a combined row
    pub fn to_row(&self, combined: usize) -> Option<usize> {
        self.rows.get(combined).copied()
    }

    /// Translate a column range to the combined rows it shows. Fillers at
    /// either end are dropped; a range of fillers only has no counterpart.
    pub fn to_combined_range(&self, side: Side, range: ChunkRange) -> Option<ChunkRange> {
        let column = self.column(side);
        let end = range.end.min(column.len().checked_sub(1)?);
        let shown = column.get(range.start..=end)?;

        let start = shown.iter().find_map(|origin| *origin)?;
        let end = shown.iter().rev().find_map(|origin| *origin)?;
        Some(ChunkRange { start, end })
    }

    /// Locate the chunk around a clicked column row, as a combined range
    pub fn locate_chunk(&self, side: Side, row: usize) -> Option<ChunkRange> {
        let range = locate_chunk(&self.kinds(side), row)?;
        let mut combined = self.to_combined_range(side, range)?;
        if range.end + 1 == self.len() {
            combined.end = self.document.lines.len() - 1;
        }
        Some(combined)
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: ScrollOffset) {
        self.scroll_offset = offset;
    }
}

/// Remembers the last view of an open file so that a rebuilt view (after a
/// refresh) keeps its scroll position. One cache per open-file session.
#[derive(Debug, Default, Clone)]
pub struct ViewCache {
    last: Option<Arc<SideBySideView>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the view of `document`, inheriting state from the cached view
    pub fn view_for(&mut self, document: Arc<DiffDocument>) -> Arc<SideBySideView> {
        let view = Arc::new(build_side_by_side(document, self.last.as_deref()));
        self.last = Some(Arc::clone(&view));
        view
    }

    /// Record the scroll offset of the current view
    pub fn remember_scroll(&mut self, offset: ScrollOffset) {
        if let Some(last) = self.last.as_mut() {
            Arc::make_mut(last).set_scroll_offset(offset);
        }
    }

    pub fn current(&self) -> Option<&Arc<SideBySideView>> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    fn doc(text: &str) -> Arc<DiffDocument> {
        Arc::new(DiffDocument::from_raw(text))
    }

    const REPLACE: &str = "--- a/f\n+++ b/f\n@@ -1,4 +1,4 @@\n a\n-b1\n-b2\n+c\n d\n+e\n";

    #[test]
    fn columns_are_padded() {
        let view = build_side_by_side(doc(REPLACE), None);
        assert_eq!(view.len(), 6);
        assert_eq!(
            view.column(Side::Old).to_vec(),
            vec![Some(0), Some(1), Some(2), Some(3), Some(5), None]
        );
        assert_eq!(
            view.column(Side::New).to_vec(),
            vec![Some(0), Some(1), Some(4), None, Some(5), Some(6)]
        );
    }

    #[test]
    fn filler_rows_resolve_to_empty_lines() {
        let view = build_side_by_side(doc(REPLACE), None);
        assert_eq!(view.line(Side::New, 3).unwrap().kind, LineKind::Empty);
        assert_eq!(view.line(Side::Old, 5).unwrap().kind, LineKind::Empty);
        assert_eq!(view.line(Side::New, 2).unwrap().content, "c");
        assert!(view.line(Side::New, 6).is_none());
    }

    #[test]
    fn index_maps_are_inverse() {
        let view = build_side_by_side(doc(REPLACE), None);
        for combined in 0..view.document().lines.len() {
            let row = view.to_row(combined).unwrap();
            let side = match view.document().lines[combined].kind {
                LineKind::Added => Side::New,
                _ => Side::Old,
            };
            assert_eq!(view.to_combined(side, row), Some(combined));
        }
        assert_eq!(view.to_combined(Side::New, 3), None);
    }

    #[test]
    fn columns_keep_each_side_in_order() {
        let document = doc(REPLACE);
        let view = build_side_by_side(Arc::clone(&document), None);

        let old: Vec<usize> = view.column(Side::Old).iter().flatten().copied().collect();
        let new: Vec<usize> = view.column(Side::New).iter().flatten().copied().collect();
        let expected_old: Vec<usize> = (0..document.lines.len())
            .filter(|&i| document.lines[i].kind != LineKind::Added)
            .collect();
        let expected_new: Vec<usize> = (0..document.lines.len())
            .filter(|&i| document.lines[i].kind != LineKind::Deleted)
            .collect();
        assert_eq!(old, expected_old);
        assert_eq!(new, expected_new);
    }

    #[test]
    fn empty_document_has_empty_columns() {
        let view = build_side_by_side(doc(""), None);
        assert!(view.is_empty());
        assert!(view.column(Side::New).is_empty());
        assert_eq!(view.locate_chunk(Side::Old, 0), None);
    }

    #[test]
    fn scroll_offset_carries_over_for_same_file() {
        let mut previous = build_side_by_side(doc(REPLACE), None);
        previous.set_scroll_offset(ScrollOffset { x: 0.0, y: 42.0 });

        let same = build_side_by_side(doc(REPLACE), Some(&previous));
        assert_eq!(same.scroll_offset().y, 42.0);

        let other = doc("--- a/g\n+++ b/g\n@@ -1 +1 @@\n-x\n+y\n");
        let other = build_side_by_side(other, Some(&previous));
        assert_eq!(other.scroll_offset(), ScrollOffset::default());
    }

    #[test]
    fn view_cache_remembers_scroll() {
        let mut cache = ViewCache::new();
        cache.view_for(doc(REPLACE));
        cache.remember_scroll(ScrollOffset { x: 3.0, y: 7.0 });

        let refreshed = cache.view_for(doc(REPLACE));
        assert_eq!(refreshed.scroll_offset(), ScrollOffset { x: 3.0, y: 7.0 });

        cache.clear();
        assert!(cache.current().is_none());
    }

    #[test]
    fn click_in_column_selects_combined_chunk() {
        let view = build_side_by_side(doc(REPLACE), None);
        assert_eq!(
            view.locate_chunk(Side::Old, 2),
            Some(ChunkRange { start: 0, end: 6 })
        );
    }

    #[test]
    fn column_range_translation_drops_fillers() {
        let view = build_side_by_side(doc(REPLACE), None);
        assert_eq!(
            view.to_combined_range(Side::New, ChunkRange { start: 2, end: 3 }),
            Some(ChunkRange { start: 4, end: 4 })
        );
        assert_eq!(
            view.to_combined_range(Side::New, ChunkRange { start: 3, end: 3 }),
            None
        );
        assert_eq!(
            view.to_combined_range(Side::Old, ChunkRange { start: 4, end: 99 }),
            Some(ChunkRange { start: 5, end: 5 })
        );
    }

    fn arb_document() -> impl Strategy<Value = DiffDocument> {
        prop::collection::vec(0u8..3, 0..40).prop_map(|kinds| {
            let mut document = DiffDocument::default();
            document.lines.push(DiffLine::indicator("@@ -1 +1 @@"));
            for (n, kind) in (1..).zip(kinds) {
                document.lines.push(match kind {
                    0 => DiffLine::normal(n, n, "x"),
                    1 => DiffLine::deleted(n, "x"),
                    _ => DiffLine::added(n, "x"),
                });
            }
            document
        })
    }

    proptest! {
        /// Columns are equally long and show every combined row exactly once
        #[test]
        fn columns_cover_document(document in arb_document()) {
            let rows = document.lines.len();
            let view = build_side_by_side(Arc::new(document), None);
            prop_assert_eq!(view.column(Side::Old).len(), view.column(Side::New).len());

            let mut shown: Vec<usize> = view
                .column(Side::Old)
                .iter()
                .chain(view.column(Side::New))
                .flatten()
                .copied()
                .collect();
            shown.sort_unstable();
            shown.dedup();
            prop_assert_eq!(shown, (0..rows).collect::<Vec<_>>());
        }
    }
}
