//! Chunk location: the smallest context-bounded run of rows around a
//! clicked row.
//!
//! Diff rows carry no explicit chunk boundaries besides hunk headers, so a
//! chunk ends at an indicator row or at the second of two consecutive
//! context rows, scanning outward from the click in both directions.

use crate::diff::LineKind;

/// Inclusive row range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: usize,
    pub end: usize,
}

impl ChunkRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Consecutive context rows that close a chunk
const CONTEXT_BOUNDARY: usize = 2;

/// Locate the chunk around `index`.
///
/// Returns `None` when `index` is out of range or the enclosing run holds no
/// added or deleted row.
///
/// ```
/// use git_chunks::chunk::{ChunkRange, locate_chunk};
/// use git_chunks::diff::LineKind::*;
///
/// let kinds = [Indicator, Normal, Deleted, Added, Normal];
/// assert_eq!(locate_chunk(&kinds, 2), Some(ChunkRange::new(0, 4)));
/// assert_eq!(locate_chunk(&kinds, 0), Some(ChunkRange::new(0, 4)));
/// ```
pub fn locate_chunk(kinds: &[LineKind], index: usize) -> Option<ChunkRange> {
    if index >= kinds.len() {
        return None;
    }

    let mut modified = false;
    let mut normal_run = 0;
    let mut start = 0;

    for i in (0..=index).rev() {
        match kinds[i] {
            LineKind::Indicator => {
                start = i;
                break;
            }
            LineKind::Normal => {
                normal_run += 1;
                if normal_run >= CONTEXT_BOUNDARY {
                    start = i;
                    break;
                }
            }
            kind => {
                normal_run = 0;
                modified |= kind.is_change();
            }
        }
    }

    normal_run = usize::from(kinds[index] == LineKind::Normal);
    let mut end = kinds.len() - 1;

    for (i, kind) in kinds.iter().enumerate().skip(index + 1) {
        match kind {
            LineKind::Indicator => {
                end = i;
                break;
            }
            LineKind::Normal => {
                normal_run += 1;
                if normal_run >= CONTEXT_BOUNDARY {
                    end = i;
                    break;
                }
            }
            kind => {
                normal_run = 0;
                modified |= kind.is_change();
            }
        }
    }

    modified.then_some(ChunkRange { start, end })
}
