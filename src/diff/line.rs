use std::num::NonZeroU32;

/// The role a row plays in a rendered diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// Unchanged context, present on both sides
    Normal,
    /// Present only in the new version
    Added,
    /// Present only in the old version
    Deleted,
    /// Hunk header row
    Indicator,
    /// Alignment filler in a side-by-side column
    Empty,
}

impl LineKind {
    /// Whether the row is an actual modification
    pub fn is_change(self) -> bool {
        matches!(self, LineKind::Added | LineKind::Deleted)
    }
}

/// Intra-line emphasis range, in bytes from the start of the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub start: usize,
    pub len: usize,
}

/// One rendered row of a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub old_line: Option<NonZeroU32>,
    pub new_line: Option<NonZeroU32>,
    /// Text without the leading diff marker
    pub content: String,
    pub highlights: Vec<Highlight>,
    /// Followed by `\ No newline at end of file` in the source diff
    pub no_newline: bool,
}

/// The filler row used to pad side-by-side columns
pub static FILLER: DiffLine = DiffLine {
    kind: LineKind::Empty,
    old_line: None,
    new_line: None,
    content: String::new(),
    highlights: Vec::new(),
    no_newline: false,
};

impl DiffLine {
    fn new(kind: LineKind, old_line: u32, new_line: u32, content: &str) -> Self {
        Self {
            kind,
            old_line: NonZeroU32::new(old_line),
            new_line: NonZeroU32::new(new_line),
            content: content.to_string(),
            highlights: Vec::new(),
            no_newline: false,
        }
    }

    pub fn normal(old_line: u32, new_line: u32, content: &str) -> Self {
        Self::new(LineKind::Normal, old_line, new_line, content)
    }

    pub fn added(new_line: u32, content: &str) -> Self {
        Self::new(LineKind::Added, 0, new_line, content)
    }

    pub fn deleted(old_line: u32, content: &str) -> Self {
        Self::new(LineKind::Deleted, old_line, 0, content)
    }

    pub fn indicator(header: &str) -> Self {
        Self::new(LineKind::Indicator, 0, 0, header)
    }

    /// The larger of the two line numbers, or 0
    pub fn max_line_number(&self) -> u32 {
        let old = self.old_line.map_or(0, NonZeroU32::get);
        let new = self.new_line.map_or(0, NonZeroU32::get);
        old.max(new)
    }
}
