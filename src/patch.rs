//! Synthesis of single-file patches that carry exactly the selected rows.
//!
//! Every hunk that holds a selected row is written whole. Rows that are not
//! selected are rewritten so that the patch only asserts the selected
//! modifications:
//!
//! | row                | forward     | reverse     |
//! |--------------------|-------------|-------------|
//! | context            | context     | context     |
//! | selected added     | `+`         | `+`         |
//! | selected deleted   | `-`         | `-`         |
//! | unselected added   | dropped     | context     |
//! | unselected deleted | context     | dropped     |
//!
//! A forward patch applies to the old side of the diff. A reverse patch is
//! applied with `git apply --reverse` to the new side, so its new side must
//! match what is there now.

use crate::diff::{DiffDocument, DiffLine, HunkHeader, HunkRange, LineKind};
use crate::selection::Selection;
use error_set::error_set;
use std::fmt;

error_set! {
    /// Errors from patch synthesis
    PatchError := {
        #[display("No added or deleted line is selected")]
        NothingSelected,
        #[display("Malformed hunk header: {header}")]
        MalformedHunk { header: String },
    }
}

const NO_NEWLINE: &str = "\\ No newline at end of file\n";

/// Orientation of a synthesized patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Applied as is to the old side (staging)
    Forward,
    /// Applied with `--reverse` to the new side (unstaging, discarding)
    Reverse,
}

/// How the file appears in the patch header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchKind {
    #[default]
    Modified,
    /// The file does not exist on the old side yet
    NewFile,
}

/// The file a patch is written for
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchTarget {
    pub path: String,
    pub kind: PatchKind,
    /// Blob id for the `index` header line
    pub blob: Option<String>,
}

impl PatchTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: PatchKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_blob(mut self, blob: impl Into<String>) -> Self {
        self.blob = Some(blob.into());
        self
    }
}

/// Everything needed to synthesize one patch
#[derive(Debug, Clone, Copy)]
pub struct PatchRequest<'a> {
    pub document: &'a DiffDocument,
    pub selection: &'a Selection,
    pub target: &'a PatchTarget,
    pub direction: Direction,
}

/// A complete single-file patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchBody {
    text: String,
    hunks: usize,
}

impl PatchBody {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Number of hunks in the patch
    pub fn hunk_count(&self) -> usize {
        self.hunks
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for PatchBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the patch for the rows `request.selection` selects.
///
/// ```
/// use git_chunks::diff::DiffDocument;
/// use git_chunks::patch::{Direction, PatchRequest, PatchTarget, synthesize_patch};
/// use git_chunks::selection::{Target, evaluate_selection};
///
/// let doc = DiffDocument::from_raw("--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
/// let selection = evaluate_selection(Target::Combined(&doc), 3, 3).unwrap();
/// let target = PatchTarget::new("f");
/// let patch = synthesize_patch(&PatchRequest {
///     document: &doc,
///     selection: &selection,
///     target: &target,
///     direction: Direction::Forward,
/// })
/// .unwrap();
/// assert!(patch.as_str().ends_with("@@ -1,2 +1,3 @@\n a\n b\n+c\n"));
/// ```
pub fn synthesize_patch(request: &PatchRequest<'_>) -> Result<PatchBody, PatchError> {
    let document = request.document;
    let mut text = file_header(request.target, request.direction);
    let mut hunks = 0;
    // Net lines added by the selected changes of the hunks written so far
    let mut shift = 0i64;

    for rows in document.hunks() {
        let body = &document.lines[rows.body()];
        let selected: Vec<bool> = rows
            .body()
            .map(|index| request.selection.selects(index, document.lines[index].kind))
            .collect();
        if !selected.contains(&true) {
            continue;
        }

        let indicator = &document.lines[rows.indicator].content;
        let header = HunkHeader::parse(indicator).ok_or_else(|| PatchError::MalformedHunk {
            header: indicator.clone(),
        })?;

        let hunk = write_hunk(body, &selected, request.direction);
        let (old_before, new_before) = match request.direction {
            Direction::Forward => {
                let before = header.old.lines_before();
                (before, offset(before, shift))
            }
            Direction::Reverse => {
                let before = header.new.lines_before();
                (offset(before, -shift), before)
            }
        };

        let header = HunkHeader {
            old: HunkRange::after(old_before, hunk.old_count),
            new: HunkRange::after(new_before, hunk.new_count),
        };
        text.push_str(&header.to_string());
        text.push('\n');
        text.push_str(&hunk.rows);

        shift += hunk.net;
        hunks += 1;
    }

    if hunks == 0 {
        return Err(PatchError::NothingSelected);
    }

    Ok(PatchBody { text, hunks })
}

fn file_header(target: &PatchTarget, direction: Direction) -> String {
    let path = &target.path;
    let new_file = target.kind == PatchKind::NewFile && direction == Direction::Forward;

    let mut header = format!("diff --git a/{path} b/{path}\n");
    if new_file {
        header.push_str("new file mode 100644\n");
    }
    if let Some(blob) = &target.blob {
        header.push_str(&format!("index 0000000..{blob} 100644\n"));
    }
    if new_file {
        header.push_str("--- /dev/null\n");
    } else {
        header.push_str(&format!("--- a/{path}\n"));
    }
    header.push_str(&format!("+++ b/{path}\n"));
    header
}

struct HunkText {
    rows: String,
    old_count: u32,
    new_count: u32,
    net: i64,
}

fn write_hunk(body: &[DiffLine], selected: &[bool], direction: Direction) -> HunkText {
    let mut hunk = HunkText {
        rows: String::new(),
        old_count: 0,
        new_count: 0,
        net: 0,
    };

    let markers: Vec<Option<char>> = body
        .iter()
        .zip(selected)
        .map(|(line, &selected)| match (line.kind, selected, direction) {
            (LineKind::Normal, _, _) => Some(' '),
            (LineKind::Added, true, _) => Some('+'),
            (LineKind::Deleted, true, _) => Some('-'),
            (LineKind::Deleted, false, Direction::Forward) => Some(' '),
            (LineKind::Added, false, Direction::Reverse) => Some(' '),
            _ => None,
        })
        .collect();

    for (index, (line, marker)) in body.iter().zip(&markers).enumerate() {
        let Some(marker) = *marker else {
            continue;
        };
        if !line.no_newline {
            hunk.push(marker, line);
            continue;
        }

        // A line without newline has to end its side of the patch. A side
        // that goes on past it gets the newline back.
        let goes_on = |other: char| markers[index + 1..].iter().flatten().any(|&m| m != other);
        let old_goes_on = goes_on('+');
        let new_goes_on = goes_on('-');
        let with_newline = DiffLine {
            no_newline: false,
            ..line.clone()
        };

        match marker {
            ' ' if new_goes_on && !old_goes_on => {
                hunk.push('-', line);
                hunk.push('+', &with_newline);
            }
            ' ' if old_goes_on && !new_goes_on => {
                hunk.push('-', &with_newline);
                hunk.push('+', line);
            }
            ' ' if old_goes_on => hunk.push(' ', &with_newline),
            '-' if old_goes_on => hunk.push('-', &with_newline),
            '+' if new_goes_on => hunk.push('+', &with_newline),
            _ => hunk.push(marker, line),
        }
    }

    hunk
}

impl HunkText {
    fn push(&mut self, marker: char, line: &DiffLine) {
        match marker {
            '+' => {
                self.new_count += 1;
                self.net += 1;
            }
            '-' => {
                self.old_count += 1;
                self.net -= 1;
            }
            _ => {
                self.old_count += 1;
                self.new_count += 1;
            }
        }

        self.rows.push(marker);
        self.rows.push_str(&line.content);
        self.rows.push('\n');
        if line.no_newline {
            self.rows.push_str(NO_NEWLINE);
        }
    }
}

fn offset(lines_before: u32, shift: i64) -> u32 {
    u32::try_from(i64::from(lines_before) + shift).unwrap_or(0)
}
