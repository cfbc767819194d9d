//! Changed-path records parsed from `git diff --name-status` and
//! `git status --porcelain` output.
//!
//! Records that do not match the expected shape, or that carry a status code
//! this crate does not model, are skipped rather than reported.

use nom::{
    IResult, Parser,
    character::complete::{anychar, digit0, satisfy, space0, space1},
    combinator::rest,
    sequence::{preceded, terminated},
};

/// State of a path on one side (index or working tree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeState {
    /// Untouched on this side
    #[default]
    None,
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
}

impl ChangeState {
    /// Map a single status letter to a state
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(ChangeState::Modified),
            'A' => Some(ChangeState::Added),
            'D' => Some(ChangeState::Deleted),
            'R' => Some(ChangeState::Renamed),
            'C' => Some(ChangeState::Copied),
            _ => None,
        }
    }

    /// Status letter as `git status --short` prints it
    pub fn code(self) -> char {
        match self {
            ChangeState::None => ' ',
            ChangeState::Modified => 'M',
            ChangeState::Added => 'A',
            ChangeState::Deleted => 'D',
            ChangeState::Renamed => 'R',
            ChangeState::Copied => 'C',
            ChangeState::Untracked => '?',
        }
    }
}

/// Which side a name-status listing describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSide {
    /// `git diff --cached --name-status`, or a commit/stash listing
    Index,
    /// `git diff --name-status`
    WorkTree,
}

/// One modified path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Change {
    pub path: String,
    /// Source path of a rename or copy
    pub original_path: Option<String>,
    pub index: ChangeState,
    pub worktree: ChangeState,
}

impl Change {
    pub fn new(path: impl Into<String>, index: ChangeState, worktree: ChangeState) -> Self {
        Self {
            path: path.into(),
            original_path: None,
            index,
            worktree,
        }
    }

    /// Parse one `<code>[score]\t<path>[\t<path>]` record.
    ///
    /// ```
    /// use git_chunks::change::{Change, ChangeState, StatusSide};
    ///
    /// let change = Change::from_name_status("R100\tx.txt\ty.txt", StatusSide::Index).unwrap();
    /// assert_eq!(change.index, ChangeState::Renamed);
    /// assert_eq!(change.path, "y.txt");
    /// assert_eq!(change.original_path.as_deref(), Some("x.txt"));
    /// ```
    pub fn from_name_status(line: &str, side: StatusSide) -> Option<Self> {
        let (_, (code, paths)) = name_status(line).ok()?;
        let state = ChangeState::from_code(code)?;

        let mut change = Change::default();
        match side {
            StatusSide::Index => change.index = state,
            StatusSide::WorkTree => change.worktree = state,
        }
        change.set_paths(paths, "\t");
        Some(change)
    }

    /// Parse one `XY <path>` record from `git status --porcelain`
    pub fn from_porcelain(line: &str) -> Option<Self> {
        let (_, (x, y, paths)) = porcelain(line).ok()?;

        let (index, worktree) = if x == '?' && y == '?' {
            (ChangeState::Untracked, ChangeState::Untracked)
        } else {
            (porcelain_state(x)?, porcelain_state(y)?)
        };
        if index == ChangeState::None && worktree == ChangeState::None {
            return None;
        }

        let mut change = Change::new("", index, worktree);
        change.set_paths(paths, " -> ");
        Some(change)
    }

    /// Whether the index holds no previous version of the path
    pub fn is_new_in_index(&self) -> bool {
        self.index == ChangeState::Added
    }

    /// Whether the path is unknown to git
    pub fn is_untracked(&self) -> bool {
        self.worktree == ChangeState::Untracked
    }

    fn set_paths(&mut self, paths: &str, separator: &str) {
        let renamed = matches!(self.index, ChangeState::Renamed | ChangeState::Copied)
            || matches!(self.worktree, ChangeState::Renamed | ChangeState::Copied);

        match paths.split_once(separator) {
            Some((from, to)) if renamed => {
                self.original_path = Some(unquote(from).to_string());
                self.path = unquote(to).to_string();
            }
            _ => self.path = unquote(paths).to_string(),
        }
    }
}

/// Parse a whole name-status listing, skipping records that do not match
pub fn parse_name_status(output: &str, side: StatusSide) -> Vec<Change> {
    output
        .lines()
        .filter_map(|line| Change::from_name_status(line, side))
        .collect()
}

/// Parse a whole porcelain status listing, skipping records that do not match
pub fn parse_porcelain(output: &str) -> Vec<Change> {
    output.lines().filter_map(Change::from_porcelain).collect()
}

fn porcelain_state(code: char) -> Option<ChangeState> {
    match code {
        ' ' => Some(ChangeState::None),
        code => ChangeState::from_code(code),
    }
}

fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

fn name_status(input: &str) -> IResult<&str, (char, &str)> {
    (
        preceded(
            space0,
            terminated(satisfy(|c| c.is_ascii_uppercase()), digit0),
        ),
        preceded(space1, rest),
    )
        .parse(input)
}

fn porcelain(input: &str) -> IResult<&str, (char, char, &str)> {
    (anychar, anychar, preceded(satisfy(|c| c == ' '), rest)).parse(input)
}
