//! Parsing of row specs, the command-line form of a selection.
//!
//! Rows are the indices printed in the left margin of `git-chunks show`.
//!
//! # Syntax
//!
//! - `N` - click on row N: select the chunk around it
//! - `N..M` - drag from row N to row M (inclusive, either order)
//!
//! # Examples
//!
//! ```
//! use git_chunks::parse::{RowSpec, parse_row_spec};
//!
//! assert_eq!(parse_row_spec("12").unwrap(), RowSpec::Row(12));
//! assert_eq!(parse_row_spec("3..7").unwrap(), RowSpec::Range { start: 3, end: 7 });
//! assert!(parse_row_spec("3..").is_err());
//! ```

use crate::chunk::locate_chunk;
use crate::selection::{Selection, Target, evaluate_selection};
use error_set::error_set;
use std::str::FromStr;

error_set! {
    /// Errors from parsing row specs
    ParseError := {
        /// Nothing but whitespace was given
        #[display("No rows given")]
        EmptySpec,
        /// A row is not a non-negative integer
        #[display("Invalid row '{value}'")]
        InvalidRow { value: String },
    }
}

/// A selection as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSpec {
    /// A single clicked row
    Row(usize),
    /// A dragged range of rows
    Range { start: usize, end: usize },
}

/// Parse `N` or `N..M`.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is empty or a row is not a number.
pub fn parse_row_spec(input: &str) -> Result<RowSpec, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseError::EmptySpec);
    }

    match input.split_once("..") {
        Some((start, end)) => Ok(RowSpec::Range {
            start: parse_row(start)?,
            end: parse_row(end)?,
        }),
        None => Ok(RowSpec::Row(parse_row(input)?)),
    }
}

fn parse_row(input: &str) -> Result<usize, ParseError> {
    input
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidRow {
            value: input.to_string(),
        })
}

impl FromStr for RowSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_row_spec(s)
    }
}

impl RowSpec {
    /// Turn the row spec into a selection of `target`.
    ///
    /// A clicked row selects its chunk; in a side-by-side column the chunk is
    /// located in that column and selected across both sides.
    pub fn select(self, target: Target<'_>) -> Option<Selection> {
        match (self, target) {
            (RowSpec::Range { start, end }, target) => evaluate_selection(target, start, end),
            (RowSpec::Row(row), Target::Combined(doc)) => {
                let range = locate_chunk(&doc.kinds(), row)?;
                evaluate_selection(target, range.start, range.end)
            }
            (RowSpec::Row(row), Target::Column(view, side)) => {
                let range = view.locate_chunk(side, row)?;
                evaluate_selection(Target::Combined(view.document()), range.start, range.end)
            }
        }
    }
}
