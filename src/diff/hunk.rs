use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as line_number},
    combinator::{map, opt},
    sequence::{delimited, preceded, separated_pair},
};
use std::fmt;

/// One side of a hunk header: `start[,count]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRange {
    pub start: u32,
    pub count: u32,
}

impl HunkRange {
    /// Build a range from the number of lines that precede it.
    ///
    /// Unified diffs name the line *before* the hunk when a side is empty,
    /// and the first line of the hunk otherwise.
    pub fn after(lines_before: u32, count: u32) -> Self {
        let start = if count == 0 {
            lines_before
        } else {
            lines_before + 1
        };
        Self { start, count }
    }

    /// Number of lines of this side that come before the hunk
    pub fn lines_before(&self) -> u32 {
        if self.count == 0 {
            self.start
        } else {
            self.start.saturating_sub(1)
        }
    }

    fn fmt_with(&self, f: &mut fmt::Formatter<'_>, marker: char) -> fmt::Result {
        match self.count {
            1 => write!(f, "{}{}", marker, self.start),
            n => write!(f, "{}{},{}", marker, self.start, n),
        }
    }
}

/// A parsed `@@ -old +new @@` hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old: HunkRange,
    pub new: HunkRange,
}

impl HunkHeader {
    /// Parse a hunk header line. Trailing section text after the closing `@@`
    /// is accepted and ignored.
    pub fn parse(line: &str) -> Option<Self> {
        hunk_header(line).ok().map(|(_, header)| header)
    }
}

impl fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@@ ")?;
        self.old.fmt_with(f, '-')?;
        write!(f, " ")?;
        self.new.fmt_with(f, '+')?;
        write!(f, " @@")
    }
}

fn hunk_range<'a>(
    marker: char,
) -> impl Parser<&'a str, Output = HunkRange, Error = nom::error::Error<&'a str>> {
    map(
        preceded(
            char(marker),
            (line_number, opt(preceded(char(','), line_number))),
        ),
        |(start, count)| HunkRange {
            start,
            count: count.unwrap_or(1),
        },
    )
}

fn hunk_header(input: &str) -> IResult<&str, HunkHeader> {
    map(
        delimited(
            tag("@@ "),
            separated_pair(hunk_range('-'), char(' '), hunk_range('+')),
            tag(" @@"),
        ),
        |(old, new)| HunkHeader { old, new },
    )
    .parse(input)
}
