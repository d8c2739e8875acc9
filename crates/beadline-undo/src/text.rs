#![forbid(unsafe_code)]

//! Line-level diffs of body text.
//!
//! A typing bead stores only the lines that differ between the old and new
//! body plus the number of unchanged lines on either side. Rebuilding a body
//! takes the unchanged context from whatever text is live at replay time.
//!
//! ```text
//! old:  a          new:  a        leading  = 1
//!       b                X        trailing = 1
//!       c                c        old_middle = [b], new_middle = [X]
//! ```
//!
//! Lines are split on `'\n'` without a final empty line, and the count of
//! trailing newlines is stored separately so reconstruction is exact.

use serde::Serialize;

/// Split `text` into lines, dropping the terminator of the last line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_terminator('\n').collect()
}

/// Number of `'\n'` characters at the very end of `text`.
#[must_use]
pub fn trailing_newlines(text: &str) -> usize {
    text.bytes().rev().take_while(|&b| b == b'\n').count()
}

/// The changed region between two bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LineDiff {
    pub leading: usize,
    pub trailing: usize,
    pub old_middle: Vec<String>,
    pub new_middle: Vec<String>,
    pub old_newlines: usize,
    pub new_newlines: usize,
}

impl LineDiff {
    /// Compute the diff from `old` to `new`.
    #[must_use]
    pub fn compute(old: &str, new: &str) -> Self {
        let old_lines = split_lines(old);
        let new_lines = split_lines(new);
        let min_len = old_lines.len().min(new_lines.len());

        let leading = old_lines
            .iter()
            .zip(&new_lines)
            .take_while(|(a, b)| a == b)
            .count();

        let trailing = if leading == new_lines.len() {
            0
        } else {
            old_lines
                .iter()
                .rev()
                .zip(new_lines.iter().rev())
                .take(min_len - leading)
                .take_while(|(a, b)| a == b)
                .count()
        };

        let middle = |lines: &[&str]| -> Vec<String> {
            lines[leading..lines.len() - trailing]
                .iter()
                .map(|s| (*s).to_string())
                .collect()
        };

        Self {
            leading,
            trailing,
            old_middle: middle(&old_lines),
            new_middle: middle(&new_lines),
            old_newlines: trailing_newlines(old),
            new_newlines: trailing_newlines(new),
        }
    }
}

/// Rebuild a body from the live text and one side of a stored diff.
///
/// The first `leading` and last `trailing` lines come from `current`; the
/// stored `middle` goes between them. The join is stripped of trailing
/// newlines and exactly `newlines` are appended.
#[must_use]
pub fn reconstruct(
    current: &str,
    leading: usize,
    trailing: usize,
    middle: &[String],
    newlines: usize,
) -> String {
    let lines = split_lines(current);
    let head = &lines[..leading.min(lines.len())];
    let tail_start = lines.len().saturating_sub(trailing).max(head.len());
    let tail = &lines[tail_start..];

    let mut out = String::with_capacity(current.len());
    let pieces = head
        .iter()
        .copied()
        .chain(middle.iter().map(String::as_str))
        .chain(tail.iter().copied());
    for (i, line) in pieces.enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line);
    }
    let kept = out.trim_end_matches('\n').len();
    out.truncate(kept);
    out.extend(std::iter::repeat_n('\n', newlines));
    out
}

/// Convert a character offset into a `(row, col)` pair.
///
/// Returns `None` if `offset` lies past the end of `text`.
#[must_use]
pub fn row_col(text: &str, offset: usize) -> Option<(usize, usize)> {
    let mut row = 0;
    let mut col = 0;
    let mut seen = 0;
    for ch in text.chars() {
        if seen == offset {
            return Some((row, col));
        }
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
        seen += 1;
    }
    (seen == offset).then_some((row, col))
}
