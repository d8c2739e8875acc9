#![forbid(unsafe_code)]

//! Deciding when consecutive typing edits share one bead.
//!
//! Each call to `set_undo_typing_params` either extends the typing bead on
//! top of the stack or starts a new one. The choice depends on the
//! configured [`Granularity`]:
//!
//! | granularity | new bead when                                        |
//! |-------------|------------------------------------------------------|
//! | `char`      | always                                               |
//! | `node`      | the previous bead is not typing on the same node     |
//! | `line`      | ... or the changed line range moved                  |
//! | `word`      | ... or the [`WordBoundary`] says a new word started  |

use std::fmt;

use beadline_outline::{NodeId, Selection};
use serde::{Deserialize, Serialize};

use crate::text::{LineDiff, row_col};

/// How finely typing is split into undoable steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Granularity {
    /// Every keystroke is its own bead.
    Char,
    /// Keystrokes merge until a word boundary.
    Word,
    /// Keystrokes on one line merge.
    #[default]
    Line,
    /// All typing in one node merges.
    Node,
}

impl Granularity {
    /// Parse a setting value. Unknown values fall back to [`Granularity::Line`].
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "char" => Self::Char,
            "word" => Self::Word,
            "node" => Self::Node,
            "line" => Self::Line,
            other => {
                tracing::warn!(
                    target: "beadline.undo",
                    value = other,
                    "unknown undo granularity, using line"
                );
                Self::Line
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Word => "word",
            Self::Line => "line",
            Self::Node => "node",
        }
    }
}

impl From<String> for Granularity {
    fn from(value: String) -> Self {
        Self::from_setting(&value)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cursor context for one keystroke, handed to a [`WordBoundary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    /// Character before the caret in the old text.
    pub old_ch: char,
    /// Character before the caret in the new text (the one just typed).
    pub new_ch: char,
    pub new_row: usize,
    pub new_col: usize,
    /// Caret after the previous keystroke.
    pub prev_row: usize,
    pub prev_col: usize,
}

/// Decides whether a keystroke begins a new word.
pub trait WordBoundary: Send + Sync {
    fn starts_new_word(&self, keystroke: &Keystroke) -> bool;
}

/// A word starts when whitespace follows a non-space character, or when the
/// caret did not advance by exactly one column since the last keystroke.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceBoundary;

impl WordBoundary for WhitespaceBoundary {
    fn starts_new_word(&self, k: &Keystroke) -> bool {
        let word_ended = !k.old_ch.is_whitespace() && k.new_ch.is_whitespace();
        let moved = k.new_row != k.prev_row || k.new_col != k.prev_col + 1;
        word_ended || moved
    }
}

/// What the top bead looks like, as far as merging is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PreviousTyping {
    pub v: NodeId,
    pub leading: usize,
    pub trailing: usize,
}

/// Inputs to the merge decision.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MergeQuery<'a> {
    pub granularity: Granularity,
    pub v: NodeId,
    pub diff: &'a LineDiff,
    pub previous: Option<PreviousTyping>,
    pub old_text: &'a str,
    pub new_text: &'a str,
    pub old_sel: Option<Selection>,
    pub new_sel: Option<Selection>,
    pub prev_sel: Option<Selection>,
}

/// Returns true if the edit described by `q` needs its own bead.
pub(crate) fn needs_new_bead(q: &MergeQuery<'_>, boundary: &dyn WordBoundary) -> bool {
    if q.granularity == Granularity::Char {
        return true;
    }
    let Some(prev) = q.previous else {
        return true;
    };
    if prev.v != q.v {
        return true;
    }
    if q.granularity == Granularity::Node {
        return false;
    }
    if prev.leading != q.diff.leading || prev.trailing != q.diff.trailing {
        return true;
    }
    if q.granularity == Granularity::Line {
        return false;
    }
    // Any offset that does not map onto the text counts as a boundary.
    word_step(q, boundary).unwrap_or(true)
}

fn word_step(q: &MergeQuery<'_>, boundary: &dyn WordBoundary) -> Option<bool> {
    let old_sel = q.old_sel.unwrap_or_default();
    let new_sel = q.new_sel.unwrap_or_default();
    let prev_sel = q.prev_sel.unwrap_or_default();
    if !old_sel.is_caret() || !new_sel.is_caret() {
        return Some(true);
    }
    let (old_row, old_col) = row_col(q.old_text, old_sel.insert())?;
    let (new_row, new_col) = row_col(q.new_text, new_sel.insert())?;
    let (prev_row, prev_col) = row_col(q.old_text, prev_sel.insert())?;
    if old_row != new_row || old_col.abs_diff(new_col) != 1 {
        return Some(true);
    }
    if old_col == 0 || new_col == 0 {
        return Some(false);
    }
    let old_ch = q.old_text.split('\n').nth(old_row)?.chars().nth(old_col - 1)?;
    let new_ch = q.new_text.split('\n').nth(new_row)?.chars().nth(new_col - 1)?;
    Some(boundary.starts_new_word(&Keystroke {
        old_ch,
        new_ch,
        new_row,
        new_col,
        prev_row,
        prev_col,
    }))
}
