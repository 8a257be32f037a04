//! The command history ring buffer and `!N` / `!!` recall resolution.
//!
//! History is a fixed arena of [`HISTORY_DEPTH`] slots addressed by an
//! ever-increasing logical counter: logical index `i` lives in slot
//! `i % HISTORY_DEPTH`, so once more than `HISTORY_DEPTH` commands have been
//! recorded the oldest slots are overwritten. An index is retrievable only
//! while it is inside the retained window `count - DEPTH .. count`.

use std::fmt;
use std::ops::Range;

/// Number of command slots retained by the ring.
pub const HISTORY_DEPTH: usize = 10;

/// Fixed-capacity ring buffer of past command lines.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    slots: Vec<String>,
    /// Logical number of commands recorded so far. Monotonic; never reset.
    count: usize,
}

impl HistoryRing {
    /// Create an empty ring with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history ring needs at least one slot");
        Self {
            slots: vec![String::new(); capacity],
            count: 0,
        }
    }

    /// Record one command line, overwriting the oldest slot once full.
    pub fn push(&mut self, line: String) {
        let capacity = self.slots.len();
        self.slots[self.count % capacity] = line;
        self.count += 1;
    }

    /// Logical number of commands recorded so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The contiguous range of logical indices still retained.
    pub fn window(&self) -> Range<usize> {
        self.count.saturating_sub(self.slots.len())..self.count
    }

    /// Fetch the line at logical index `index`, or `None` when the index
    /// has been overwritten or not yet recorded.
    pub fn get(&self, index: usize) -> Option<&str> {
        if self.window().contains(&index) {
            Some(&self.slots[index % self.slots.len()])
        } else {
            None
        }
    }

    /// Retained entries as `(logical index, line)`, most recent first.
    pub fn recent(&self) -> impl Iterator<Item = (usize, &str)> {
        self.window()
            .rev()
            .map(|i| (i, self.slots[i % self.slots.len()].as_str()))
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(HISTORY_DEPTH)
    }
}

/// Why a `!N` / `!!` reference could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecallError {
    /// The text after `!` was empty or not entirely decimal digits.
    BadReference,
    /// No command has been recorded yet.
    Empty,
    /// The index is outside the retained window.
    NotFound(usize),
}

impl fmt::Display for RecallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecallError::BadReference => {
                write!(f, "! must be immediately followed by a number")
            }
            RecallError::Empty => write!(f, "no previous command"),
            RecallError::NotFound(index) => {
                write!(f, "history index {} not found", index)
            }
        }
    }
}

impl std::error::Error for RecallError {}

/// Resolve a history reference token (`!!` or `!N`) to the stored line.
///
/// The caller decides whether a token is a reference at all: `!!` and
/// `!<anything that is not another !>` are references; longer `!!…` tokens
/// fall through to ordinary dispatch. A bare `!` fails the digit check and
/// reports [`RecallError::BadReference`]. Resolution never mutates the ring.
pub fn resolve_reference(token: &str, ring: &HistoryRing) -> Result<String, RecallError> {
    if token == "!!" {
        let last = ring.count().checked_sub(1);
        return match last.and_then(|i| ring.get(i)) {
            Some(line) => Ok(line.to_string()),
            None => Err(RecallError::Empty),
        };
    }

    let digits = token.strip_prefix('!').unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RecallError::BadReference);
    }
    if ring.count() == 0 {
        return Err(RecallError::Empty);
    }
    let index: usize = digits.parse().map_err(|_| RecallError::BadReference)?;
    match ring.get(index) {
        Some(line) => Ok(line.to_string()),
        None => Err(RecallError::NotFound(index)),
    }
}
