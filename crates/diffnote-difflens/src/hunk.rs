use std::fmt;

use serde::Serialize;

/// Half-open interval `[start, start + line_count)` of new-file line numbers.
///
/// Zero-length ranges (pure deletions) contain no line at all, so a
/// line-level finding can never anchor to them.
///
/// # Examples
///
/// ```
/// use diffnote_difflens::hunk::HunkRange;
///
/// let range = HunkRange::new(5, 7);
/// assert!(range.contains_line(5));
/// assert!(range.contains_line(11));
/// assert!(!range.contains_line(12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HunkRange {
    start: u32,
    line_count: u32,
}

impl HunkRange {
    /// Create a range starting at `start` spanning `line_count` lines.
    pub const fn new(start: u32, line_count: u32) -> Self {
        Self { start, line_count }
    }

    /// First new-file line covered by the range.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Number of new-file lines covered.
    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// `true` when the range covers no line.
    pub fn is_empty(&self) -> bool {
        self.line_count == 0
    }

    /// Returns `true` iff `start <= line < start + line_count`.
    pub fn contains_line(&self, line: u32) -> bool {
        // u64 so a range ending at u32::MAX cannot overflow
        let line = u64::from(line);
        let start = u64::from(self.start);
        line >= start && line < start + u64::from(self.line_count)
    }
}

impl fmt::Display for HunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_count {
            0 => write!(f, "{} (empty)", self.start),
            1 => write!(f, "{}", self.start),
            n => write!(f, "{}-{}", self.start, u64::from(self.start) + u64::from(n) - 1),
        }
    }
}
