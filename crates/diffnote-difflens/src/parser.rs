use std::fmt;

use diffnote_core::{DiffnoteError, RawDiff};
use serde::Serialize;

use crate::hunk::HunkRange;

/// The changed new-file line ranges of one file in a commit.
///
/// `path` is repository-relative and always uses `/` as separator.
///
/// # Examples
///
/// ```
/// use diffnote_core::RawDiff;
/// use diffnote_difflens::parser::parse_file_diff;
///
/// let raw = RawDiff {
///     new_path: "src/lib.rs".into(),
///     old_path: "src/lib.rs".into(),
///     diff_text: "@@ -1,3 +1,4 @@\n fn main() {\n+    run();\n }\n".into(),
///     ..Default::default()
/// };
/// let diff = parse_file_diff(&raw).unwrap().unwrap();
/// assert_eq!(diff.path, "src/lib.rs");
/// assert!(diff.contains_line(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDiff {
    /// New-file path relative to the repository root.
    pub path: String,
    /// Hunk ranges in the order they appear in the diff.
    pub ranges: Vec<HunkRange>,
}

impl FileDiff {
    /// `true` when at least one hunk covers a new-file line.
    ///
    /// A pure rename or a deletion-only change has no such hunk.
    pub fn has_changes(&self) -> bool {
        self.ranges.iter().any(|r| !r.is_empty())
    }

    /// `true` when any hunk range contains `line`.
    pub fn contains_line(&self, line: u32) -> bool {
        self.ranges.iter().any(|r| r.contains_line(line))
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hunks)", self.path, self.ranges.len())
    }
}

/// Parse one commit diff entry into a [`FileDiff`].
///
/// Deleted files yield `Ok(None)`: there is nothing left to annotate. Only
/// lines starting with `@@` are inspected; everything else (file headers,
/// hunk content) is skipped.
///
/// # Errors
///
/// Returns [`DiffnoteError::DiffParse`] if a hunk header does not match
/// `@@ -a[,b] +c[,d] @@`.
///
/// # Examples
///
/// ```
/// use diffnote_core::RawDiff;
/// use diffnote_difflens::parser::parse_file_diff;
///
/// let raw = RawDiff {
///     new_path: "gone.rs".into(),
///     old_path: "gone.rs".into(),
///     diff_text: "@@ -1,3 +0,0 @@\n-a\n-b\n-c\n".into(),
///     deleted: true,
///     ..Default::default()
/// };
/// assert!(parse_file_diff(&raw).unwrap().is_none());
/// ```
pub fn parse_file_diff(raw: &RawDiff) -> Result<Option<FileDiff>, DiffnoteError> {
    if raw.deleted {
        return Ok(None);
    }

    let path = raw.new_path.replace('\\', "/");
    let mut ranges = Vec::new();

    for line in raw.diff_text.lines() {
        if !line.starts_with("@@") {
            continue;
        }
        let range = parse_hunk_header(line)
            .and_then(|h| h.new_range())
            .ok_or_else(|| DiffnoteError::DiffParse {
                path: path.clone(),
                header: line.to_string(),
            })?;
        ranges.push(range);
    }

    Ok(Some(FileDiff { path, ranges }))
}

/// Parse every entry of a commit diff, dropping deleted files.
///
/// # Errors
///
/// Fails on the first malformed hunk header, see [`parse_file_diff`].
pub fn parse_commit_diffs(raws: &[RawDiff]) -> Result<Vec<FileDiff>, DiffnoteError> {
    let mut diffs = Vec::with_capacity(raws.len());
    for raw in raws {
        if let Some(diff) = parse_file_diff(raw)? {
            diffs.push(diff);
        }
    }
    Ok(diffs)
}

/// Split a multi-file patch (as produced by `git diff`) into per-file [`RawDiff`] entries.
///
/// Handles `diff --git` sections as well as bare `---`/`+++` patches, new,
/// deleted and renamed files, and quoted paths. Binary entries are skipped.
/// Each entry's `diff_text` holds the hunks only.
///
/// # Errors
///
/// Returns [`DiffnoteError::DiffParse`] if a hunk header is malformed.
///
/// # Examples
///
/// ```
/// use diffnote_difflens::parser::split_git_patch;
///
/// let patch = "diff --git a/hello.rs b/hello.rs
/// --- a/hello.rs
/// +++ b/hello.rs
/// @@ -1,2 +1,3 @@
///  fn main() {
/// +    run();
///  }
/// ";
/// let entries = split_git_patch(patch).unwrap();
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].new_path, "hello.rs");
/// assert!(entries[0].diff_text.contains("+    run();"));
/// ```
pub fn split_git_patch(input: &str) -> Result<Vec<RawDiff>, DiffnoteError> {
    let mut entries: Vec<RawDiff> = Vec::new();
    let mut current: Option<PatchEntry> = None;
    let mut remaining: Option<Remaining> = None;

    for line in input.lines() {
        if let Some(rem) = remaining.as_mut() {
            if is_hunk_content(line) {
                if let Some(entry) = current.as_mut() {
                    entry.push_text(line);
                }
                rem.consume(line);
                if rem.is_done() {
                    remaining = None;
                }
                continue;
            }
            // Short hunk: the counts promised more lines than were present.
            remaining = None;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush_entry(&mut entries, current.take());
            current = Some(PatchEntry::from_git_line(rest));
            continue;
        }

        // Bare patches have no "diff --git" line; a file header after hunks starts the next file.
        if line.starts_with("--- ") && current.as_ref().map_or(true, |e| e.has_hunks) {
            flush_entry(&mut entries, current.take());
            current = Some(PatchEntry::default());
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if (line.starts_with("Binary files ") && line.ends_with(" differ"))
            || line == "GIT binary patch"
        {
            entry.binary = true;
            continue;
        }

        if line.starts_with("new file mode") {
            entry.raw.new_file = true;
            continue;
        }

        if line.starts_with("deleted file mode") {
            entry.raw.deleted = true;
            continue;
        }

        if let Some(path) = line.strip_prefix("rename from ") {
            entry.raw.renamed = true;
            entry.raw.old_path = unquote(path).to_string();
            continue;
        }

        if let Some(path) = line.strip_prefix("rename to ") {
            entry.raw.renamed = true;
            entry.raw.new_path = unquote(path).to_string();
            continue;
        }

        if let Some(path) = line.strip_prefix("--- ") {
            match parse_path(path) {
                Some(p) => entry.raw.old_path = p,
                None => entry.raw.new_file = true,
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("+++ ") {
            match parse_path(path) {
                Some(p) => entry.raw.new_path = p,
                None => entry.raw.deleted = true,
            }
            continue;
        }

        if line.starts_with("@@") {
            let header = parse_hunk_header(line).ok_or_else(|| DiffnoteError::DiffParse {
                path: entry.display_path().to_string(),
                header: line.to_string(),
            })?;
            entry.push_text(line);
            entry.has_hunks = true;
            let rem = Remaining {
                old: header.old_lines,
                new: header.new_lines,
            };
            if !rem.is_done() {
                remaining = Some(rem);
            }
        }

        // index, similarity and mode lines carry nothing we need
    }

    flush_entry(&mut entries, current.take());
    Ok(entries)
}

#[derive(Debug, Default)]
struct PatchEntry {
    raw: RawDiff,
    has_hunks: bool,
    binary: bool,
}

impl PatchEntry {
    fn from_git_line(rest: &str) -> Self {
        let mut entry = PatchEntry::default();
        if let Some((old, new)) = split_git_paths(rest) {
            entry.raw.old_path = old;
            entry.raw.new_path = new;
        }
        entry
    }

    fn push_text(&mut self, line: &str) {
        self.raw.diff_text.push_str(line);
        self.raw.diff_text.push('\n');
    }

    fn display_path(&self) -> &str {
        if !self.raw.new_path.is_empty() {
            &self.raw.new_path
        } else if !self.raw.old_path.is_empty() {
            &self.raw.old_path
        } else {
            "<unknown>"
        }
    }
}

fn flush_entry(entries: &mut Vec<RawDiff>, entry: Option<PatchEntry>) {
    let Some(entry) = entry else {
        return;
    };
    if entry.binary {
        return;
    }
    let mut raw = entry.raw;
    if raw.new_path.is_empty() && raw.old_path.is_empty() {
        return;
    }
    if raw.deleted || raw.new_path.is_empty() {
        raw.new_path = raw.old_path.clone();
    }
    if raw.old_path.is_empty() {
        raw.old_path = raw.new_path.clone();
    }
    entries.push(raw);
}

#[derive(Debug, Clone, Copy)]
struct Remaining {
    old: u32,
    new: u32,
}

impl Remaining {
    fn consume(&mut self, line: &str) {
        match line.as_bytes().first() {
            Some(b'-') => self.old = self.old.saturating_sub(1),
            Some(b'+') => self.new = self.new.saturating_sub(1),
            Some(b'\\') => {}
            // context, including context lines whose trailing space was stripped
            _ => {
                self.old = self.old.saturating_sub(1);
                self.new = self.new.saturating_sub(1);
            }
        }
    }

    fn is_done(&self) -> bool {
        self.old == 0 && self.new == 0
    }
}

fn is_hunk_content(line: &str) -> bool {
    matches!(
        line.as_bytes().first(),
        None | Some(b' ') | Some(b'+') | Some(b'-') | Some(b'\\')
    )
}

fn split_git_paths(rest: &str) -> Option<(String, String)> {
    if let Some((old, new)) = rest.rsplit_once(" \"b/") {
        return Some((parse_path(old)?, new.trim_end_matches('"').to_string()));
    }
    let (old, new) = rest.rsplit_once(" b/")?;
    Some((parse_path(old)?, new.to_string()))
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

/// Strip quoting, a trailing timestamp, and the `a/`/`b/` prefix. `/dev/null` yields `None`.
fn parse_path(raw: &str) -> Option<String> {
    let raw = raw.split('\t').next().unwrap_or(raw);
    let normalized = unquote(raw);

    if normalized == "/dev/null" {
        return None;
    }

    let stripped = normalized
        .strip_prefix("a/")
        .or_else(|| normalized.strip_prefix("b/"))
        .unwrap_or(normalized);

    Some(stripped.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_lines: u32,
    new_start: u32,
    new_lines: u32,
}

impl HunkHeader {
    /// New-file range; `None` for a non-empty hunk claiming to start at line 0.
    fn new_range(&self) -> Option<HunkRange> {
        match (self.new_start, self.new_lines) {
            // pure deletion: git writes the line before the hunk, which may be 0
            (start, 0) => Some(HunkRange::new(start.max(1), 0)),
            (0, _) => None,
            (start, count) => Some(HunkRange::new(start, count)),
        }
    }
}

/// Match `@@ -a[,b] +c[,d] @@[ anything]`, whitespace-separated.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = skip_whitespace(line.strip_prefix("@@")?)?;
    let (old, rest) = next_token(rest.strip_prefix('-')?)?;
    let (new, rest) = next_token(rest.strip_prefix('+')?)?;
    if !rest.starts_with("@@") {
        return None;
    }

    let (_, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new)?;

    Some(HunkHeader {
        old_lines,
        new_start,
        new_lines,
    })
}

/// Require and skip at least one whitespace character.
fn skip_whitespace(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    (trimmed.len() < s.len()).then_some(trimmed)
}

fn next_token(s: &str) -> Option<(&str, &str)> {
    let end = s.find(char::is_whitespace)?;
    let (token, rest) = s.split_at(end);
    Some((token, rest.trim_start()))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((parse_number(start)?, parse_number(count)?)),
        None => Some((parse_number(range)?, 1)),
    }
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
