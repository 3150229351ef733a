//! Scope findings to the lines a commit changed.

use diffnote_core::{DiffnoteError, Finding};
use serde::Serialize;
use tracing::debug;

use crate::parser::FileDiff;

/// A finding confirmed to fall within the commit's diff.
///
/// `diff_path` is the repository-relative path of the matched diff entry, so
/// downstream stages never see host-specific separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedIssue {
    /// The original finding.
    pub finding: Finding,
    /// Path of the matched [`FileDiff`].
    pub diff_path: String,
    /// Line to annotate, `None` for file-level findings.
    pub resolved_line: Option<u32>,
}

/// Maps findings onto the [`FileDiff`]s of one commit.
///
/// # Examples
///
/// ```
/// use diffnote_core::{Finding, Severity};
/// use diffnote_difflens::hunk::HunkRange;
/// use diffnote_difflens::matcher::IssueDiffMatcher;
/// use diffnote_difflens::parser::FileDiff;
///
/// let diffs = vec![FileDiff { path: "src/Main.go".into(), ranges: vec![HunkRange::new(1, 5)] }];
/// let matcher = IssueDiffMatcher::new(&diffs);
/// let finding = Finding {
///     message: "M1".into(),
///     severity: Severity::Major,
///     file_path: "/repo/src/Main.go".into(),
///     line: Some(2),
/// };
/// let issue = matcher.map(&finding).unwrap().unwrap();
/// assert_eq!(issue.diff_path, "src/Main.go");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IssueDiffMatcher<'a> {
    diffs: &'a [FileDiff],
}

impl<'a> IssueDiffMatcher<'a> {
    /// Create a matcher over the diffs of one commit.
    pub fn new(diffs: &'a [FileDiff]) -> Self {
        Self { diffs }
    }

    /// Map one finding.
    ///
    /// Returns `Ok(None)` when the finding's file is not in the diff, or the
    /// finding lies outside every changed range.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::AmbiguousPath`] when more than one diff path
    /// is a suffix of the finding path.
    pub fn map(&self, finding: &Finding) -> Result<Option<MappedIssue>, DiffnoteError> {
        let normalized = normalize_path(&finding.file_path);

        let candidates: Vec<&FileDiff> = self
            .diffs
            .iter()
            .filter(|d| is_path_suffix(&normalized, &d.path))
            .collect();

        let diff = match candidates.as_slice() {
            [] => {
                debug!(path = %normalized, "finding is not part of the commit diff, dropping");
                return Ok(None);
            }
            [single] => *single,
            many => {
                return Err(DiffnoteError::AmbiguousPath {
                    finding_path: normalized,
                    candidates: many.iter().map(|d| d.path.clone()).collect(),
                });
            }
        };

        let in_scope = match finding.line {
            Some(line) => diff.contains_line(line),
            None => diff.has_changes(),
        };

        if !in_scope {
            debug!(
                path = %diff.path,
                line = ?finding.line,
                "finding is outside the changed lines, dropping"
            );
            return Ok(None);
        }

        Ok(Some(MappedIssue {
            finding: finding.clone(),
            diff_path: diff.path.clone(),
            resolved_line: finding.line,
        }))
    }

    /// Map every finding, keeping input order and dropping out-of-scope ones.
    ///
    /// # Errors
    ///
    /// Fails on the first ambiguous finding.
    pub fn map_all(&self, findings: &[Finding]) -> Result<Vec<MappedIssue>, DiffnoteError> {
        let mut mapped = Vec::new();
        for finding in findings {
            if let Some(issue) = self.map(finding)? {
                mapped.push(issue);
            }
        }
        debug!(
            received = findings.len(),
            mapped = mapped.len(),
            "mapped findings onto diff"
        );
        Ok(mapped)
    }
}

/// Convert host separators to `/`.
///
/// # Examples
///
/// ```
/// use diffnote_difflens::matcher::normalize_path;
///
/// assert_eq!(normalize_path(r"C:\repo\src\Main.go"), "C:/repo/src/Main.go");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// `true` when `suffix` equals `path` or ends it on a component boundary.
fn is_path_suffix(path: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    match path.strip_suffix(suffix) {
        Some("") => true,
        Some(head) => head.ends_with('/'),
        None => false,
    }
}
