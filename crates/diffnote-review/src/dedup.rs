use std::collections::HashSet;

use diffnote_core::ExistingAnnotation;
use diffnote_difflens::matcher::MappedIssue;

/// Filters issues that already carry an identical annotation on the commit.
///
/// Two annotations are identical when path, line representation and text
/// all match exactly. Commit-level annotations (no path) match the summary,
/// and also file-level issues with the same text: GitLab drops the path of
/// a note that has no line, so a posted file-level issue comes back without one.
///
/// # Examples
///
/// ```
/// use diffnote_core::ExistingAnnotation;
/// use diffnote_review::dedup::CommentDeduplicator;
///
/// let existing = vec![ExistingAnnotation { path: None, line: None, text: "summary".into() }];
/// let dedup = CommentDeduplicator::new(&existing);
/// assert!(dedup.has_summary("summary"));
/// assert!(!dedup.has_summary("other summary"));
/// ```
#[derive(Debug, Default)]
pub struct CommentDeduplicator<'a> {
    inline: HashSet<(&'a str, Option<&'a str>, &'a str)>,
    summaries: HashSet<&'a str>,
}

impl<'a> CommentDeduplicator<'a> {
    /// Index the annotations already on the commit.
    pub fn new(existing: &'a [ExistingAnnotation]) -> Self {
        let mut dedup = Self::default();
        for annotation in existing {
            match annotation.path.as_deref() {
                Some(path) => {
                    dedup.inline.insert((
                        path,
                        annotation.line.as_deref(),
                        annotation.text.as_str(),
                    ));
                }
                None => {
                    dedup.summaries.insert(annotation.text.as_str());
                }
            }
        }
        dedup
    }

    /// `true` when an identical annotation for `issue` exists.
    pub fn is_duplicate(&self, issue: &MappedIssue) -> bool {
        let text = issue.finding.message.as_str();
        if issue.resolved_line.is_none() && self.summaries.contains(text) {
            return true;
        }
        let line = issue.resolved_line.map(|l| l.to_string());
        self.inline.contains(&(
            issue.diff_path.as_str(),
            line.as_deref(),
            issue.finding.message.as_str(),
        ))
    }

    /// `true` when a commit-level annotation with exactly `text` exists.
    pub fn has_summary(&self, text: &str) -> bool {
        self.summaries.contains(text)
    }

    /// Drop duplicates, keeping order. Returns the kept issues and the number removed.
    pub fn filter(&self, issues: Vec<MappedIssue>) -> (Vec<MappedIssue>, usize) {
        let before = issues.len();
        let kept: Vec<MappedIssue> = issues
            .into_iter()
            .filter(|issue| !self.is_duplicate(issue))
            .collect();
        let removed = before - kept.len();
        (kept, removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffnote_core::{Finding, Severity};

    fn issue(path: &str, line: Option<u32>, text: &str) -> MappedIssue {
        MappedIssue {
            finding: Finding {
                message: text.into(),
                severity: Severity::Major,
                file_path: format!("/r/{path}"),
                line,
            },
            diff_path: path.into(),
            resolved_line: line,
        }
    }

    fn existing(path: Option<&str>, line: Option<&str>, text: &str) -> ExistingAnnotation {
        ExistingAnnotation {
            path: path.map(String::from),
            line: line.map(String::from),
            text: text.into(),
        }
    }

    #[test]
    fn identical_annotation_is_removed() {
        let existing = vec![existing(Some("a.go"), Some("12"), "X")];
        let dedup = CommentDeduplicator::new(&existing);
        let (kept, removed) = dedup.filter(vec![issue("a.go", Some(12), "X")]);
        assert!(kept.is_empty());
        assert_eq!(removed, 1);
    }

    #[test]
    fn any_field_change_keeps_the_issue() {
        let existing = vec![existing(Some("a.go"), Some("12"), "X")];
        let dedup = CommentDeduplicator::new(&existing);
        assert!(!dedup.is_duplicate(&issue("b.go", Some(12), "X")));
        assert!(!dedup.is_duplicate(&issue("a.go", Some(13), "X")));
        assert!(!dedup.is_duplicate(&issue("a.go", Some(12), "Y")));
        assert!(!dedup.is_duplicate(&issue("a.go", Some(12), "x")));
    }

    #[test]
    fn file_level_and_line_level_never_match() {
        let existing = vec![
            existing(Some("a.go"), None, "X"),
            existing(Some("b.go"), Some("3"), "Y"),
        ];
        let dedup = CommentDeduplicator::new(&existing);
        assert!(!dedup.is_duplicate(&issue("a.go", Some(1), "X")));
        assert!(!dedup.is_duplicate(&issue("b.go", None, "Y")));
        assert!(dedup.is_duplicate(&issue("a.go", None, "X")));
    }

    #[test]
    fn commit_level_note_never_matches_line_level_issue() {
        let existing = vec![existing(None, None, "X")];
        let dedup = CommentDeduplicator::new(&existing);
        assert!(!dedup.is_duplicate(&issue("a.go", Some(4), "X")));
        assert!(dedup.has_summary("X"));
    }

    #[test]
    fn pathless_note_matches_file_level_issue() {
        let existing = vec![existing(None, None, "FL")];
        let dedup = CommentDeduplicator::new(&existing);
        assert!(dedup.is_duplicate(&issue("a.go", None, "FL")));
        assert!(!dedup.is_duplicate(&issue("a.go", None, "other")));
    }

    #[test]
    fn filter_keeps_order() {
        let existing = vec![existing(Some("a.go"), Some("2"), "dup")];
        let dedup = CommentDeduplicator::new(&existing);
        let (kept, removed) = dedup.filter(vec![
            issue("a.go", Some(1), "first"),
            issue("a.go", Some(2), "dup"),
            issue("a.go", Some(3), "last"),
        ]);
        assert_eq!(removed, 1);
        let texts: Vec<_> = kept.iter().map(|i| i.finding.message.as_str()).collect();
        assert_eq!(texts, vec!["first", "last"]);
    }
}
