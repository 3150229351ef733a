use diffnote_core::DiffnoteError;
use diffnote_difflens::matcher::MappedIssue;

use crate::severity::{sort_ascending, SeverityCounts};

/// The issues of one commit, ready to publish.
///
/// Issues are kept least severe first. Construct with [`CommitReport::new`].
///
/// # Examples
///
/// ```
/// use diffnote_review::report::CommitReport;
///
/// let report = CommitReport::new("group/app", "a2b4", vec![]).unwrap();
/// assert_eq!(report.commit(), "a2b4");
/// assert!(CommitReport::new("group/app", " ", vec![]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CommitReport {
    project: String,
    commit: String,
    issues: Vec<MappedIssue>,
}

impl CommitReport {
    /// Validate identifiers and sort `issues` ascending by severity.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::MissingField`] when `commit` or `project` is blank.
    pub fn new(
        project: impl Into<String>,
        commit: impl Into<String>,
        mut issues: Vec<MappedIssue>,
    ) -> Result<Self, DiffnoteError> {
        let project = project.into();
        let commit = commit.into();

        if commit.trim().is_empty() {
            return Err(DiffnoteError::MissingField {
                field: "commit",
                reason: "a commit hash is needed to know which commit to annotate",
            });
        }
        if project.trim().is_empty() {
            return Err(DiffnoteError::MissingField {
                field: "project",
                reason: "a project is needed to know where the commit lives",
            });
        }

        sort_ascending(&mut issues);
        Ok(Self {
            project,
            commit,
            issues,
        })
    }

    /// Replace the issues, keeping the validated identifiers.
    pub fn with_issues(mut self, mut issues: Vec<MappedIssue>) -> Self {
        sort_ascending(&mut issues);
        self.issues = issues;
        self
    }

    /// Project identifier.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Commit identifier.
    pub fn commit(&self) -> &str {
        &self.commit
    }

    /// Issues, least severe first.
    pub fn issues(&self) -> &[MappedIssue] {
        &self.issues
    }

    /// Per-level counts of the issues.
    pub fn counts(&self) -> SeverityCounts {
        SeverityCounts::from_issues(&self.issues)
    }
}
