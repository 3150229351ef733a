use std::future::Future;

use diffnote_core::{CommitState, ExistingAnnotation, RawDiff, StoreError};

/// Remote that holds a commit's diff, its comments and its build statuses.
///
/// Implemented by [`crate::gitlab::GitLabClient`] for real runs and by
/// [`crate::local::LocalStore`] for offline previews. Implementations do not
/// retry; every error is reported to the caller as-is.
pub trait CommitStore: Sync {
    /// Every annotation already present on the commit, inline and commit-level.
    fn fetch_existing_annotations(
        &self,
        project: &str,
        commit: &str,
    ) -> impl Future<Output = Result<Vec<ExistingAnnotation>, StoreError>> + Send;

    /// Create an annotation on `path`, at `line` in the new file or file-level when `None`.
    fn create_inline_annotation(
        &self,
        project: &str,
        commit: &str,
        path: &str,
        line: Option<u32>,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Create a commit-level annotation with no path or line.
    fn create_summary_annotation(
        &self,
        project: &str,
        commit: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Write the build status of the commit under context `name`.
    fn set_commit_status(
        &self,
        project: &str,
        commit: &str,
        state: CommitState,
        name: &str,
        description: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// The per-file diff entries of the commit against its parent.
    fn get_raw_diffs(
        &self,
        project: &str,
        commit: &str,
    ) -> impl Future<Output = Result<Vec<RawDiff>, StoreError>> + Send;
}
