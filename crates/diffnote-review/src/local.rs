use std::fmt;
use std::path::Path;

use diffnote_core::{CommitState, DiffnoteError, ExistingAnnotation, RawDiff, StoreError};
use diffnote_difflens::parser::split_git_patch;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::store::CommitStore;

/// A write a [`LocalStore`] recorded instead of sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RecordedWrite {
    /// Inline annotation.
    Inline {
        /// Repository-relative path.
        path: String,
        /// New-file line, `None` for file-level.
        line: Option<u32>,
        /// Annotation body.
        text: String,
    },
    /// Commit-level summary annotation.
    Summary {
        /// Annotation body.
        text: String,
    },
    /// Commit status.
    Status {
        /// State written.
        state: CommitState,
        /// Status context name.
        name: String,
        /// Status description.
        description: String,
    },
}

impl fmt::Display for RecordedWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedWrite::Inline {
                path,
                line: Some(line),
                text,
            } => write!(f, "comment {path}:{line}: {text}"),
            RecordedWrite::Inline {
                path,
                line: None,
                text,
            } => write!(f, "comment {path}: {text}"),
            RecordedWrite::Summary { text } => write!(f, "summary:\n{text}"),
            RecordedWrite::Status {
                state,
                name,
                description,
            } => write!(f, "status {name} = {state}: {description}"),
        }
    }
}

/// Offline [`CommitStore`] backed by a patch file.
///
/// The diff comes from the patch; existing annotations are whatever was
/// seeded with [`LocalStore::with_existing`]; writes are recorded in order.
///
/// # Examples
///
/// ```
/// use diffnote_review::local::LocalStore;
///
/// let store = LocalStore::from_patch("--- a/a.rs\n+++ b/a.rs\n@@ -1 +1,2 @@\n a\n+b\n").unwrap();
/// assert_eq!(store.diffs().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LocalStore {
    diffs: Vec<RawDiff>,
    existing: Vec<ExistingAnnotation>,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl LocalStore {
    /// Build a store from patch text.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::DiffParse`] if a hunk header is malformed.
    pub fn from_patch(patch: &str) -> Result<Self, DiffnoteError> {
        Ok(Self {
            diffs: split_git_patch(patch)?,
            ..Self::default()
        })
    }

    /// Build a store from a patch file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::FileNotFound`] if `path` does not exist,
    /// [`DiffnoteError::Io`] if it cannot be read, or a parse error.
    pub fn from_file(path: &Path) -> Result<Self, DiffnoteError> {
        if !path.exists() {
            return Err(DiffnoteError::FileNotFound(path.to_path_buf()));
        }
        let patch = std::fs::read_to_string(path)?;
        Self::from_patch(&patch)
    }

    /// Seed annotations that count as already posted.
    pub fn with_existing(mut self, existing: Vec<ExistingAnnotation>) -> Self {
        self.existing = existing;
        self
    }

    /// Diff entries parsed from the patch.
    pub fn diffs(&self) -> &[RawDiff] {
        &self.diffs
    }

    /// Consume the store and return every recorded write, in call order.
    pub fn into_writes(self) -> Vec<RecordedWrite> {
        self.writes.into_inner()
    }

    async fn record(&self, write: RecordedWrite) {
        info!(write = %write, "recorded (not sent)");
        self.writes.lock().await.push(write);
    }
}

impl CommitStore for LocalStore {
    async fn fetch_existing_annotations(
        &self,
        _project: &str,
        _commit: &str,
    ) -> Result<Vec<ExistingAnnotation>, StoreError> {
        Ok(self.existing.clone())
    }

    async fn create_inline_annotation(
        &self,
        _project: &str,
        _commit: &str,
        path: &str,
        line: Option<u32>,
        text: &str,
    ) -> Result<(), StoreError> {
        self.record(RecordedWrite::Inline {
            path: path.to_string(),
            line,
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn create_summary_annotation(
        &self,
        _project: &str,
        _commit: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        self.record(RecordedWrite::Summary {
            text: text.to_string(),
        })
        .await;
        Ok(())
    }

    async fn set_commit_status(
        &self,
        _project: &str,
        _commit: &str,
        state: CommitState,
        name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.record(RecordedWrite::Status {
            state,
            name: name.to_string(),
            description: description.to_string(),
        })
        .await;
        Ok(())
    }

    async fn get_raw_diffs(&self, _project: &str, _commit: &str) -> Result<Vec<RawDiff>, StoreError> {
        Ok(self.diffs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_writes_in_order() {
        let store = LocalStore::default();
        store
            .create_inline_annotation("p", "c", "a.rs", Some(3), "first")
            .await
            .unwrap();
        store.create_summary_annotation("p", "c", "sum").await.unwrap();
        store
            .set_commit_status("p", "c", CommitState::Success, "lint", "ok")
            .await
            .unwrap();

        let writes = store.into_writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].to_string(), "comment a.rs:3: first");
        assert_eq!(writes[2].to_string(), "status lint = success: ok");
    }

    #[tokio::test]
    async fn seeded_annotations_are_returned() {
        let store = LocalStore::default().with_existing(vec![ExistingAnnotation {
            path: None,
            line: None,
            text: "old summary".into(),
        }]);
        let existing = store.fetch_existing_annotations("p", "c").await.unwrap();
        assert_eq!(existing.len(), 1);
    }

    #[test]
    fn missing_patch_file_is_reported() {
        let err = LocalStore::from_file(Path::new("/definitely/not/here.patch")).unwrap_err();
        assert!(matches!(err, DiffnoteError::FileNotFound(_)));
    }

    #[test]
    fn recorded_write_serializes_with_kind_tag() {
        let json = serde_json::to_value(RecordedWrite::Summary { text: "x".into() }).unwrap();
        assert_eq!(json["kind"], "summary");
    }
}
