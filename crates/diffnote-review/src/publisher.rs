use diffnote_core::{DiffnoteError, ReviewConfig};
use diffnote_difflens::matcher::MappedIssue;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dedup::CommentDeduplicator;
use crate::markdown::summary_text;
use crate::report::CommitReport;
use crate::severity::SeverityCounts;
use crate::store::CommitStore;

/// Accounting of one publish pass.
///
/// # Examples
///
/// ```
/// use diffnote_review::publisher::PublishStats;
///
/// let stats = PublishStats { inline_failed: 2, ..PublishStats::default() };
/// assert!(stats.has_failures());
/// assert!(stats.finalize().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStats {
    /// Issues skipped because an identical annotation already exists.
    pub duplicates_skipped: usize,
    /// Inline annotations created.
    pub inline_posted: usize,
    /// Inline annotations the store rejected.
    pub inline_failed: usize,
    /// The summary annotation was created.
    pub summary_posted: bool,
    /// The summary annotation was rejected.
    pub summary_failed: bool,
}

impl PublishStats {
    /// `true` when any create call failed.
    pub fn has_failures(&self) -> bool {
        self.inline_failed > 0 || self.summary_failed
    }

    /// Turn recorded failures into an error.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::PublishFailure`] if any create call failed.
    pub fn finalize(&self) -> Result<(), DiffnoteError> {
        if self.has_failures() {
            return Err(DiffnoteError::PublishFailure {
                inline_failures: self.inline_failed,
                summary_failed: self.summary_failed,
            });
        }
        Ok(())
    }
}

/// Posts a [`CommitReport`] onto its commit.
///
/// Existing annotations are fetched once, duplicates are removed, then one
/// inline annotation per issue is created (least severe first), followed by
/// a single summary annotation. Failed create calls are counted and the loop
/// continues; nothing is rolled back.
pub struct AnnotationPublisher<'s, S> {
    store: &'s S,
    summary_enabled: bool,
    analyzer_name: String,
    max_concurrent_posts: usize,
}

impl<'s, S: CommitStore> AnnotationPublisher<'s, S> {
    /// Create a publisher writing through `store`.
    pub fn new(store: &'s S, config: &ReviewConfig) -> Self {
        Self {
            store,
            summary_enabled: config.summary_enabled,
            analyzer_name: config.analyzer_name.clone(),
            max_concurrent_posts: config.max_concurrent_posts.max(1),
        }
    }

    /// Fetch, filter and post. Per-call failures are recorded in the stats.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Fetch`] if existing annotations cannot be read;
    /// nothing is posted in that case.
    pub async fn publish(&self, report: &CommitReport) -> Result<PublishStats, DiffnoteError> {
        let (project, commit) = (report.project(), report.commit());

        let existing = self
            .store
            .fetch_existing_annotations(project, commit)
            .await
            .map_err(|source| DiffnoteError::Fetch {
                what: "existing annotations",
                commit: commit.to_string(),
                source,
            })?;
        debug!(existing = existing.len(), "fetched existing annotations");

        let dedup = CommentDeduplicator::new(&existing);
        let (issues, duplicates_skipped) = dedup.filter(report.issues().to_vec());

        let mut stats = PublishStats {
            duplicates_skipped,
            ..PublishStats::default()
        };

        let outcomes = self.post_inline(project, commit, &issues).await;
        stats.inline_posted = outcomes.iter().filter(|&&ok| ok).count();
        stats.inline_failed = outcomes.len() - stats.inline_posted;

        if self.summary_enabled {
            let text = summary_text(&self.analyzer_name, &SeverityCounts::from_issues(&issues));
            if dedup.has_summary(&text) {
                debug!("identical summary already present, skipping");
            } else {
                match self
                    .store
                    .create_summary_annotation(project, commit, &text)
                    .await
                {
                    Ok(()) => stats.summary_posted = true,
                    Err(e) => {
                        warn!(error = %e, "failed to create summary annotation");
                        stats.summary_failed = true;
                    }
                }
            }
        }

        info!(
            posted = stats.inline_posted,
            failed = stats.inline_failed,
            duplicates = stats.duplicates_skipped,
            summary = stats.summary_posted,
            "annotations published"
        );
        Ok(stats)
    }

    /// One create call per issue, at most `max_concurrent_posts` in flight, results in input order.
    async fn post_inline(&self, project: &str, commit: &str, issues: &[MappedIssue]) -> Vec<bool> {
        let store = self.store;
        stream::iter(issues)
            .map(|issue| async move {
                let result = store
                    .create_inline_annotation(
                        project,
                        commit,
                        &issue.diff_path,
                        issue.resolved_line,
                        &issue.finding.message,
                    )
                    .await;
                match result {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            path = %issue.diff_path,
                            line = ?issue.resolved_line,
                            error = %e,
                            "failed to create inline annotation"
                        );
                        false
                    }
                }
            })
            .buffered(self.max_concurrent_posts)
            .collect::<Vec<bool>>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_reports_both_kinds() {
        let stats = PublishStats {
            inline_failed: 1,
            summary_failed: true,
            ..PublishStats::default()
        };
        let err = stats.finalize().unwrap_err();
        assert_eq!(err.failure_count(), 2);
    }

    #[test]
    fn clean_stats_finalize_ok() {
        let stats = PublishStats {
            inline_posted: 3,
            summary_posted: true,
            ..PublishStats::default()
        };
        assert!(!stats.has_failures());
        assert!(stats.finalize().is_ok());
    }
}
