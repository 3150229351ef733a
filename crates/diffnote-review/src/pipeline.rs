use std::fmt;
use std::time::Instant;

use diffnote_core::{DiffnoteError, Finding, ReviewConfig};
use diffnote_difflens::matcher::{IssueDiffMatcher, MappedIssue};
use diffnote_difflens::parser::parse_commit_diffs;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};

use crate::gate::{BuildGate, GateDecision};
use crate::publisher::{AnnotationPublisher, PublishStats};
use crate::report::CommitReport;
use crate::store::CommitStore;

/// Result of a completed annotation run.
///
/// # Examples
///
/// ```
/// use diffnote_review::pipeline::AnnotateOutcome;
///
/// let outcome = AnnotateOutcome::default();
/// assert!(outcome.issues.is_empty());
/// assert!(outcome.gate.is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateOutcome {
    /// Non-deleted files in the commit diff.
    pub files_in_diff: usize,
    /// Findings handed to the run.
    pub findings_received: usize,
    /// Findings that fell within the diff, least severe first.
    pub issues: Vec<MappedIssue>,
    /// Counts from the publish pass.
    pub published: PublishStats,
    /// Status written by the gate, if enabled.
    pub gate: Option<GateDecision>,
}

/// Annotate one commit with `findings` and report the gate status.
///
/// Fetches the commit diff, keeps the findings that fall on changed lines,
/// posts them (skipping ones already present) plus a summary, and writes
/// the pass/fail status. The gate covers every in-diff finding, including
/// already-posted ones, and is reported even when some posts failed.
///
/// # Errors
///
/// - [`DiffnoteError::MissingField`] for a blank project or commit
/// - [`DiffnoteError::Fetch`] when the diff or the existing annotations cannot be read
/// - [`DiffnoteError::DiffParse`] / [`DiffnoteError::AmbiguousPath`] from matching
/// - [`DiffnoteError::Status`] when the status write fails
/// - [`DiffnoteError::PublishFailure`] when any annotation could not be created
pub async fn annotate<S: CommitStore>(
    store: &S,
    findings: &[Finding],
    project: &str,
    commit: &str,
    config: &ReviewConfig,
) -> Result<AnnotateOutcome, DiffnoteError> {
    let span = info_span!("annotate", project, commit);
    run(store, findings, project, commit, config)
        .instrument(span)
        .await
}

async fn run<S: CommitStore>(
    store: &S,
    findings: &[Finding],
    project: &str,
    commit: &str,
    config: &ReviewConfig,
) -> Result<AnnotateOutcome, DiffnoteError> {
    let start = Instant::now();
    let report = CommitReport::new(project, commit, Vec::new())?;

    let raw = store
        .get_raw_diffs(project, commit)
        .await
        .map_err(|source| DiffnoteError::Fetch {
            what: "commit diff",
            commit: commit.to_string(),
            source,
        })?;
    let diffs = parse_commit_diffs(&raw)?;
    let mapped = IssueDiffMatcher::new(&diffs).map_all(findings)?;
    info!(
        files = diffs.len(),
        received = findings.len(),
        mapped = mapped.len(),
        "findings scoped to diff"
    );

    let report = report.with_issues(mapped);
    let gate = config
        .gate_enabled
        .then(|| BuildGate::new(config.gate_threshold, config.status_name.clone()));
    let decision = gate.as_ref().map(|g| g.evaluate(&report.counts()));

    let published = AnnotationPublisher::new(store, config)
        .publish(&report)
        .await?;

    if let (Some(gate), Some(decision)) = (&gate, &decision) {
        if let Err(e) = gate.publish(store, project, commit, decision).await {
            if let Err(publish_err) = published.finalize() {
                warn!(error = %publish_err, "annotation publishing also failed");
            }
            return Err(e);
        }
    }

    published.finalize()?;

    info!(
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        posted = published.inline_posted,
        "commit annotated"
    );

    Ok(AnnotateOutcome {
        files_in_diff: diffs.len(),
        findings_received: findings.len(),
        issues: report.issues().to_vec(),
        published,
        gate: decision,
    })
}

impl fmt::Display for AnnotateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Annotation Results")?;
        writeln!(f, "==================")?;
        writeln!(
            f,
            "Files: {} | Findings: {} | In diff: {} | Posted: {} | Duplicates: {} | Summary: {}\n",
            self.files_in_diff,
            self.findings_received,
            self.issues.len(),
            self.published.inline_posted,
            self.published.duplicates_skipped,
            if self.published.summary_posted { "posted" } else { "not posted" },
        )?;

        if self.issues.is_empty() {
            writeln!(f, "No findings on changed lines.")?;
        } else {
            for issue in self.issues.iter().rev() {
                let label = issue.finding.severity.to_string().to_uppercase();
                match issue.resolved_line {
                    Some(line) => writeln!(f, "[{label}] {}:{line}", issue.diff_path)?,
                    None => writeln!(f, "[{label}] {}", issue.diff_path)?,
                }
                writeln!(f, "  {}", issue.finding.message)?;
            }
        }

        if let Some(gate) = &self.gate {
            writeln!(f, "\nGate: {gate}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diffnote_core::{CommitState, Severity};

    fn outcome() -> AnnotateOutcome {
        AnnotateOutcome {
            files_in_diff: 2,
            findings_received: 3,
            issues: vec![
                MappedIssue {
                    finding: Finding {
                        message: "Rename this".into(),
                        severity: Severity::Minor,
                        file_path: "/r/src/a.go".into(),
                        line: None,
                    },
                    diff_path: "src/a.go".into(),
                    resolved_line: None,
                },
                MappedIssue {
                    finding: Finding {
                        message: "Null dereference".into(),
                        severity: Severity::Critical,
                        file_path: "/r/src/b.go".into(),
                        line: Some(7),
                    },
                    diff_path: "src/b.go".into(),
                    resolved_line: Some(7),
                },
            ],
            published: PublishStats {
                inline_posted: 2,
                summary_posted: true,
                ..PublishStats::default()
            },
            gate: Some(GateDecision {
                state: CommitState::Failed,
                description: "A critical or worse issue has been found.".into(),
            }),
        }
    }

    #[test]
    fn display_lists_most_severe_first() {
        let text = outcome().to_string();
        let critical = text.find("[CRITICAL] src/b.go:7").unwrap();
        let minor = text.find("[MINOR] src/a.go").unwrap();
        assert!(critical < minor);
        assert!(text.contains("Gate: failed"));
    }

    #[test]
    fn json_uses_camel_case() {
        let json = serde_json::to_value(outcome()).unwrap();
        assert_eq!(json["filesInDiff"], 2);
        assert_eq!(json["published"]["inlinePosted"], 2);
        assert_eq!(json["issues"][1]["diffPath"], "src/b.go");
        assert_eq!(json["gate"]["state"], "failed");
    }
}
