use std::fmt;

use diffnote_core::{CommitState, DiffnoteError, Severity};
use serde::Serialize;
use tracing::info;

use crate::severity::SeverityCounts;
use crate::store::CommitStore;

/// Pass/fail verdict for one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    /// Status state to write.
    pub state: CommitState,
    /// Human-readable reason.
    pub description: String,
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.state, self.description)
    }
}

/// Decides the build status from severity counts.
///
/// # Examples
///
/// ```
/// use diffnote_core::{CommitState, Severity};
/// use diffnote_review::gate::BuildGate;
/// use diffnote_review::severity::SeverityCounts;
///
/// let gate = BuildGate::new(Severity::Critical, "SonarQube");
/// let decision = gate.evaluate(&SeverityCounts::from_severities([Severity::Info, Severity::Major]));
/// assert_eq!(decision.state, CommitState::Success);
/// assert_eq!(decision.description, "No critical (or worse) issues found.");
/// ```
#[derive(Debug, Clone)]
pub struct BuildGate {
    threshold: Severity,
    status_name: String,
}

impl BuildGate {
    /// Gate failing on `threshold` or worse, reported under context `status_name`.
    pub fn new(threshold: Severity, status_name: impl Into<String>) -> Self {
        Self {
            threshold,
            status_name: status_name.into(),
        }
    }

    /// Lowest failing severity.
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Pure verdict over the counts.
    pub fn evaluate(&self, counts: &SeverityCounts) -> GateDecision {
        let threshold = self.threshold;
        if counts.is_blocking(threshold) {
            GateDecision {
                state: CommitState::Failed,
                description: format!("A {threshold} or worse issue has been found."),
            }
        } else {
            GateDecision {
                state: CommitState::Success,
                description: format!("No {threshold} (or worse) issues found."),
            }
        }
    }

    /// Write `decision` as the commit status.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Status`] if the store rejects the write.
    pub async fn publish<S: CommitStore>(
        &self,
        store: &S,
        project: &str,
        commit: &str,
        decision: &GateDecision,
    ) -> Result<(), DiffnoteError> {
        store
            .set_commit_status(
                project,
                commit,
                decision.state,
                &self.status_name,
                &decision.description,
            )
            .await
            .map_err(|source| DiffnoteError::Status {
                commit: commit.to_string(),
                source,
            })?;

        info!(
            state = %decision.state,
            name = %self.status_name,
            "commit status reported"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_threshold_passes_on_major() {
        let gate = BuildGate::new(Severity::Critical, "SonarQube");
        let decision =
            gate.evaluate(&SeverityCounts::from_severities([Severity::Info, Severity::Major]));
        assert_eq!(decision.state, CommitState::Success);
    }

    #[test]
    fn critical_threshold_fails_on_critical() {
        let gate = BuildGate::new(Severity::Critical, "SonarQube");
        let decision =
            gate.evaluate(&SeverityCounts::from_severities([Severity::Info, Severity::Critical]));
        assert_eq!(decision.state, CommitState::Failed);
        assert_eq!(decision.description, "A critical or worse issue has been found.");
    }

    #[test]
    fn no_issues_passes() {
        let gate = BuildGate::new(Severity::Info, "lint");
        let decision = gate.evaluate(&SeverityCounts::default());
        assert_eq!(decision.state, CommitState::Success);
        assert_eq!(decision.description, "No info (or worse) issues found.");
    }

    #[test]
    fn decision_display() {
        let decision = GateDecision {
            state: CommitState::Failed,
            description: "A blocker or worse issue has been found.".into(),
        };
        assert_eq!(
            decision.to_string(),
            "failed: A blocker or worse issue has been found."
        );
    }
}
