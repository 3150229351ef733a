use std::path::PathBuf;

/// Errors that can occur across the diffnote workspace.
///
/// Integrity failures (parsing, ambiguity, fetching the baseline) abort the
/// whole run. Individual annotation posts are accumulated by the publisher
/// and surface once, as [`DiffnoteError::PublishFailure`]. Library crates use
/// this type directly; the binary converts to `miette` reports at the boundary.
///
/// # Examples
///
/// ```
/// use diffnote_core::DiffnoteError;
///
/// let err = DiffnoteError::Config("missing token".into());
/// assert!(err.to_string().contains("missing token"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum DiffnoteError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A hunk header did not match the unified diff grammar.
    #[error("malformed hunk header in {path}: {header}")]
    DiffParse {
        /// New-file path of the diff entry being parsed.
        path: String,
        /// The offending header line.
        header: String,
    },

    /// A finding path is a suffix match for more than one diff entry.
    #[error(
        "finding path {finding_path} matches more than one diff entry: {}",
        .candidates.join(", ")
    )]
    AmbiguousPath {
        /// Normalized (forward-slash) path of the finding.
        finding_path: String,
        /// Every diff path that matched.
        candidates: Vec<String>,
    },

    /// Reading from the remote store failed, so there is nothing safe to scope or dedup against.
    #[error("failed to fetch {what} for commit {commit}")]
    Fetch {
        /// What was being fetched (`"commit diff"`, `"existing annotations"`).
        what: &'static str,
        /// Commit the request targeted.
        commit: String,
        /// Underlying transport failure.
        #[source]
        source: StoreError,
    },

    /// One or more annotation posts failed. Annotations that did post remain.
    #[error("{}", publish_failure_message(.inline_failures, .summary_failed))]
    PublishFailure {
        /// Inline annotations that could not be created.
        inline_failures: usize,
        /// Whether the summary annotation failed.
        summary_failed: bool,
    },

    /// Writing the gate status failed.
    #[error("failed to set commit status on {commit}")]
    Status {
        /// Commit the status targeted.
        commit: String,
        /// Underlying transport failure.
        #[source]
        source: StoreError,
    },

    /// A required field was blank when building a report.
    #[error("{field} is required: {reason}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
        /// Why the field is needed.
        reason: &'static str,
    },
}

impl DiffnoteError {
    /// Total number of failed calls carried by a [`DiffnoteError::PublishFailure`].
    ///
    /// Returns `0` for every other variant.
    pub fn failure_count(&self) -> usize {
        match self {
            DiffnoteError::PublishFailure {
                inline_failures,
                summary_failed,
            } => inline_failures + usize::from(*summary_failed),
            _ => 0,
        }
    }
}

fn publish_failure_message(inline_failures: &usize, summary_failed: &bool) -> String {
    let (inline_failures, summary_failed) = (*inline_failures, *summary_failed);
    let total = inline_failures + usize::from(summary_failed);
    let mut msg = format!("{total} annotation call(s) failed");
    if inline_failures > 0 {
        msg.push_str(&format!("; {inline_failures} inline comment(s) failed"));
    }
    if summary_failed {
        msg.push_str("; summary comment failed");
    }
    msg
}

/// Failure reported by a commit store (the remote that holds diffs, comments and statuses).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// The remote answered with a non-success status.
    #[error("remote returned {status}: {body}")]
    Rejected {
        /// HTTP-like status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),
}
