use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Severity reported by the analysis engine, ordered from least to most severe.
///
/// Ordering follows the rank table in [`Severity::rank`].
///
/// # Examples
///
/// ```
/// use diffnote_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"critical\"").unwrap();
/// assert_eq!(s, Severity::Critical);
/// assert!(Severity::Blocker > Severity::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational observation.
    Info,
    /// Minor style or maintainability issue.
    Minor,
    /// Issue worth fixing in the normal course of work.
    Major,
    /// Likely defect that should block a release.
    Critical,
    /// Defect that must be fixed immediately.
    Blocker,
}

impl Severity {
    /// Every severity, least severe first.
    pub const ASCENDING: [Severity; 5] = [
        Severity::Info,
        Severity::Minor,
        Severity::Major,
        Severity::Critical,
        Severity::Blocker,
    ];

    /// Returns `true` if `self` is at least as severe as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffnote_core::Severity;
    ///
    /// assert!(Severity::Blocker.meets_threshold(Severity::Critical));
    /// assert!(Severity::Critical.meets_threshold(Severity::Critical));
    /// assert!(!Severity::Major.meets_threshold(Severity::Critical));
    /// ```
    pub fn meets_threshold(self, threshold: Severity) -> bool {
        self.rank() >= threshold.rank()
    }

    /// Position in the total order; `Info` is 0.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Info => 0,
            Severity::Minor => 1,
            Severity::Major => 2,
            Severity::Critical => 3,
            Severity::Blocker => 4,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Minor => write!(f, "minor"),
            Severity::Major => write!(f, "major"),
            Severity::Critical => write!(f, "critical"),
            Severity::Blocker => write!(f, "blocker"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "critical" => Ok(Severity::Critical),
            "blocker" => Ok(Severity::Blocker),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single static-analysis finding, as produced by the analysis engine.
///
/// `file_path` is absolute and uses the host's separator. A finding without
/// a line is file-level.
///
/// # Examples
///
/// ```
/// use diffnote_core::{Finding, Severity};
///
/// let finding: Finding = serde_json::from_str(
///     r#"{"message": "Remove this violation", "severity": "major",
///         "filePath": "/repo/src/Main.go", "line": 12}"#,
/// ).unwrap();
/// assert_eq!(finding.line, Some(12));
/// assert_eq!(finding.severity, Severity::Major);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Human-readable description; posted verbatim.
    pub message: String,
    /// Severity assigned by the analysis engine.
    pub severity: Severity,
    /// Absolute path of the analyzed file.
    pub file_path: String,
    /// One-based line in the new version of the file.
    #[serde(default)]
    pub line: Option<u32>,
}

/// An annotation already present on the commit.
///
/// Commit-level annotations (summaries) have neither `path` nor `line`.
/// Remote stores report the line as a number or as a string; both decode
/// to the decimal string form.
///
/// # Examples
///
/// ```
/// use diffnote_core::ExistingAnnotation;
///
/// let a: ExistingAnnotation =
///     serde_json::from_str(r#"{"path": "a.go", "line": 12, "note": "X"}"#).unwrap();
/// assert_eq!(a.line.as_deref(), Some("12"));
/// assert_eq!(a.text, "X");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAnnotation {
    /// Repository-relative path, or `None` for commit-level annotations.
    #[serde(default)]
    pub path: Option<String>,
    /// Line representation, or `None` for file- and commit-level annotations.
    #[serde(default, deserialize_with = "line_repr")]
    pub line: Option<String>,
    /// Annotation body.
    #[serde(alias = "note")]
    pub text: String,
}

fn line_repr<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::Number(n)) => Some(n.to_string()),
        Some(Repr::Text(s)) if s.trim().is_empty() => None,
        Some(Repr::Text(s)) => Some(s.trim().to_string()),
        None => None,
    })
}

/// One entry of a commit's diff, as returned by the remote store.
///
/// Field names follow the GitLab commit-diff payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDiff {
    /// Path after the change.
    pub new_path: String,
    /// Path before the change.
    pub old_path: String,
    /// Unified diff body (hunks only, or with file headers).
    #[serde(rename = "diff")]
    pub diff_text: String,
    /// The file was deleted by the commit.
    #[serde(rename = "deleted_file", default)]
    pub deleted: bool,
    /// The file was renamed by the commit.
    #[serde(rename = "renamed_file", default)]
    pub renamed: bool,
    /// The file was created by the commit.
    #[serde(default)]
    pub new_file: bool,
}

/// Commit status written by the build gate.
///
/// # Examples
///
/// ```
/// use diffnote_core::CommitState;
///
/// assert_eq!(CommitState::Failed.to_string(), "failed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitState {
    /// No finding reached the threshold.
    Success,
    /// At least one finding reached the threshold.
    Failed,
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitState::Success => write!(f, "success"),
            CommitState::Failed => write!(f, "failed"),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use diffnote_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn severity_roundtrips_through_json() {
        let json = serde_json::to_string(&Severity::Blocker).unwrap();
        assert_eq!(json, "\"blocker\"");

        let parsed: Severity = serde_json::from_str("\"minor\"").unwrap();
        assert_eq!(parsed, Severity::Minor);
    }

    #[test]
    fn severity_json_is_case_insensitive() {
        let parsed: Severity = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(parsed, Severity::Critical);

        let finding: Finding = serde_json::from_str(
            r#"{"message": "m", "severity": "MAJOR", "filePath": "/r/a.go"}"#,
        )
        .unwrap();
        assert_eq!(finding.severity, Severity::Major);

        let finding: Finding = serde_json::from_str(
            r#"{"message": "m", "severity": "Blocker", "filePath": "/r/a.go", "line": 3}"#,
        )
        .unwrap();
        assert_eq!(finding.severity, Severity::Blocker);

        let err = serde_json::from_str::<Severity>("\"bug\"").unwrap_err();
        assert!(err.to_string().contains("unknown severity"));
    }

    #[test]
    fn severity_from_str() {
        assert_eq!("info".parse::<Severity>().unwrap(), Severity::Info);
        assert_eq!("Major".parse::<Severity>().unwrap(), Severity::Major);
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("bug".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_total_order_is_ascending() {
        let mut shuffled = vec![
            Severity::Critical,
            Severity::Info,
            Severity::Blocker,
            Severity::Minor,
            Severity::Major,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Severity::ASCENDING.to_vec());
    }

    #[test]
    fn severity_meets_threshold() {
        assert!(Severity::Blocker.meets_threshold(Severity::Critical));
        assert!(Severity::Critical.meets_threshold(Severity::Critical));
        assert!(!Severity::Major.meets_threshold(Severity::Critical));
        assert!(Severity::Info.meets_threshold(Severity::Info));
        assert!(!Severity::Info.meets_threshold(Severity::Minor));
    }

    #[test]
    fn finding_line_is_optional() {
        let finding: Finding = serde_json::from_str(
            r#"{"message": "m", "severity": "info", "filePath": "/r/a.go"}"#,
        )
        .unwrap();
        assert_eq!(finding.line, None);
    }

    #[test]
    fn existing_annotation_accepts_string_and_number_lines() {
        let numeric: ExistingAnnotation =
            serde_json::from_str(r#"{"path": "a.go", "line": 12, "text": "X"}"#).unwrap();
        let textual: ExistingAnnotation =
            serde_json::from_str(r#"{"path": "a.go", "line": "12", "text": "X"}"#).unwrap();
        assert_eq!(numeric, textual);
    }

    #[test]
    fn existing_summary_has_no_path_or_line() {
        let summary: ExistingAnnotation =
            serde_json::from_str(r#"{"path": null, "line": null, "note": "summary"}"#).unwrap();
        assert!(summary.path.is_none());
        assert!(summary.line.is_none());
    }

    #[test]
    fn raw_diff_decodes_gitlab_payload() {
        let raw: RawDiff = serde_json::from_str(
            r#"{"old_path": "a.go", "new_path": "b.go", "diff": "@@ -1 +1 @@\n",
                "new_file": false, "renamed_file": true, "deleted_file": false,
                "a_mode": "100644", "b_mode": "100644"}"#,
        )
        .unwrap();
        assert!(raw.renamed);
        assert!(!raw.deleted);
        assert_eq!(raw.new_path, "b.go");
        assert_eq!(raw.diff_text, "@@ -1 +1 @@\n");
    }

    #[test]
    fn commit_state_display() {
        assert_eq!(CommitState::Success.to_string(), "success");
        assert_eq!(CommitState::Failed.to_string(), "failed");
    }
}
