use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DiffnoteError;
use crate::types::Severity;

/// Top-level configuration loaded from `.diffnote.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use diffnote_core::{DiffnoteConfig, Severity};
///
/// let config = DiffnoteConfig::default();
/// assert!(config.review.gate_enabled);
/// assert_eq!(config.review.gate_threshold, Severity::Critical);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffnoteConfig {
    /// Remote GitLab instance settings.
    #[serde(default)]
    pub gitlab: GitLabConfig,
    /// Annotation and gate behavior.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl DiffnoteConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Io`] if the file cannot be read,
    /// [`DiffnoteError::Toml`] if the content is not valid TOML, or
    /// [`DiffnoteError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use diffnote_core::DiffnoteConfig;
    /// use std::path::Path;
    ///
    /// let config = DiffnoteConfig::from_file(Path::new(".diffnote.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, DiffnoteError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Toml`] if parsing fails, or
    /// [`DiffnoteError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use diffnote_core::DiffnoteConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// gate_threshold = "blocker"
    /// "#;
    /// let config = DiffnoteConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.gate_threshold.to_string(), "blocker");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DiffnoteError> {
        let config: Self = toml::from_str(content)?;
        config.review.validate()?;
        Ok(config)
    }
}

/// How the access token is presented to GitLab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// OAuth / project access token, sent as a bearer token.
    #[default]
    Access,
    /// Personal access token, sent in the `PRIVATE-TOKEN` header.
    Private,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Private => write!(f, "private"),
        }
    }
}

/// GitLab connection configuration.
///
/// # Examples
///
/// ```
/// use diffnote_core::GitLabConfig;
///
/// let config = GitLabConfig::default();
/// assert_eq!(config.url, "https://gitlab.com");
/// assert!(config.token.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// Base URL of the instance, without `/api/v4`.
    #[serde(default = "default_gitlab_url")]
    pub url: String,
    /// Access token. Falls back to `GITLAB_TOKEN` when unset.
    pub token: Option<String>,
    /// How `token` is sent.
    #[serde(default)]
    pub token_type: TokenType,
    /// Project id or `namespace/name` path.
    pub project: Option<String>,
}

fn default_gitlab_url() -> String {
    "https://gitlab.com".into()
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            token: None,
            token_type: TokenType::default(),
            project: None,
        }
    }
}

/// Annotation and gate behavior for one run.
///
/// # Examples
///
/// ```
/// use diffnote_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert!(config.summary_enabled);
/// assert_eq!(config.analyzer_name, "SonarQube");
/// assert_eq!(config.max_concurrent_posts, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Report a pass/fail commit status (default: true).
    #[serde(default = "default_true")]
    pub gate_enabled: bool,
    /// Lowest severity that fails the gate (default: critical).
    #[serde(default = "default_gate_threshold")]
    pub gate_threshold: Severity,
    /// Post one commit-level summary comment (default: true).
    #[serde(default = "default_true")]
    pub summary_enabled: bool,
    /// Name used in the summary text (default: "SonarQube").
    #[serde(default = "default_analyzer_name")]
    pub analyzer_name: String,
    /// Context name of the commit status (default: "SonarQube").
    #[serde(default = "default_status_name")]
    pub status_name: String,
    /// Inline comments posted at once (default: 1, i.e. strictly in order).
    #[serde(default = "default_max_concurrent_posts")]
    pub max_concurrent_posts: usize,
}

fn default_true() -> bool {
    true
}

fn default_gate_threshold() -> Severity {
    Severity::Critical
}

fn default_analyzer_name() -> String {
    "SonarQube".into()
}

fn default_status_name() -> String {
    "SonarQube".into()
}

fn default_max_concurrent_posts() -> usize {
    1
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            gate_enabled: default_true(),
            gate_threshold: default_gate_threshold(),
            summary_enabled: default_true(),
            analyzer_name: default_analyzer_name(),
            status_name: default_status_name(),
            max_concurrent_posts: default_max_concurrent_posts(),
        }
    }
}

impl ReviewConfig {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Config`] when `max_concurrent_posts` is zero.
    pub fn validate(&self) -> Result<(), DiffnoteError> {
        if self.max_concurrent_posts == 0 {
            return Err(DiffnoteError::Config(
                "review.max_concurrent_posts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
