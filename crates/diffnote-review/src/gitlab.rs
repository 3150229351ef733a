use std::time::Duration;

use diffnote_core::{
    CommitState, DiffnoteError, ExistingAnnotation, GitLabConfig, RawDiff, StoreError, TokenType,
};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::store::CommitStore;

/// GitLab v4 REST client for commit diffs, commit comments and commit statuses.
///
/// # Examples
///
/// ```
/// use diffnote_core::GitLabConfig;
/// use diffnote_review::gitlab::GitLabClient;
///
/// let config = GitLabConfig {
///     token: Some("glpat-xxxx".into()),
///     ..GitLabConfig::default()
/// };
/// let client = GitLabClient::new(&config).unwrap();
/// assert_eq!(client.api_url().as_str(), "https://gitlab.com/api/v4");
/// ```
pub struct GitLabClient {
    http: reqwest::Client,
    api: Url,
    token: String,
    token_type: TokenType,
}

impl GitLabClient {
    /// Create a client from configuration, falling back to `GITLAB_TOKEN` for the token.
    ///
    /// # Errors
    ///
    /// Returns [`DiffnoteError::Config`] if the URL is blank or invalid, if no
    /// token is available, or if the HTTP client cannot be built.
    pub fn new(config: &GitLabConfig) -> Result<Self, DiffnoteError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(DiffnoteError::Config(
                "gitlab.url is empty. Set it in .diffnote.toml or pass --gitlab-url".into(),
            ));
        }

        let mut api = Url::parse(url)
            .map_err(|e| DiffnoteError::Config(format!("invalid gitlab.url '{url}': {e}")))?;
        api.path_segments_mut()
            .map_err(|()| DiffnoteError::Config(format!("gitlab.url '{url}' cannot be a base URL")))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                std::env::var("GITLAB_TOKEN")
                    .ok()
                    .filter(|t| !t.trim().is_empty())
            })
            .ok_or_else(|| {
                DiffnoteError::Config(
                    "GitLab token not set. Set gitlab.token in .diffnote.toml or the GITLAB_TOKEN env var"
                        .into(),
                )
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("diffnote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DiffnoteError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api,
            token,
            token_type: config.token_type,
        })
    }

    /// Base of every API request.
    pub fn api_url(&self) -> &Url {
        &self.api
    }

    /// `{api}/projects/{project}/{tail...}` with every segment percent-encoded.
    fn endpoint(&self, project: &str, tail: &[&str]) -> Url {
        let mut url = self.api.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("projects").push(project).extend(tail);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token_type {
            TokenType::Access => request.bearer_auth(&self.token),
            TokenType::Private => request.header("PRIVATE-TOKEN", &self.token),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StoreError> {
        debug!(%url, "GET");
        let response = self.send(self.http.get(url)).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn post_json(&self, url: Url, body: &serde_json::Value) -> Result<(), StoreError> {
        debug!(%url, "POST");
        self.send(self.http.post(url).json(body)).await?;
        Ok(())
    }
}

impl CommitStore for GitLabClient {
    async fn fetch_existing_annotations(
        &self,
        project: &str,
        commit: &str,
    ) -> Result<Vec<ExistingAnnotation>, StoreError> {
        let mut url = self.endpoint(project, &["repository", "commits", commit, "comments"]);
        url.query_pairs_mut().append_pair("per_page", "100");
        self.get_json(url).await
    }

    async fn create_inline_annotation(
        &self,
        project: &str,
        commit: &str,
        path: &str,
        line: Option<u32>,
        text: &str,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(project, &["repository", "commits", commit, "comments"]);
        let body = match line {
            Some(line) => serde_json::json!({
                "note": text,
                "path": path,
                "line": line,
                "line_type": "new",
            }),
            None => serde_json::json!({
                "note": text,
                "path": path,
            }),
        };
        self.post_json(url, &body).await
    }

    async fn create_summary_annotation(
        &self,
        project: &str,
        commit: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(project, &["repository", "commits", commit, "comments"]);
        self.post_json(url, &serde_json::json!({ "note": text })).await
    }

    async fn set_commit_status(
        &self,
        project: &str,
        commit: &str,
        state: CommitState,
        name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(project, &["statuses", commit]);
        let body = serde_json::json!({
            "state": state.to_string(),
            "name": name,
            "description": description,
        });
        self.post_json(url, &body).await
    }

    async fn get_raw_diffs(&self, project: &str, commit: &str) -> Result<Vec<RawDiff>, StoreError> {
        let mut url = self.endpoint(project, &["repository", "commits", commit, "diff"]);
        url.query_pairs_mut().append_pair("per_page", "100");
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> Result<GitLabClient, DiffnoteError> {
        GitLabClient::new(&GitLabConfig {
            url: url.into(),
            token: Some("test-token".into()),
            ..GitLabConfig::default()
        })
    }

    #[test]
    fn api_url_appends_v4() {
        let client = client("https://gitlab.example.com/").unwrap();
        assert_eq!(client.api_url().as_str(), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn api_url_keeps_a_path_prefix() {
        let client = client("https://example.com/gitlab").unwrap();
        assert_eq!(client.api_url().as_str(), "https://example.com/gitlab/api/v4");
    }

    #[test]
    fn project_path_is_percent_encoded() {
        let client = client("https://gitlab.com").unwrap();
        let url = client.endpoint("group/sub/app", &["statuses", "a2b4c6"]);
        assert_eq!(
            url.as_str(),
            "https://gitlab.com/api/v4/projects/group%2Fsub%2Fapp/statuses/a2b4c6"
        );
    }

    #[test]
    fn numeric_project_id_is_used_as_is() {
        let client = client("https://gitlab.com").unwrap();
        let url = client.endpoint("42", &["repository", "commits", "abc", "diff"]);
        assert_eq!(
            url.as_str(),
            "https://gitlab.com/api/v4/projects/42/repository/commits/abc/diff"
        );
    }

    #[test]
    fn blank_url_is_a_config_error() {
        assert!(matches!(client("  "), Err(DiffnoteError::Config(_))));
    }

    #[test]
    fn unparsable_url_is_a_config_error() {
        assert!(matches!(client("not a url"), Err(DiffnoteError::Config(_))));
    }
}
