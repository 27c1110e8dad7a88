use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::types::{CreatedPullRequest, PullRequestTarget};

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API responded with {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GitHub token not found; set GITHUB_TOKEN or github.token in .pullreq.toml")]
    MissingToken,
}

/// Creates pull requests on the hosting service.
#[async_trait]
pub trait ReviewRequestService: Send + Sync {
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        target: &PullRequestTarget,
    ) -> Result<CreatedPullRequest, GitHubError>;
}

/// REST client for `POST /repos/{owner}/{repo}/pulls`.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            token,
        }
    }

    fn pulls_endpoint(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{owner}/{repo}/pulls",
            self.api_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue: Option<u64>,
    base: &'a str,
    head: String,
}

impl<'a> CreatePullRequest<'a> {
    fn from_target(target: &'a PullRequestTarget) -> Self {
        let (title, body, issue) = match target {
            PullRequestTarget::Message(params) => {
                (Some(params.title.as_str()), Some(params.body.as_str()), None)
            }
            PullRequestTarget::Issue(params) => (None, None, Some(params.issue)),
        };

        Self {
            title,
            body,
            issue,
            base: target.base().local_branch(),
            head: target.head().head_spec(),
        }
    }
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

#[async_trait]
impl ReviewRequestService for GitHubClient {
    #[instrument(skip(self, target), fields(base = %target.base(), head = %target.head()))]
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        target: &PullRequestTarget,
    ) -> Result<CreatedPullRequest, GitHubError> {
        let token = self.token.as_deref().ok_or(GitHubError::MissingToken)?;
        let payload = CreatePullRequest::from_target(target);

        debug!(issue = ?payload.issue, "posting pull request to GitHub API");
        let response = self
            .http
            .post(self.pulls_endpoint(owner, repo))
            .header(USER_AGENT, "pullreq")
            .header(ACCEPT, "application/vnd.github+json")
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|err| err.message)
                .unwrap_or(text);
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created = response.json::<PullResponse>().await?;
        debug!(number = created.number, "pull request created");

        Ok(CreatedPullRequest {
            number: created.number,
            html_url: created.html_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::types::{BranchRef, IssueRequestParams, RequestParams};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message_target() -> PullRequestTarget {
        PullRequestTarget::Message(RequestParams {
            title: "Add greeting".to_string(),
            body: "Says hello.".to_string(),
            base: BranchRef::new("octo/hello:master"),
            head: BranchRef::new("mona/hello:topic"),
        })
    }

    #[tokio::test]
    async fn test_creates_pull_request_from_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/hello/pulls"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({
                "title": "Add greeting",
                "body": "Says hello.",
                "base": "master",
                "head": "mona:topic",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://github.com/octo/hello/pull/7",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), Some("secret".to_string()));
        let created = client
            .create_pull_request("octo", "hello", &message_target())
            .await
            .unwrap();

        assert_eq!(created.number, 7);
        assert_eq!(created.html_url, "https://github.com/octo/hello/pull/7");
    }

    #[tokio::test]
    async fn test_converts_issue() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/hello/pulls"))
            .and(body_json(json!({
                "issue": 12,
                "base": "master",
                "head": "octo:topic",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 12,
                "html_url": "https://github.com/octo/hello/pull/12",
            })))
            .mount(&server)
            .await;

        let target = PullRequestTarget::Issue(IssueRequestParams {
            issue: 12,
            base: BranchRef::new("octo:master"),
            head: BranchRef::new("octo:topic"),
        });
        let client = GitHubClient::new(format!("{}/", server.uri()), Some("secret".to_string()));
        let created = client.create_pull_request("octo", "hello", &target).await.unwrap();

        assert_eq!(created.number, 12);
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/octo/hello/pulls"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation Failed",
            })))
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), Some("secret".to_string()));
        let err = client
            .create_pull_request("octo", "hello", &message_target())
            .await
            .unwrap_err();

        match err {
            GitHubError::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation Failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(server.uri(), Some("secret".to_string()));
        let err = client
            .create_pull_request("octo", "hello", &message_target())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "GitHub API responded with 502: bad gateway");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let client = GitHubClient::new("http://127.0.0.1:9", None);
        let err = client
            .create_pull_request("octo", "hello", &message_target())
            .await
            .unwrap_err();
        assert!(matches!(err, GitHubError::MissingToken));
    }
}
