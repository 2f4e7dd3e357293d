//! GitHub REST API access: OAuth sign-in, the app installation token, and the
//! repository operations used to publish changes.

use base64::prelude::*;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

pub mod app;
pub mod oauth;
pub mod publish;

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_OAUTH_URL: &str = "https://github.com/login/oauth";
const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// New contents for one file on a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate<'a> {
    pub path: &'a str,
    pub message: &'a str,
    pub content: &'a str,
    /// Blob SHA of the file being replaced.
    pub sha: &'a str,
    pub branch: &'a str,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// Repository operations needed to publish a set of changed files.
pub trait RepoHost {
    /// Returns the head commit of a branch, or `None` if it does not exist.
    async fn branch_sha(&self, branch: &str) -> AppResult<Option<String>>;

    async fn create_branch(&self, branch: &str, sha: &str) -> AppResult;

    /// Returns the blob SHA of a file at a branch.
    async fn file_sha(&self, path: &str, branch: &str) -> AppResult<String>;

    async fn update_file(&self, update: FileUpdate<'_>) -> AppResult;

    /// Opens a pull request as the user owning `user_token` and returns its
    /// number.
    async fn open_pull_request(&self, user_token: &str, pr: &PullRequest) -> AppResult<u64>;
}

pub(crate) fn api_request(
    http: &reqwest::Client,
    method: Method,
    endpoint: &str,
    authorization: &str,
) -> RequestBuilder {
    http.request(method, format!("{GITHUB_API_URL}{endpoint}"))
        .header(reqwest::header::ACCEPT, ACCEPT)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .header(reqwest::header::AUTHORIZATION, authorization)
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turns an unsuccessful response into an error carrying GitHub's message.
pub(crate) async fn check(endpoint: &str, response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::FORBIDDEN {
        tracing::error!(endpoint, "received 403 Forbidden from GitHub");
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| "cause unknown".to_string());
    Err(AppError::GitHubError(format!("{endpoint}: {status}: {message}")))
}

/// Repository on GitHub, accessed with the app installation token.
#[derive(Debug, Clone)]
pub struct GitHubRepo {
    http: reqwest::Client,
    /// `owner/name`
    repo: String,
    token: String,
}

#[derive(Deserialize)]
struct Branch {
    commit: Commit,
}

#[derive(Deserialize)]
struct Commit {
    sha: String,
}

#[derive(Deserialize)]
struct Contents {
    sha: String,
}

#[derive(Deserialize)]
struct CreatedPull {
    number: u64,
}

impl GitHubRepo {
    pub fn new(http: reqwest::Client, repo: &str, token: String) -> Self {
        GitHubRepo {
            http,
            repo: repo.to_string(),
            token,
        }
    }

    fn request(&self, method: Method, endpoint: &str, token: &str) -> (String, RequestBuilder) {
        let endpoint = format!("/repos/{}{endpoint}", self.repo);
        tracing::debug!(%method, %endpoint, "calling GitHub");
        let request = api_request(&self.http, method, &endpoint, &format!("token {token}"));
        (endpoint, request)
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> AppResult<Response> {
        let (endpoint, mut request) = self.request(method, endpoint, &self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        check(&endpoint, request.send().await?).await
    }
}

impl RepoHost for GitHubRepo {
    async fn branch_sha(&self, branch: &str) -> AppResult<Option<String>> {
        let (endpoint, request) =
            self.request(Method::GET, &format!("/branches/{branch}"), &self.token);
        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let branch: Branch = check(&endpoint, response).await?.json().await?;
        Ok(Some(branch.commit.sha))
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> AppResult {
        self.send(
            Method::POST,
            "/git/refs",
            Some(serde_json::json!({ "ref": format!("refs/heads/{branch}"), "sha": sha })),
        )
        .await?;
        Ok(())
    }

    async fn file_sha(&self, path: &str, branch: &str) -> AppResult<String> {
        let response = self
            .send(
                Method::GET,
                &format!("/contents/{path}?ref=refs/heads/{branch}"),
                None,
            )
            .await?;
        Ok(response.json::<Contents>().await?.sha)
    }

    async fn update_file(&self, update: FileUpdate<'_>) -> AppResult {
        self.send(
            Method::PUT,
            &format!("/contents/{}", update.path),
            Some(serde_json::json!({
                "message": update.message,
                "content": BASE64_STANDARD.encode(update.content),
                "sha": update.sha,
                "branch": update.branch,
            })),
        )
        .await?;
        Ok(())
    }

    /// The app installation cannot open pull requests, so this one call is
    /// made with the user's own token.
    async fn open_pull_request(&self, user_token: &str, pr: &PullRequest) -> AppResult<u64> {
        let (endpoint, request) = self.request(Method::POST, "/pulls", user_token);
        let response = check(&endpoint, request.json(pr).send().await?).await?;
        Ok(response.json::<CreatedPull>().await?.number)
    }
}
