use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::models::github::{CreateHook, Hook, Repository};

/// The GitHub REST calls this service depends on.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn create_hook(
        &self,
        access_token: &str,
        owner: &str,
        name: &str,
        hook: &CreateHook,
    ) -> Result<Hook, GithubError>;

    async fn delete_hook(
        &self,
        access_token: &str,
        owner: &str,
        name: &str,
        hook_id: i64,
    ) -> Result<(), GithubError>;

    /// Repositories of the token's user, most recently pushed first.
    async fn list_repositories(&self, access_token: &str) -> Result<Vec<Repository>, GithubError>;
}

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(api_url: &str) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("hookline/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(GithubClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github+json")
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn create_hook(
        &self,
        access_token: &str,
        owner: &str,
        name: &str,
        hook: &CreateHook,
    ) -> Result<Hook, GithubError> {
        let res = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{owner}/{name}/hooks"),
                access_token,
            )
            .json(hook)
            .send()
            .await?;

        Ok(check_status(res).await?.json().await?)
    }

    async fn delete_hook(
        &self,
        access_token: &str,
        owner: &str,
        name: &str,
        hook_id: i64,
    ) -> Result<(), GithubError> {
        let res = self
            .request(
                reqwest::Method::DELETE,
                &format!("/repos/{owner}/{name}/hooks/{hook_id}"),
                access_token,
            )
            .send()
            .await?;

        check_status(res).await?;
        Ok(())
    }

    async fn list_repositories(&self, access_token: &str) -> Result<Vec<Repository>, GithubError> {
        let res = self
            .request(reqwest::Method::GET, "/user/repos", access_token)
            .query(&[("sort", "pushed"), ("direction", "desc"), ("per_page", "100")])
            .send()
            .await?;

        Ok(check_status(res).await?.json().await?)
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&text)
        .ok()
        .and_then(|v| v["message"].as_str().map(|s| s.to_string()))
        .unwrap_or(text);

    Err(GithubError::Status {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl GithubError {
    /// GitHub rejected the credential, usually a revoked token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GithubError::Status { status: 401, .. })
    }
}
