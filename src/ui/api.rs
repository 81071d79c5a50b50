use crate::ai::SummaryResult;
use crate::error::{AppError, ErrorBody, Result};
use crate::github::{PullRequestPage, Repository};
use crate::server::wire::{GenerateSummaryBody, PromptBody};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the repo2resume API
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo2resume-ui/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let url = format!("{}/api/repos", self.base_url);
        self.send(self.client.get(url)).await
    }

    pub async fn list_pull_requests(
        &self,
        repo_full_name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PullRequestPage> {
        let url = format!("{}/api/repos/{}/pull-requests", self.base_url, repo_full_name);
        let request = self
            .client
            .get(url)
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(request).await
    }

    pub async fn default_prompt(&self) -> Result<String> {
        let url = format!("{}/api/default-prompt", self.base_url);
        let body: PromptBody = self.send(self.client.get(url)).await?;
        Ok(body.prompt)
    }

    pub async fn generate_summary(&self, body: &GenerateSummaryBody) -> Result<SummaryResult> {
        let url = format!("{}/api/generate-summary", self.base_url);
        self.send(self.client.post(url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            AppError::upstream(format!("Could not reach the API at {}: {}", self.base_url, e))
        })?;

        let status = response.status();
        debug!(%status, url = %response.url(), "api response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(backend_error(status, &body));
        }

        Ok(response.json().await?)
    }
}

/// Turn a non-2xx API response into an error carrying its `detail`
fn backend_error(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| format!("API request failed ({})", status));

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS => AppError::UpstreamRateLimit(detail),
        _ => AppError::Upstream(detail),
    }
}
