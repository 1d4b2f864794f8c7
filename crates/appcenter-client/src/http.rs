//! App Center REST client
//!
//! Implements [`BuildService`] over reqwest. Each call is a single request
//! with no retry; the response is handed back whatever its status.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::ClientError;
use crate::model::{BranchConfigRequest, BuildId, CancelBuildRequest, StartBuildRequest};
use crate::service::{ApiToken, AppTarget, BuildService, RemoteResponse, ServiceResult};

/// Public App Center API root.
pub const DEFAULT_API_URL: &str = "https://api.appcenter.ms/v0.1";

const API_TOKEN_HEADER: &str = "X-API-Token";

/// App Center client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCenterConfig {
    /// API root every path is appended to
    pub base_url: String,
    /// API token used when the caller does not supply one
    pub token: Option<ApiToken>,
    /// User-Agent sent with each request
    pub user_agent: String,
}

impl Default for AppCenterConfig {
    fn default() -> Self {
        AppCenterConfig {
            base_url: std::env::var("APPCENTER_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            token: std::env::var("APPCENTER_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(ApiToken::new),
            user_agent: default_user_agent(),
        }
    }
}

impl AppCenterConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific API root
    pub fn new(base_url: &str) -> Self {
        AppCenterConfig {
            base_url: base_url.to_string(),
            token: None,
            user_agent: default_user_agent(),
        }
    }

    /// Set the fallback API token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(ApiToken::new(token));
        self
    }

    /// Override the User-Agent header
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

fn default_user_agent() -> String {
    format!("branch-reset/{}", env!("CARGO_PKG_VERSION"))
}

/// reqwest-backed App Center client
#[derive(Debug, Clone)]
pub struct AppCenterClient {
    base_url: Url,
    http_client: reqwest::Client,
}

impl AppCenterClient {
    /// Create a new client
    pub fn new(config: AppCenterConfig) -> ServiceResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| ClientError::ClientBuild(e.to_string()))?;

        Ok(AppCenterClient {
            base_url,
            http_client,
        })
    }

    /// Append `segments` to the API root, percent-encoding each one.
    ///
    /// A branch such as `feature/login` stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn branch_endpoint(&self, target: &AppTarget, branch: &str, leaf: &str) -> ServiceResult<Url> {
        self.endpoint(&["apps", &target.owner, &target.app, "branches", branch, leaf])
    }

    fn request(&self, method: Method, url: Url, token: &ApiToken) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(API_TOKEN_HEADER, token.expose())
    }

    async fn send(&self, method: Method, url: Url, token: &ApiToken) -> ServiceResult<RemoteResponse> {
        let label = format!("{} {}", method, url.path());
        self.dispatch(label, self.request(method, url, token)).await
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        token: &ApiToken,
        body: &B,
    ) -> ServiceResult<RemoteResponse> {
        let label = format!("{} {}", method, url.path());
        // `json` also sets Content-Type: application/json
        self.dispatch(label, self.request(method, url, token).json(body))
            .await
    }

    async fn dispatch(&self, label: String, request: RequestBuilder) -> ServiceResult<RemoteResponse> {
        debug!(request = %label, "Sending App Center request");
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(request = %label, status, "App Center request completed");
        Ok(RemoteResponse { status, body })
    }
}

#[async_trait]
impl BuildService for AppCenterClient {
    async fn list_builds(&self, target: &AppTarget, branch: &str) -> ServiceResult<RemoteResponse> {
        let url = self.branch_endpoint(target, branch, "builds")?;
        self.send(Method::GET, url, &target.token).await
    }

    async fn cancel_build(
        &self,
        target: &AppTarget,
        build_id: &BuildId,
    ) -> ServiceResult<RemoteResponse> {
        let url = self.endpoint(&["apps", &target.owner, &target.app, "builds", build_id.as_str()])?;
        self.send_json(Method::PATCH, url, &target.token, &CancelBuildRequest::default())
            .await
    }

    async fn get_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse> {
        let url = self.branch_endpoint(target, branch, "config")?;
        self.send(Method::GET, url, &target.token).await
    }

    async fn delete_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse> {
        let url = self.branch_endpoint(target, branch, "config")?;
        self.send(Method::DELETE, url, &target.token).await
    }

    async fn create_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
        clone_from: &str,
    ) -> ServiceResult<RemoteResponse> {
        let url = self.branch_endpoint(target, branch, "config")?;
        let body = BranchConfigRequest::clone_from(clone_from);
        self.send_json(Method::POST, url, &target.token, &body).await
    }

    async fn start_build(&self, target: &AppTarget, branch: &str) -> ServiceResult<RemoteResponse> {
        let url = self.branch_endpoint(target, branch, "builds")?;
        self.send_json(Method::POST, url, &target.token, &StartBuildRequest::default())
            .await
    }
}
