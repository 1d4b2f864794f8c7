//! Build service trait and the request/response types shared by all
//! implementations.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;

use crate::error::ClientError;
use crate::model::BuildId;

/// Result type for build service calls
pub type ServiceResult<T> = std::result::Result<T, ClientError>;

/// The only status App Center uses for a successful call on these endpoints.
pub const STATUS_OK: u16 = 200;

/// Returned by the branch configuration lookup when none exists.
pub const STATUS_NOT_FOUND: u16 = 404;

// ---------------------------------------------------------------------------
// Request context
// ---------------------------------------------------------------------------

/// App Center API token.
///
/// `Debug` is redacted so the token never ends up in log output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        ApiToken(token.into())
    }

    /// Raw token value, for the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// The app every call is addressed to, plus the token used to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTarget {
    pub owner: String,
    pub app: String,
    pub token: ApiToken,
}

impl AppTarget {
    pub fn new(token: &str, owner: &str, app: &str) -> Self {
        Self {
            owner: owner.to_string(),
            app: app.to_string(),
            token: ApiToken::new(token),
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// A completed HTTP exchange: status code plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Response with a JSON body.
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn is_not_found(&self) -> bool {
        self.status == STATUS_NOT_FOUND
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl fmt::Display for RemoteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "status {}", self.status)
        } else {
            write!(f, "status {}: {}", self.status, self.body)
        }
    }
}

// ---------------------------------------------------------------------------
// BuildService
// ---------------------------------------------------------------------------

/// The remote operations the reset workflow issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    ListBuilds,
    CancelBuild,
    GetBranchConfig,
    DeleteBranchConfig,
    CreateBranchConfig,
    StartBuild,
}

impl ServiceOp {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceOp::ListBuilds => "list_builds",
            ServiceOp::CancelBuild => "cancel_build",
            ServiceOp::GetBranchConfig => "get_branch_config",
            ServiceOp::DeleteBranchConfig => "delete_branch_config",
            ServiceOp::CreateBranchConfig => "create_branch_config",
            ServiceOp::StartBuild => "start_build",
        }
    }
}

impl fmt::Display for ServiceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Remote build service.
///
/// Every method resolves to the raw `RemoteResponse` whatever its status;
/// `Err` means the exchange itself did not complete.
#[async_trait]
pub trait BuildService: Send + Sync {
    /// `GET /apps/{owner}/{app}/branches/{branch}/builds`, newest first.
    async fn list_builds(&self, target: &AppTarget, branch: &str)
        -> ServiceResult<RemoteResponse>;

    /// `PATCH /apps/{owner}/{app}/builds/{build_id}` with `{"status":"cancelling"}`.
    async fn cancel_build(
        &self,
        target: &AppTarget,
        build_id: &BuildId,
    ) -> ServiceResult<RemoteResponse>;

    /// `GET /apps/{owner}/{app}/branches/{branch}/config`.
    async fn get_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse>;

    /// `DELETE /apps/{owner}/{app}/branches/{branch}/config`.
    async fn delete_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse>;

    /// `POST /apps/{owner}/{app}/branches/{branch}/config` with
    /// `{"cloneFromBranch": clone_from}`.
    async fn create_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
        clone_from: &str,
    ) -> ServiceResult<RemoteResponse>;

    /// `POST /apps/{owner}/{app}/branches/{branch}/builds` with `{"debug":false}`.
    async fn start_build(&self, target: &AppTarget, branch: &str)
        -> ServiceResult<RemoteResponse>;
}
