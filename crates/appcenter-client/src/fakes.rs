//! In-memory fake of the build service (testing only)
//!
//! `MemoryBuildService` keeps per-branch build lists and configurations in
//! memory and answers the way App Center does: 404 for a missing config,
//! 409 when creating a config over an existing one. Every call is logged so
//! tests can assert on ordering, and any operation can be scripted to
//! return a fixed response or a transport failure.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::error::ClientError;
use crate::model::{BranchBuild, BuildId, BuildStatus, STATUS_CANCELLING};
use crate::service::{
    AppTarget, BuildService, RemoteResponse, ServiceOp, ServiceResult, STATUS_NOT_FOUND, STATUS_OK,
};

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_CONFLICT: u16 = 409;

/// A call received by the fake, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub op: ServiceOp,
    /// Branch name, or build id for `CancelBuild`
    pub subject: String,
}

#[derive(Debug, Clone)]
enum Scripted {
    Respond(RemoteResponse),
    TransportFailure(String),
}

#[derive(Debug, Default)]
struct ServiceState {
    /// Newest first, per branch
    builds: HashMap<String, Vec<BranchBuild>>,
    /// Branch -> clone source
    configs: HashMap<String, String>,
    next_build_id: u64,
    calls: Vec<ServiceCall>,
    scripted: HashMap<ServiceOp, Scripted>,
    expected_token: Option<String>,
}

/// In-memory build service backed by per-branch maps.
#[derive(Debug, Default)]
pub struct MemoryBuildService {
    state: Mutex<ServiceState>,
}

impl MemoryBuildService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject calls whose token differs from `token` with 401.
    pub fn with_token(self, token: &str) -> Self {
        self.state().expected_token = Some(token.to_string());
        self
    }

    /// Push a build onto the branch's list. Later pushes are newer.
    pub fn with_build(self, branch: &str, id: &str, status: &str) -> Self {
        self.state()
            .builds
            .entry(branch.to_string())
            .or_default()
            .insert(0, BranchBuild::new(id, status));
        self
    }

    /// Seed an existing configuration cloned from `clone_from`.
    pub fn with_config(self, branch: &str, clone_from: &str) -> Self {
        self.state()
            .configs
            .insert(branch.to_string(), clone_from.to_string());
        self
    }

    /// Id the next started build receives.
    pub fn with_next_build_id(self, id: u64) -> Self {
        self.state().next_build_id = id;
        self
    }

    /// Make every call of `op` answer with `response`.
    pub fn respond_with(self, op: ServiceOp, response: RemoteResponse) -> Self {
        self.state().scripted.insert(op, Scripted::Respond(response));
        self
    }

    /// Make every call of `op` fail before reaching the service.
    pub fn fail_transport(self, op: ServiceOp, message: &str) -> Self {
        self.state()
            .scripted
            .insert(op, Scripted::TransportFailure(message.to_string()));
        self
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state().calls.clone()
    }

    /// Operations received so far, in order.
    pub fn ops(&self) -> Vec<ServiceOp> {
        self.state().calls.iter().map(|c| c.op).collect()
    }

    /// Number of calls of `op` received so far.
    pub fn count(&self, op: ServiceOp) -> usize {
        self.state().calls.iter().filter(|c| c.op == op).count()
    }

    /// Clone source of the branch's current configuration.
    pub fn config_for(&self, branch: &str) -> Option<String> {
        self.state().configs.get(branch).cloned()
    }

    /// The branch's builds, newest first.
    pub fn builds_for(&self, branch: &str) -> Vec<BranchBuild> {
        self.state().builds.get(branch).cloned().unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log the call and resolve token checks and scripted answers.
    ///
    /// Returns `Ok(None)` when the call should be served from state.
    fn intercept(
        state: &mut ServiceState,
        op: ServiceOp,
        subject: &str,
        target: &AppTarget,
    ) -> ServiceResult<Option<RemoteResponse>> {
        state.calls.push(ServiceCall {
            op,
            subject: subject.to_string(),
        });

        if let Some(scripted) = state.scripted.get(&op) {
            return match scripted {
                Scripted::Respond(response) => Ok(Some(response.clone())),
                Scripted::TransportFailure(message) => Err(ClientError::Transport(message.clone())),
            };
        }

        if let Some(expected) = &state.expected_token {
            if expected != target.token.expose() {
                return Ok(Some(error_response(
                    STATUS_UNAUTHORIZED,
                    "Unauthorized",
                    "invalid API token",
                )));
            }
        }

        Ok(None)
    }
}

fn error_response(status: u16, code: &str, message: &str) -> RemoteResponse {
    RemoteResponse::json_body(status, &json!({ "code": code, "message": message }))
}

#[async_trait]
impl BuildService for MemoryBuildService {
    async fn list_builds(&self, target: &AppTarget, branch: &str) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) = Self::intercept(&mut state, ServiceOp::ListBuilds, branch, target)? {
            return Ok(response);
        }
        let builds = state.builds.get(branch).cloned().unwrap_or_default();
        Ok(RemoteResponse::json_body(STATUS_OK, &serde_json::to_value(builds)?))
    }

    async fn cancel_build(
        &self,
        target: &AppTarget,
        build_id: &BuildId,
    ) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) =
            Self::intercept(&mut state, ServiceOp::CancelBuild, build_id.as_str(), target)?
        {
            return Ok(response);
        }
        let build = state
            .builds
            .values_mut()
            .flat_map(|builds| builds.iter_mut())
            .find(|build| &build.id == build_id);
        match build {
            Some(build) => {
                build.status = BuildStatus::new(STATUS_CANCELLING);
                Ok(RemoteResponse::json_body(STATUS_OK, &serde_json::to_value(&*build)?))
            }
            None => Ok(error_response(STATUS_NOT_FOUND, "NotFound", "build not found")),
        }
    }

    async fn get_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) =
            Self::intercept(&mut state, ServiceOp::GetBranchConfig, branch, target)?
        {
            return Ok(response);
        }
        match state.configs.get(branch) {
            Some(clone_from) => Ok(RemoteResponse::json_body(
                STATUS_OK,
                &json!({ "branch": branch, "cloneFromBranch": clone_from }),
            )),
            None => Ok(error_response(
                STATUS_NOT_FOUND,
                "NotFound",
                "branch configuration not found",
            )),
        }
    }

    async fn delete_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
    ) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) =
            Self::intercept(&mut state, ServiceOp::DeleteBranchConfig, branch, target)?
        {
            return Ok(response);
        }
        match state.configs.remove(branch) {
            Some(_) => Ok(RemoteResponse::json_body(
                STATUS_OK,
                &json!({ "message": "branch configuration deleted" }),
            )),
            None => Ok(error_response(
                STATUS_NOT_FOUND,
                "NotFound",
                "branch configuration not found",
            )),
        }
    }

    async fn create_branch_config(
        &self,
        target: &AppTarget,
        branch: &str,
        clone_from: &str,
    ) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) =
            Self::intercept(&mut state, ServiceOp::CreateBranchConfig, branch, target)?
        {
            return Ok(response);
        }
        if state.configs.contains_key(branch) {
            return Ok(error_response(
                STATUS_CONFLICT,
                "Conflict",
                "branch configuration already exists",
            ));
        }
        state
            .configs
            .insert(branch.to_string(), clone_from.to_string());
        Ok(RemoteResponse::json_body(
            STATUS_OK,
            &json!({ "branch": branch, "cloneFromBranch": clone_from }),
        ))
    }

    async fn start_build(&self, target: &AppTarget, branch: &str) -> ServiceResult<RemoteResponse> {
        let mut state = self.state();
        if let Some(response) = Self::intercept(&mut state, ServiceOp::StartBuild, branch, target)? {
            return Ok(response);
        }
        state.next_build_id += 1;
        let id = state.next_build_id;
        state
            .builds
            .entry(branch.to_string())
            .or_default()
            .insert(0, BranchBuild::new(id.to_string(), "notStarted"));
        Ok(RemoteResponse::json_body(
            STATUS_OK,
            &json!({
                "id": id,
                "buildNumber": id.to_string(),
                "status": "notStarted",
                "sourceBranch": branch,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StartedBuild;

    fn target() -> AppTarget {
        AppTarget::new("token", "acme", "mobile")
    }

    #[tokio::test]
    async fn test_list_builds_newest_first() {
        let service = MemoryBuildService::new()
            .with_build("develop", "1", "completed")
            .with_build("develop", "2", "inProgress");

        let response = service.list_builds(&target(), "develop").await.unwrap();
        assert!(response.is_ok());
        let builds: Vec<BranchBuild> = response.json().unwrap();
        assert_eq!(builds[0].id.as_str(), "2");
        assert_eq!(builds[1].id.as_str(), "1");
    }

    #[tokio::test]
    async fn test_cancel_marks_build_cancelling() {
        let service = MemoryBuildService::new().with_build("develop", "9", "inProgress");

        let response = service
            .cancel_build(&target(), &BuildId::new("9"))
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(service.builds_for("develop")[0].status.as_str(), "cancelling");

        let missing = service
            .cancel_build(&target(), &BuildId::new("10"))
            .await
            .unwrap();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_config_lifecycle() {
        let service = MemoryBuildService::new();

        let lookup = service.get_branch_config(&target(), "develop").await.unwrap();
        assert!(lookup.is_not_found());

        let created = service
            .create_branch_config(&target(), "develop", "main")
            .await
            .unwrap();
        assert!(created.is_ok());
        assert_eq!(service.config_for("develop").as_deref(), Some("main"));

        let conflict = service
            .create_branch_config(&target(), "develop", "main")
            .await
            .unwrap();
        assert_eq!(conflict.status, STATUS_CONFLICT);

        let deleted = service.delete_branch_config(&target(), "develop").await.unwrap();
        assert!(deleted.is_ok());
        assert!(service.config_for("develop").is_none());
    }

    #[tokio::test]
    async fn test_start_build_assigns_numeric_ids() {
        let service = MemoryBuildService::new().with_next_build_id(100);

        let response = service.start_build(&target(), "develop").await.unwrap();
        let started: StartedBuild = response.json().unwrap();
        assert_eq!(started.id.as_str(), "101");
        assert!(service.builds_for("develop")[0].in_progress());
    }

    #[tokio::test]
    async fn test_scripted_responses_and_call_log() {
        let service = MemoryBuildService::new()
            .respond_with(ServiceOp::ListBuilds, RemoteResponse::new(503, "unavailable"))
            .fail_transport(ServiceOp::StartBuild, "connection reset");

        let listed = service.list_builds(&target(), "develop").await.unwrap();
        assert_eq!(listed.status, 503);

        let started = service.start_build(&target(), "develop").await;
        assert!(matches!(started, Err(ClientError::Transport(_))));

        assert_eq!(service.ops(), vec![ServiceOp::ListBuilds, ServiceOp::StartBuild]);
        assert_eq!(service.calls()[0].subject, "develop");
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let service = MemoryBuildService::new().with_token("right");
        let wrong = AppTarget::new("wrong", "acme", "mobile");

        let response = service.list_builds(&wrong, "develop").await.unwrap();
        assert_eq!(response.status, STATUS_UNAUTHORIZED);
        assert_eq!(service.count(ServiceOp::ListBuilds), 1);
    }
}
