//! Wire model for the App Center build endpoints.
//!
//! Only the fields the reset workflow reads are modelled; everything else
//! in the payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status value App Center reports for a finished build.
pub const STATUS_COMPLETED: &str = "completed";

/// Status value sent to request cancellation of a build.
pub const STATUS_CANCELLING: &str = "cancelling";

/// Opaque build identifier.
///
/// App Center sends build ids as JSON numbers; other producers use strings.
/// Both forms are accepted and kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBuildId", into = "String")]
pub struct BuildId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBuildId {
    Number(u64),
    Text(String),
}

impl From<RawBuildId> for BuildId {
    fn from(raw: RawBuildId) -> Self {
        match raw {
            RawBuildId::Number(n) => BuildId(n.to_string()),
            RawBuildId::Text(s) => BuildId(s),
        }
    }
}

impl From<BuildId> for String {
    fn from(id: BuildId) -> Self {
        id.0
    }
}

impl BuildId {
    pub fn new(id: impl Into<String>) -> Self {
        BuildId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build status as reported by the service.
///
/// Only the completed / not-completed distinction matters to the workflow,
/// so unknown values are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildStatus(String);

impl BuildStatus {
    pub fn new(status: impl Into<String>) -> Self {
        BuildStatus(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_completed(&self) -> bool {
        self.0 == STATUS_COMPLETED
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a branch's build list (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchBuild {
    pub id: BuildId,
    /// Empty when the service omits it; treated as not completed
    #[serde(default)]
    pub status: BuildStatus,
}

impl BranchBuild {
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: BuildId::new(id),
            status: BuildStatus::new(status),
        }
    }

    /// Whether this build still needs cancelling.
    pub fn in_progress(&self) -> bool {
        !self.status.is_completed()
    }
}

/// Body of `PATCH /builds/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancelBuildRequest {
    pub status: String,
}

impl Default for CancelBuildRequest {
    fn default() -> Self {
        Self {
            status: STATUS_CANCELLING.to_string(),
        }
    }
}

/// Body of `POST /branches/{branch}/config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BranchConfigRequest {
    pub clone_from_branch: String,
}

impl BranchConfigRequest {
    pub fn clone_from(branch: &str) -> Self {
        Self {
            clone_from_branch: branch.to_string(),
        }
    }
}

/// Body of `POST /branches/{branch}/builds`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartBuildRequest {
    pub debug: bool,
}

/// Payload returned when a build is queued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartedBuild {
    pub id: BuildId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_id_accepts_number_and_string() {
        let numeric: BuildId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(numeric.as_str(), "42");

        let text: BuildId = serde_json::from_value(json!("b123")).unwrap();
        assert_eq!(text.as_str(), "b123");
    }

    #[test]
    fn test_build_list_ignores_extra_fields() {
        let payload = json!([
            {"id": 7, "buildNumber": "7", "status": "inProgress", "sourceBranch": "develop"},
            {"id": 6, "buildNumber": "6", "status": "completed", "result": "succeeded"}
        ]);
        let builds: Vec<BranchBuild> = serde_json::from_value(payload).unwrap();
        assert_eq!(builds.len(), 2);
        assert_eq!(builds[0].id, BuildId::new("7"));
        assert!(builds[0].in_progress());
        assert!(!builds[1].in_progress());
    }

    #[test]
    fn test_missing_status_is_not_completed() {
        let build: BranchBuild = serde_json::from_value(json!({"id": 8})).unwrap();
        assert_eq!(build.status.as_str(), "");
        assert!(build.in_progress());
    }

    #[test]
    fn test_only_completed_counts_as_finished() {
        for status in ["notStarted", "inProgress", "cancelling", "pending"] {
            assert!(!BuildStatus::new(status).is_completed(), "{status}");
        }
        assert!(BuildStatus::new(STATUS_COMPLETED).is_completed());
    }

    #[test]
    fn test_request_bodies_match_wire_format() {
        assert_eq!(
            serde_json::to_value(CancelBuildRequest::default()).unwrap(),
            json!({"status": "cancelling"})
        );
        assert_eq!(
            serde_json::to_value(BranchConfigRequest::clone_from("main")).unwrap(),
            json!({"cloneFromBranch": "main"})
        );
        assert_eq!(
            serde_json::to_value(StartBuildRequest::default()).unwrap(),
            json!({"debug": false})
        );
    }

    #[test]
    fn test_started_build_without_id_is_rejected() {
        let parsed: Result<StartedBuild, _> =
            serde_json::from_value(json!({"buildNumber": "12"}));
        assert!(parsed.is_err());
    }
}
