//! Build-trigger stage.

use appcenter_client::{AppTarget, BuildId, BuildService, StartedBuild};

use crate::error::{ResetError, ResetResult};
use crate::reporter::Reporter;
use crate::stage::Stage;

const STAGE: Stage = Stage::TriggerBuild;

/// Queue a non-debug build for the branch and return its id.
///
/// Does not wait for the build to run.
pub async fn trigger_build(
    service: &dyn BuildService,
    reporter: &dyn Reporter,
    target: &AppTarget,
    branch: &str,
) -> ResetResult<BuildId> {
    let started = service
        .start_build(target, branch)
        .await
        .map_err(|e| ResetError::transport(STAGE, e))?;
    if !started.is_ok() {
        return Err(ResetError::BuildTrigger {
            stage: STAGE,
            response: started,
        });
    }

    let build: StartedBuild = started
        .json()
        .map_err(|e| ResetError::malformed(STAGE, "started build", e))?;

    reporter.notify(&format!(
        "✅ Build started successfully with id: {}.",
        build.id
    ));
    Ok(build.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::MemoryReporter;
    use appcenter_client::fakes::MemoryBuildService;
    use appcenter_client::{RemoteResponse, ServiceOp};

    fn target() -> AppTarget {
        AppTarget::new("token", "acme", "mobile")
    }

    #[tokio::test]
    async fn test_numeric_id_is_returned_as_text() {
        let service = MemoryBuildService::new().with_next_build_id(41);
        let reporter = MemoryReporter::new();

        let id = trigger_build(&service, &reporter, &target(), "develop")
            .await
            .unwrap();

        assert_eq!(id.as_str(), "42");
        assert_eq!(
            reporter.notices(),
            vec!["✅ Build started successfully with id: 42.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_success_without_id_is_unexpected() {
        let service = MemoryBuildService::new()
            .respond_with(ServiceOp::StartBuild, RemoteResponse::new(200, "{}"));
        let reporter = MemoryReporter::new();

        let err = trigger_build(&service, &reporter, &target(), "develop")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "UnexpectedError");
        assert!(reporter.notices().is_empty());
    }
}
