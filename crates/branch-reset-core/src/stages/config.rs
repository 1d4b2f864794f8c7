//! Configuration-reset stage.

use appcenter_client::{AppTarget, BuildService};
use serde::Serialize;
use tracing::debug;

use crate::error::{ResetError, ResetResult};
use crate::reporter::Reporter;
use crate::stage::Stage;

const STAGE: Stage = Stage::ResetConfig;

/// What the configuration-reset stage did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigOutcome {
    /// A previous configuration existed and was deleted first
    pub replaced_existing: bool,
}

/// Make the branch configuration a fresh clone of `reference_branch`.
///
/// The service has no upsert, so an existing configuration is deleted
/// before the new one is created. A 404 on lookup means "no configuration"
/// and is not an error.
pub async fn reset_config(
    service: &dyn BuildService,
    reporter: &dyn Reporter,
    target: &AppTarget,
    branch: &str,
    reference_branch: &str,
) -> ResetResult<ConfigOutcome> {
    let lookup = service
        .get_branch_config(target, branch)
        .await
        .map_err(|e| ResetError::transport(STAGE, e))?;

    let exists = if lookup.is_ok() {
        true
    } else if lookup.is_not_found() {
        false
    } else {
        return Err(ResetError::ConfigLookup {
            stage: STAGE,
            response: lookup,
        });
    };

    if exists {
        debug!(branch = %branch, "Deleting existing branch configuration");
        let deleted = service
            .delete_branch_config(target, branch)
            .await
            .map_err(|e| ResetError::transport(STAGE, e))?;
        if !deleted.is_ok() {
            return Err(ResetError::ConfigDelete {
                stage: STAGE,
                response: deleted,
            });
        }
        reporter.notify("✅ Clean previous build configuration.");
    }

    debug!(branch = %branch, clone_from = %reference_branch, "Creating branch configuration");
    let created = service
        .create_branch_config(target, branch, reference_branch)
        .await
        .map_err(|e| ResetError::transport(STAGE, e))?;
    if !created.is_ok() {
        return Err(ResetError::ConfigCreate {
            stage: STAGE,
            response: created,
        });
    }

    reporter.notify("✅ Build configuration set.");
    Ok(ConfigOutcome {
        replaced_existing: exists,
    })
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
    async fn test_missing_config_is_created_without_delete() {
        let service = MemoryBuildService::new();
        let reporter = MemoryReporter::new();

        let outcome = reset_config(&service, &reporter, &target(), "develop", "main")
            .await
            .unwrap();

        assert!(!outcome.replaced_existing);
        assert_eq!(
            service.ops(),
            vec![ServiceOp::GetBranchConfig, ServiceOp::CreateBranchConfig]
        );
        assert_eq!(service.config_for("develop").as_deref(), Some("main"));
        assert_eq!(reporter.notices(), vec!["✅ Build configuration set.".to_string()]);
    }

    #[tokio::test]
    async fn test_existing_config_is_replaced() {
        let service = MemoryBuildService::new().with_config("develop", "release");
        let reporter = MemoryReporter::new();

        let outcome = reset_config(&service, &reporter, &target(), "develop", "main")
            .await
            .unwrap();

        assert!(outcome.replaced_existing);
        assert_eq!(service.config_for("develop").as_deref(), Some("main"));
        assert_eq!(
            reporter.notices(),
            vec![
                "✅ Clean previous build configuration.".to_string(),
                "✅ Build configuration set.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unexpected_lookup_status_is_lookup_error() {
        let service = MemoryBuildService::new()
            .respond_with(ServiceOp::GetBranchConfig, RemoteResponse::new(401, "unauthorized"));
        let reporter = MemoryReporter::new();

        let err = reset_config(&service, &reporter, &target(), "develop", "main")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConfigLookupError");
        assert_eq!(service.ops(), vec![ServiceOp::GetBranchConfig]);
    }

    #[tokio::test]
    async fn test_failed_delete_skips_create() {
        let service = MemoryBuildService::new()
            .with_config("develop", "release")
            .respond_with(ServiceOp::DeleteBranchConfig, RemoteResponse::new(500, "oops"));
        let reporter = MemoryReporter::new();

        let err = reset_config(&service, &reporter, &target(), "develop", "main")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "ConfigDeleteError");
        assert_eq!(service.count(ServiceOp::CreateBranchConfig), 0);
        assert_eq!(service.config_for("develop").as_deref(), Some("release"));
    }
}
