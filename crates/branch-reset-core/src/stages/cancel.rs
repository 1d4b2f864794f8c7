//! Build-cancellation stage.

use appcenter_client::{AppTarget, BranchBuild, BuildId, BuildService};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ResetError, ResetResult};
use crate::reporter::Reporter;
use crate::stage::Stage;

const STAGE: Stage = Stage::CancelBuild;

/// What the cancellation stage did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// No builds, or the newest one already completed
    NothingInProgress,
    /// Cancellation of this build was accepted
    Cancelled(BuildId),
}

/// Cancel the branch's newest build when it has not completed.
///
/// The list is newest first, so only its head is inspected.
pub async fn cancel_in_progress(
    service: &dyn BuildService,
    reporter: &dyn Reporter,
    target: &AppTarget,
    branch: &str,
) -> ResetResult<CancelOutcome> {
    let listed = service
        .list_builds(target, branch)
        .await
        .map_err(|e| ResetError::transport(STAGE, e))?;
    if !listed.is_ok() {
        return Err(ResetError::Fetch {
            stage: STAGE,
            response: listed,
        });
    }

    // Older entries are never read, so their shape does not matter
    let builds: Vec<Value> = listed
        .json()
        .map_err(|e| ResetError::malformed(STAGE, "build list", e))?;
    let latest = match builds.into_iter().next() {
        Some(head) => serde_json::from_value::<BranchBuild>(head)
            .map_err(|e| ResetError::malformed(STAGE, "latest build", e))?,
        None => return Ok(nothing_in_progress(reporter)),
    };
    if !latest.in_progress() {
        return Ok(nothing_in_progress(reporter));
    }

    debug!(build_id = %latest.id, status = %latest.status, "Cancelling in-progress build");
    let cancelled = service
        .cancel_build(target, &latest.id)
        .await
        .map_err(|e| ResetError::transport(STAGE, e))?;
    if !cancelled.is_ok() {
        return Err(ResetError::Cancel {
            stage: STAGE,
            response: cancelled,
        });
    }

    reporter.notify("✅ Current build stopped.");
    Ok(CancelOutcome::Cancelled(latest.id))
}

fn nothing_in_progress(reporter: &dyn Reporter) -> CancelOutcome {
    reporter.notify("✅ No build in progress.");
    CancelOutcome::NothingInProgress
}
