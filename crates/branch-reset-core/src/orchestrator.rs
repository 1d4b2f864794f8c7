//! Reset run orchestration.
//!
//! Drives the three stages strictly in order:
//!
//! `Init → CancellingIfNeeded → ResettingConfig → TriggeringBuild → Succeeded`
//!
//! Any stage error moves the run straight to `Failed`. Completed stages are
//! not rolled back.

use std::sync::Arc;
use std::time::Instant;

use appcenter_client::{ApiToken, AppTarget, BuildId, BuildService};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ResetResult;
use crate::obs;
use crate::reporter::{Reporter, BUILD_ID_OUTPUT};
use crate::stage::Stage;
use crate::stages;

/// The caller inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub token: ApiToken,
    pub owner: String,
    pub app: String,
    /// Branch to reset and rebuild
    pub branch: String,
    /// Branch whose configuration is cloned
    pub reference_branch: String,
}

impl RunParams {
    pub fn new(token: &str, owner: &str, app: &str, branch: &str, reference_branch: &str) -> Self {
        Self {
            token: ApiToken::new(token),
            owner: owner.to_string(),
            app: app.to_string(),
            branch: branch.to_string(),
            reference_branch: reference_branch.to_string(),
        }
    }

    pub fn target(&self) -> AppTarget {
        AppTarget {
            owner: self.owner.clone(),
            app: self.app.clone(),
            token: self.token.clone(),
        }
    }
}

/// States of the orchestration state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    CancellingIfNeeded,
    ResettingConfig,
    TriggeringBuild,
    Succeeded,
    Failed,
}

impl RunState {
    /// State the run is in while `stage` executes.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::CancelBuild => RunState::CancellingIfNeeded,
            Stage::ResetConfig => RunState::ResettingConfig,
            Stage::TriggerBuild => RunState::TriggeringBuild,
        }
    }
}

/// Terminal outcome of a run. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Succeeded { build_id: BuildId },
    Failed {
        stage: Stage,
        /// Error taxonomy name, e.g. `ConfigLookupError`
        kind: &'static str,
        message: String,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }

    pub fn build_id(&self) -> Option<&BuildId> {
        match self {
            RunOutcome::Succeeded { build_id } => Some(build_id),
            RunOutcome::Failed { .. } => None,
        }
    }
}

/// Record of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// States visited, in order, ending with a terminal one
    pub states: Vec<RunState>,
    pub outcome: RunOutcome,
}

/// Build reset orchestrator.
pub struct ResetOrchestrator {
    service: Arc<dyn BuildService>,
    reporter: Arc<dyn Reporter>,
}

impl ResetOrchestrator {
    pub fn new(service: Arc<dyn BuildService>, reporter: Arc<dyn Reporter>) -> Self {
        Self { service, reporter }
    }

    /// Execute a full run and report its outcome.
    ///
    /// On success the build id is published as `build_id`; on failure a
    /// single failure message is reported. Never both.
    pub async fn run(&self, params: &RunParams) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = obs::run_span(&run_id.to_string());
        self.run_with_id(run_id, params).instrument(span).await
    }

    async fn run_with_id(&self, run_id: Uuid, params: &RunParams) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_label = run_id.to_string();

        obs::emit_run_started(
            &run_label,
            &params.owner,
            &params.app,
            &params.branch,
            &params.reference_branch,
        );

        let mut states = vec![RunState::Init];
        let outcome = match self.drive(&run_label, params, &mut states).await {
            Ok(build_id) => {
                states.push(RunState::Succeeded);
                self.reporter.publish(BUILD_ID_OUTPUT, build_id.as_str());
                RunOutcome::Succeeded { build_id }
            }
            Err(err) => {
                states.push(RunState::Failed);
                obs::emit_run_failed(&run_label, err.stage(), err.kind(), &err);
                let message = format!("❌ {}", err);
                self.reporter.fail(&message);
                RunOutcome::Failed {
                    stage: err.stage(),
                    kind: err.kind(),
                    message,
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        obs::emit_run_finished(&run_label, duration_ms, outcome.is_success());

        RunReport {
            run_id,
            started_at,
            duration_ms,
            states,
            outcome,
        }
    }

    async fn drive(
        &self,
        run_id: &str,
        params: &RunParams,
        states: &mut Vec<RunState>,
    ) -> ResetResult<BuildId> {
        let target = params.target();
        let service = self.service.as_ref();
        let reporter = self.reporter.as_ref();

        let started = self.enter(run_id, Stage::CancelBuild, states);
        stages::cancel_in_progress(service, reporter, &target, &params.branch).await?;
        obs::emit_stage_finished(run_id, Stage::CancelBuild, elapsed_ms(started));

        let started = self.enter(run_id, Stage::ResetConfig, states);
        stages::reset_config(
            service,
            reporter,
            &target,
            &params.branch,
            &params.reference_branch,
        )
        .await?;
        obs::emit_stage_finished(run_id, Stage::ResetConfig, elapsed_ms(started));

        let started = self.enter(run_id, Stage::TriggerBuild, states);
        let build_id = stages::trigger_build(service, reporter, &target, &params.branch).await?;
        obs::emit_stage_finished(run_id, Stage::TriggerBuild, elapsed_ms(started));

        Ok(build_id)
    }

    fn enter(&self, run_id: &str, stage: Stage, states: &mut Vec<RunState>) -> Instant {
        states.push(RunState::for_stage(stage));
        obs::emit_stage_started(run_id, stage);
        self.reporter.notify(&stage.banner());
        Instant::now()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_params_target() {
        let params = RunParams::new("tok", "acme", "mobile", "develop", "main");
        let target = params.target();
        assert_eq!(target.owner, "acme");
        assert_eq!(target.app, "mobile");
        assert_eq!(target.token.expose(), "tok");
        assert!(!format!("{:?}", params).contains("\"tok\""));
    }

    #[test]
    fn test_run_state_for_stage() {
        assert_eq!(
            RunState::for_stage(Stage::CancelBuild),
            RunState::CancellingIfNeeded
        );
        assert_eq!(RunState::for_stage(Stage::ResetConfig), RunState::ResettingConfig);
        assert_eq!(RunState::for_stage(Stage::TriggerBuild), RunState::TriggeringBuild);
    }

    #[test]
    fn test_run_outcome_serialization() {
        let ok = RunOutcome::Succeeded {
            build_id: BuildId::new("b123"),
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["build_id"], "b123");
        assert_eq!(ok.build_id().map(|id| id.as_str()), Some("b123"));

        let failed = RunOutcome::Failed {
            stage: Stage::ResetConfig,
            kind: "ConfigLookupError",
            message: "❌ boom".to_string(),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "reset_config");
        assert_eq!(json["kind"], "ConfigLookupError");
        assert!(!failed.is_success());
    }
}
