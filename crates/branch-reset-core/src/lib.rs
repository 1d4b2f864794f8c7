//! branch-reset core library
//!
//! Resets an App Center branch build in three strictly ordered stages:
//!
//! 1. cancel the branch's newest build if it has not completed
//! 2. replace the branch configuration with a clone of a reference branch
//! 3. queue a new build and publish its id
//!
//! The first failing remote call aborts the run. Progress, the resulting
//! build id and the failure message all go through a [`Reporter`], so the
//! orchestrator can be driven by fakes in tests.

pub mod error;
pub mod obs;
pub mod orchestrator;
pub mod reporter;
pub mod stage;
pub mod stages;
pub mod telemetry;

pub use error::{ResetError, ResetResult};
pub use obs::{
    emit_run_failed, emit_run_finished, emit_run_started, emit_stage_finished,
    emit_stage_started, run_span,
};
pub use orchestrator::{ResetOrchestrator, RunOutcome, RunParams, RunReport, RunState};
pub use reporter::{ActionsReporter, MemoryReporter, Reporter, BUILD_ID_OUTPUT};
pub use stage::Stage;
pub use stages::{CancelOutcome, ConfigOutcome};
pub use telemetry::init_tracing;
