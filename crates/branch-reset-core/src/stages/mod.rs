//! The three stages of a reset run.
//!
//! Each stage issues its remote calls strictly one after another, checks
//! every status against the service contract and returns on the first
//! rejection. Stages report their sub-step successes through the reporter;
//! the stage banners are the orchestrator's job.

pub mod cancel;
pub mod config;
pub mod trigger;

pub use cancel::{cancel_in_progress, CancelOutcome};
pub use config::{reset_config, ConfigOutcome};
pub use trigger::trigger_build;
