//! Reset workflow stage definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three stages of a reset run, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Cancel the branch's newest build if it has not completed
    CancelBuild,

    /// Replace the branch configuration with a clone of the reference branch
    ResetConfig,

    /// Queue a new non-debug build
    TriggerBuild,
}

impl Stage {
    /// Get the stage name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::CancelBuild => "cancel_build",
            Stage::ResetConfig => "reset_config",
            Stage::TriggerBuild => "trigger_build",
        }
    }

    /// 1-based position shown in progress notices.
    pub fn step(&self) -> u8 {
        match self {
            Stage::CancelBuild => 1,
            Stage::ResetConfig => 2,
            Stage::TriggerBuild => 3,
        }
    }

    /// Human-readable stage title.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::CancelBuild => "Check if there is a build in progress",
            Stage::ResetConfig => "Set build configuration",
            Stage::TriggerBuild => "Start build",
        }
    }

    /// Notice emitted when the stage starts.
    pub fn banner(&self) -> String {
        format!("🔄 Step {}: {}", self.step(), self.title())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
