//! Error taxonomy for a reset run.
//!
//! One variant per remote call that can reject the run, plus `Unexpected`
//! for transport failures and unreadable success payloads. Every variant
//! names the stage it aborted.

use appcenter_client::{ClientError, RemoteResponse};

use crate::stage::Stage;

/// Errors that abort a reset run.
#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("{stage}: error getting the current build status of the branch ({response})")]
    Fetch {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: error finishing the current build ({response})")]
    Cancel {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: error getting the current settings of the branch ({response})")]
    ConfigLookup {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: error deleting the current build settings of the branch ({response})")]
    ConfigDelete {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: error setting the build configuration ({response})")]
    ConfigCreate {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: error starting build ({response})")]
    BuildTrigger {
        stage: Stage,
        response: RemoteResponse,
    },

    #[error("{stage}: the flow has failed: {message}")]
    Unexpected { stage: Stage, message: String },
}

impl ResetError {
    /// Transport-level failure of a remote call made during `stage`.
    pub fn transport(stage: Stage, err: ClientError) -> Self {
        ResetError::Unexpected {
            stage,
            message: err.to_string(),
        }
    }

    /// Success response whose payload could not be read.
    pub fn malformed(stage: Stage, what: &str, err: serde_json::Error) -> Self {
        ResetError::Unexpected {
            stage,
            message: format!("malformed {what} payload: {err}"),
        }
    }

    /// Stage the run aborted in.
    pub fn stage(&self) -> Stage {
        match self {
            ResetError::Fetch { stage, .. }
            | ResetError::Cancel { stage, .. }
            | ResetError::ConfigLookup { stage, .. }
            | ResetError::ConfigDelete { stage, .. }
            | ResetError::ConfigCreate { stage, .. }
            | ResetError::BuildTrigger { stage, .. }
            | ResetError::Unexpected { stage, .. } => *stage,
        }
    }

    /// Remote response that caused the abort, when one was received.
    pub fn response(&self) -> Option<&RemoteResponse> {
        match self {
            ResetError::Fetch { response, .. }
            | ResetError::Cancel { response, .. }
            | ResetError::ConfigLookup { response, .. }
            | ResetError::ConfigDelete { response, .. }
            | ResetError::ConfigCreate { response, .. }
            | ResetError::BuildTrigger { response, .. } => Some(response),
            ResetError::Unexpected { .. } => None,
        }
    }

    /// Taxonomy name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ResetError::Fetch { .. } => "FetchError",
            ResetError::Cancel { .. } => "CancelError",
            ResetError::ConfigLookup { .. } => "ConfigLookupError",
            ResetError::ConfigDelete { .. } => "ConfigDeleteError",
            ResetError::ConfigCreate { .. } => "ConfigCreateError",
            ResetError::BuildTrigger { .. } => "BuildTriggerError",
            ResetError::Unexpected { .. } => "UnexpectedError",
        }
    }
}

/// Result type for reset stages.
pub type ResetResult<T> = std::result::Result<T, ResetError>;
