//! App Center build service client
//!
//! This crate is the remote side of branch-reset. It exposes:
//! - `BuildService`: the six build/branch-configuration calls the reset
//!   workflow depends on, as an async trait
//! - `AppCenterClient`: the reqwest-backed implementation against the
//!   App Center REST API
//! - `fakes::MemoryBuildService`: an in-memory service for tests
//!
//! The client reports every completed HTTP exchange as a `RemoteResponse`
//! (status + body). Deciding which statuses are acceptable is left to the
//! caller; only transport failures surface as `ClientError`.

pub mod error;
pub mod fakes;
pub mod http;
pub mod model;
pub mod service;

pub use error::ClientError;
pub use http::{AppCenterClient, AppCenterConfig, DEFAULT_API_URL};
pub use model::{
    BranchBuild, BranchConfigRequest, BuildId, BuildStatus, CancelBuildRequest, StartBuildRequest,
    StartedBuild,
};
pub use service::{
    ApiToken, AppTarget, BuildService, RemoteResponse, ServiceOp, ServiceResult, STATUS_NOT_FOUND,
    STATUS_OK,
};
