//! Error types for arbitration and scheduling.

use thiserror::Error;

use crate::util::serde::ResourceId;

/// `ENOENT`: the referenced claim does not exist.
pub const ERRCOD_NOT_REGISTERED: i32 = 2;
/// `EIO`: backend or runtime failure.
pub const ERRCOD_BACKEND: i32 = 5;
/// `EINVAL`: malformed resource masks or configuration.
pub const ERRCOD_INVALID: i32 = 22;
/// `ESHUTDOWN`: the scheduler no longer accepts events.
pub const ERRCOD_SHUTDOWN: i32 = 108;

/// Errors produced by arbiter components.
#[derive(Debug, Error)]
pub enum ArbiterError {
    /// The (client, resource id) pair has no claim.
    #[error("resource set {resource_id} is not registered")]
    NotRegistered {
        /// Resource set the request referred to.
        resource_id: ResourceId,
    },
    /// Masks failed validation.
    #[error("invalid resource set: {0}")]
    InvalidResourceSet(String),
    /// A notification could not reach its client.
    #[error("delivery failure: {0}")]
    DeliveryFailure(String),
    /// The scheduler has been shut down.
    #[error("scheduler shut down")]
    SchedulerShutdown,
    /// Configuration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl ArbiterError {
    /// Errno-style code reported in a status reply.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::NotRegistered { .. } => ERRCOD_NOT_REGISTERED,
            Self::InvalidResourceSet(_) | Self::InvalidConfig(_) => ERRCOD_INVALID,
            Self::SchedulerShutdown => ERRCOD_SHUTDOWN,
            Self::DeliveryFailure(_) | Self::Backend(_) => ERRCOD_BACKEND,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
