//! Runtime adapters and API surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_scheduler;

pub use api::{dispatch, health, Health, Request};
#[cfg(feature = "tokio-runtime")]
pub use tokio_scheduler::TokioDelayedScheduler;
