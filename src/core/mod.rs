//! Core arbitration abstractions: claims, scheduling, and delivery.

pub mod arbiter;
pub mod audit;
pub mod error;
pub mod notify;
pub mod policy;
pub mod registry;
pub mod scheduler;

pub use arbiter::ResourceArbiter;
pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, ArbiterError};
pub use notify::Notifier;
pub use policy::{ArbitrationPolicy, GrantMandatory};
pub use registry::{validate_record, ResourceClaim, ResourceRegistry};
#[cfg(not(target_arch = "wasm32"))]
pub use scheduler::DelayedEventScheduler;
pub use scheduler::{EventCallback, Schedule, SchedulerStats};
