//! Configuration models for the arbiter, its scheduler, and notifiers.

pub mod arbiter;

pub use arbiter::{ArbiterConfig, NotifierConfig, RuntimeConfig, SchedulerConfig};
