//! Infrastructure adapters for queues and notification delivery.

pub mod notifier;
pub mod queue;

pub use notifier::{ChannelNotifier, RecordingNotifier};
pub use queue::DeadlineQueue;
