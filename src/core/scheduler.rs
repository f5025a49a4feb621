//! Delayed event scheduling.
//!
//! A scheduler runs zero-argument callbacks at a caller-chosen point in the
//! future. Implementations keep a single deadline-ordered queue and one
//! worker; inserting an event always wakes the worker so a sooner deadline
//! preempts an in-progress wait for a later one.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use prometheus_resource_arbiter::config::SchedulerConfig;
//! use prometheus_resource_arbiter::core::{DelayedEventScheduler, Schedule};
//!
//! let scheduler = DelayedEventScheduler::new(&SchedulerConfig::default())?;
//! scheduler.schedule_after(Duration::from_millis(50), Box::new(|| println!("fired")))?;
//! # Ok::<(), prometheus_resource_arbiter::core::ArbiterError>(())
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod native;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::ArbiterError;
use crate::infra::queue::PendingEvent;

#[cfg(not(target_arch = "wasm32"))]
pub use native::DelayedEventScheduler;

/// Callback executed once when its event fires.
pub type EventCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstraction over delayed-event schedulers.
pub trait Schedule: Send + Sync + 'static {
    /// Run `callback` on the worker at `now + delay`.
    ///
    /// Never blocks on the worker. Events fire in deadline order, FIFO among
    /// equal deadlines, and never before their requested time.
    ///
    /// # Errors
    ///
    /// `ArbiterError::SchedulerShutdown` once [`Schedule::shutdown`] ran.
    fn schedule_after(&self, delay: Duration, callback: EventCallback) -> Result<(), ArbiterError>;

    /// Snapshot of scheduler counters.
    fn stats(&self) -> SchedulerStats;

    /// Stop the worker and discard pending events. Idempotent.
    fn shutdown(&self);
}

/// Scheduler utilization counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Events accepted by `schedule_after`.
    pub scheduled: u64,
    /// Callbacks that ran to completion.
    pub fired: u64,
    /// Callbacks that panicked.
    pub failed: u64,
    /// Events dropped by shutdown before firing.
    pub discarded: u64,
    /// Events still waiting.
    pub pending: usize,
}

/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub scheduled: AtomicU64,
    pub fired: AtomicU64,
    pub failed: AtomicU64,
    pub discarded: AtomicU64,
}

impl SchedulerCounters {
    pub fn snapshot(&self, pending: usize) -> SchedulerStats {
        SchedulerStats {
            scheduled: self.scheduled.load(Ordering::Relaxed),
            fired: self.fired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            pending,
        }
    }
}

impl Schedule for Box<dyn Schedule> {
    fn schedule_after(&self, delay: Duration, callback: EventCallback) -> Result<(), ArbiterError> {
        (**self).schedule_after(delay, callback)
    }

    fn stats(&self) -> SchedulerStats {
        (**self).stats()
    }

    fn shutdown(&self) {
        (**self).shutdown();
    }
}

/// Run one due callback, isolating panics from the worker loop.
pub(crate) fn fire_event(counters: &SchedulerCounters, event: PendingEvent<EventCallback>) {
    let seq = event.seq;
    let lateness = event.fire_at.elapsed();

    match panic::catch_unwind(AssertUnwindSafe(event.payload)) {
        Ok(()) => {
            counters.fired.fetch_add(1, Ordering::Relaxed);
            debug!(seq = seq, ?lateness, "event fired");
        }
        Err(payload) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                seq = seq,
                reason = %panic_message(payload.as_ref()),
                "scheduled callback panicked, continuing"
            );
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
