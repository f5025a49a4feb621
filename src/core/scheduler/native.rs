//! Native implementation of the scheduler on a dedicated OS thread.
//!
//! # Design Principles
//!
//! - **No polling**: the worker blocks on a `Condvar`, either indefinitely
//!   (empty queue) or until the head deadline
//! - **Unconditional wake**: every insert notifies the worker, which then
//!   re-reads the head deadline
//! - **Unlocked callbacks**: the queue lock is released while a callback runs,
//!   so callbacks may schedule further events

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::ArbiterError;
use crate::infra::queue::DeadlineQueue;

use super::{fire_event, EventCallback, Schedule, SchedulerCounters, SchedulerStats};

/// Queue plus lifecycle flag, guarded together by one mutex.
struct SchedulerState {
    queue: DeadlineQueue<EventCallback>,
    shutdown: bool,
}

/// State shared between the handle and the worker thread.
struct Shared {
    state: Mutex<SchedulerState>,
    /// Signaled on every insert and on shutdown.
    wakeup: Condvar,
    counters: SchedulerCounters,
}

/// Single-worker scheduler that runs callbacks at a future time.
///
/// Dropping the scheduler shuts it down; pending events are discarded.
pub struct DelayedEventScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedEventScheduler {
    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::InvalidConfig` if the configuration is invalid
    /// - `ArbiterError::Backend` if the thread cannot be spawned
    pub fn new(config: &SchedulerConfig) -> Result<Self, ArbiterError> {
        config.validate().map_err(ArbiterError::InvalidConfig)?;

        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                queue: DeadlineQueue::new(),
                shutdown: false,
            }),
            wakeup: Condvar::new(),
            counters: SchedulerCounters::default(),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .stack_size(config.stack_size)
            .spawn(move || run_worker(&worker_shared))
            .map_err(|e| {
                error!(thread = %config.thread_name, error = %e, "failed to spawn scheduler worker");
                ArbiterError::Backend(format!("failed to spawn scheduler worker: {e}"))
            })?;

        info!(
            thread = %config.thread_name,
            stack_size = config.stack_size,
            "DelayedEventScheduler started"
        );

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Convenience wrapper that boxes `callback`.
    ///
    /// # Errors
    ///
    /// `ArbiterError::SchedulerShutdown` once the scheduler is shut down.
    pub fn schedule_fn<F>(&self, delay: Duration, callback: F) -> Result<(), ArbiterError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_after(delay, Box::new(callback))
    }
}

impl Schedule for DelayedEventScheduler {
    fn schedule_after(&self, delay: Duration, callback: EventCallback) -> Result<(), ArbiterError> {
        let fire_at = Instant::now()
            .checked_add(delay)
            .ok_or_else(|| ArbiterError::Backend(format!("delay {delay:?} overflows the clock")))?;

        let seq = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                return Err(ArbiterError::SchedulerShutdown);
            }
            state.queue.push(fire_at, callback)
        };
        self.shared.counters.scheduled.fetch_add(1, Ordering::Relaxed);

        // Always wake: the new event may be sooner than the current wait.
        self.shared.wakeup.notify_one();
        debug!(seq = seq, ?delay, "event scheduled");
        Ok(())
    }

    fn stats(&self) -> SchedulerStats {
        let pending = self.shared.state.lock().queue.len();
        self.shared.counters.snapshot(pending)
    }

    fn shutdown(&self) {
        let discarded = {
            let mut state = self.shared.state.lock();
            if state.shutdown {
                None
            } else {
                state.shutdown = true;
                Some(std::mem::take(&mut state.queue))
            }
        };
        self.shared.wakeup.notify_all();

        if let Some(queue) = discarded {
            let count = queue.len();
            self.shared
                .counters
                .discarded
                .fetch_add(count as u64, Ordering::Relaxed);
            // Callbacks are dropped outside the lock.
            drop(queue);
            info!(discarded = count, "Shutting down scheduler");
        }

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Last handle dropped from inside a callback; the loop exits on its own.
            debug!("Scheduler shut down from its own worker, not joining");
            return;
        }
        if handle.join().is_err() {
            warn!("Scheduler worker panicked");
        } else {
            debug!("Scheduler worker joined");
        }
    }
}

impl Drop for DelayedEventScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker loop: wait for the head deadline (or a signal), fire due events.
fn run_worker(shared: &Shared) {
    debug!("Scheduler worker started");

    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            break;
        }

        if let Some(event) = state.queue.pop_due(Instant::now()) {
            MutexGuard::unlocked(&mut state, || fire_event(&shared.counters, event));
            continue;
        }

        match state.queue.next_deadline() {
            Some(deadline) => {
                // Timeout and signal are handled alike: re-check the head.
                let _ = shared.wakeup.wait_until(&mut state, deadline);
            }
            None => shared.wakeup.wait(&mut state),
        }
    }

    debug!("Scheduler worker exiting");
}
