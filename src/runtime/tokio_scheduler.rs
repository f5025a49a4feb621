//! Tokio runtime scheduler implementation.
//!
//! Same queue and ordering rules as the native scheduler, but the worker is a
//! task on a tokio runtime. The task sleeps until the head deadline or until
//! an insert signals it, whichever comes first.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::scheduler::{fire_event, SchedulerCounters};
use crate::core::{ArbiterError, EventCallback, Schedule, SchedulerStats};
use crate::infra::queue::{DeadlineQueue, PendingEvent};

struct TaskState {
    queue: DeadlineQueue<EventCallback>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<TaskState>,
    wakeup: Notify,
    counters: SchedulerCounters,
}

enum Step {
    Fire(PendingEvent<EventCallback>),
    Sleep(Option<Instant>),
    Exit,
}

/// Scheduler whose worker is a task on a tokio runtime.
///
/// Callbacks run inline on the worker task and must not block for long.
pub struct TokioDelayedScheduler {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TokioDelayedScheduler {
    /// Spawn the worker task on `handle`.
    #[must_use]
    pub fn new(handle: &Handle) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(TaskState {
                queue: DeadlineQueue::new(),
                shutdown: false,
            }),
            wakeup: Notify::new(),
            counters: SchedulerCounters::default(),
        });
        let task = handle.spawn(run_task(Arc::clone(&shared)));
        info!("TokioDelayedScheduler started");
        Self {
            shared,
            task: Mutex::new(Some(task)),
        }
    }

    /// Spawn the worker task on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// `ArbiterError::Backend` when called outside a tokio runtime.
    pub fn spawn_current() -> Result<Self, ArbiterError> {
        let handle = Handle::try_current()
            .map_err(|e| ArbiterError::Backend(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(&handle))
    }

    /// Wait for the worker task to exit after [`Schedule::shutdown`].
    pub async fn join(&self) {
        let task = self.task.lock().take();
        if let Some(task) = task {
            if task.await.is_err() {
                debug!("Scheduler task cancelled or panicked");
            }
        }
    }
}

impl Schedule for TokioDelayedScheduler {
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

        // Stores a permit if the task is not waiting yet.
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
                return;
            }
            state.shutdown = true;
            std::mem::take(&mut state.queue)
        };
        self.shared.wakeup.notify_one();

        let count = discarded.len();
        self.shared
            .counters
            .discarded
            .fetch_add(count as u64, Ordering::Relaxed);
        drop(discarded);
        info!(discarded = count, "Shutting down scheduler");
    }
}

impl Drop for TokioDelayedScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_task(shared: Arc<Shared>) {
    debug!("Scheduler task started");
    loop {
        let step = {
            let mut state = shared.state.lock();
            if state.shutdown {
                Step::Exit
            } else if let Some(event) = state.queue.pop_due(Instant::now()) {
                Step::Fire(event)
            } else {
                Step::Sleep(state.queue.next_deadline())
            }
        };

        match step {
            Step::Exit => break,
            Step::Fire(event) => fire_event(&shared.counters, event),
            Step::Sleep(Some(deadline)) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline.into()) => {}
                    () = shared.wakeup.notified() => {}
                }
            }
            Step::Sleep(None) => shared.wakeup.notified().await,
        }
    }
    debug!("Scheduler task exiting");
}
