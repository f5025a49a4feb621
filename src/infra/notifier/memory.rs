//! In-memory notifier that records every delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::{ArbiterError, Notifier};
use crate::util::serde::Notification;

/// A notification together with its arrival time.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// What was delivered.
    pub notification: Notification,
    /// Monotonic arrival time.
    pub received_at: Instant,
}

/// Notifier for development and testing: stores deliveries and lets callers
/// block until a number of them arrived.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    arrived: Condvar,
    unreachable: AtomicBool,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail, simulating a vanished client.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Release);
    }

    /// Snapshot of delivered notifications, in arrival order.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.deliveries
            .lock()
            .iter()
            .map(|d| d.notification.clone())
            .collect()
    }

    /// Snapshot of deliveries with arrival times.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Number of deliveries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// True when nothing was delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until at least `count` deliveries arrived or `timeout` elapsed,
    /// then return everything received so far.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Delivery> {
        let deadline = Instant::now() + timeout;
        let mut deliveries = self.deliveries.lock();
        while deliveries.len() < count {
            if self.arrived.wait_until(&mut deliveries, deadline).timed_out() {
                break;
            }
        }
        deliveries.clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), ArbiterError> {
        if self.unreachable.load(Ordering::Acquire) {
            return Err(ArbiterError::DeliveryFailure("client unreachable".into()));
        }
        self.deliveries.lock().push(Delivery {
            notification: notification.clone(),
            received_at: Instant::now(),
        });
        self.arrived.notify_all();
        Ok(())
    }
}
