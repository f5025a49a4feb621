//! Outbound notification boundary.

use crate::core::ArbiterError;
use crate::util::serde::Notification;

/// Capability to deliver notifications to one client+resource pair.
///
/// Captured at registration and invoked on the scheduler worker, so
/// implementations should return promptly: a blocking `notify` stalls every
/// later event.
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// `ArbiterError::DeliveryFailure` when the client cannot be reached.
    /// The arbiter logs and drops the failure; it is never retried.
    fn notify(&self, notification: &Notification) -> Result<(), ArbiterError>;
}
