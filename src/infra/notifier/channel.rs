//! Channel-backed notifier for transport adapters.
//!
//! The transport owns the receiving end and forwards each notification to the
//! client. Sending never blocks: a full or closed channel is reported as a
//! delivery failure, so a stalled client cannot hold up the scheduler.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::NotifierConfig;
use crate::core::{ArbiterError, Notifier};
use crate::util::serde::Notification;

/// Non-blocking notifier writing into a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the transport drains.
    #[must_use]
    pub fn bounded(depth: usize) -> (Self, Receiver<Notification>) {
        let (tx, rx) = bounded(depth);
        (Self { tx }, rx)
    }

    /// Create a notifier sized by `config.queue_depth`.
    #[must_use]
    pub fn from_config(config: &NotifierConfig) -> (Self, Receiver<Notification>) {
        Self::bounded(config.queue_depth)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), ArbiterError> {
        match self.tx.try_send(notification.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(ArbiterError::DeliveryFailure("client queue full".into()))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(ArbiterError::DeliveryFailure("client disconnected".into()))
            }
        }
    }
}
