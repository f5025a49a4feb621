//! Audit sink implementations.
//!
//! Records claim lifecycle and notification outcomes for later inspection.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::serde::{ClientId, ResourceId};

/// What happened to a claim or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Claim created or overwritten.
    Register,
    /// Claim masks replaced.
    Update,
    /// Grant decision requested.
    Acquire,
    /// Revocation requested.
    Release,
    /// Claim removed.
    Unregister,
    /// Notification handed to the client.
    Deliver,
    /// Notification dropped at fire time.
    Drop,
    /// Client could not be reached.
    DeliveryFailed,
}

impl AuditAction {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Update => "update",
            Self::Acquire => "acquire",
            Self::Release => "release",
            Self::Unregister => "unregister",
            Self::Deliver => "deliver",
            Self::Drop => "drop",
            Self::DeliveryFailed => "delivery_failed",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Client the event concerns.
    pub client: String,
    /// Resource set the event concerns.
    pub resource_id: ResourceId,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub payload: Option<String>,
}

/// Audit sink abstraction. Called from both the dispatch path and the
/// scheduler worker.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Actions of stored events, oldest first.
    #[must_use]
    pub fn actions(&self) -> Vec<AuditAction> {
        self.events.lock().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event with a fresh id and timestamp.
pub fn build_audit_event(
    client: &ClientId,
    resource_id: ResourceId,
    action: AuditAction,
    payload: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: uuid::Uuid::new_v4().to_string(),
        client: client.to_string(),
        resource_id,
        action,
        created_at_ms: now_ms(),
        payload,
    }
}
