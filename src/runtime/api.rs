//! API-facing request/response models.
//!
//! A transport decodes an inbound message into a [`Request`], hands it to
//! [`dispatch`] together with the sender's identity and outbound handle, and
//! writes the returned [`StatusReply`] back. Errors never escape `dispatch`;
//! they are folded into the reply's error code and message.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{ArbitrationPolicy, Notifier, ResourceArbiter, Schedule, SchedulerStats};
use crate::util::serde::{ClientId, MessageType, RequestNo, ResourceId, ResourceRecord, StatusReply};

/// Inbound request from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Create or overwrite a claim.
    Register {
        /// Claim to create.
        record: ResourceRecord,
    },
    /// Replace the masks of an existing claim.
    Update {
        /// New masks.
        record: ResourceRecord,
    },
    /// Ask for a grant.
    Acquire {
        /// Resource set identifier.
        id: ResourceId,
        /// Request number echoed in the reply.
        reqno: RequestNo,
    },
    /// Give resources back.
    Release {
        /// Resource set identifier.
        id: ResourceId,
        /// Request number echoed in the reply.
        reqno: RequestNo,
    },
    /// Remove a claim.
    Unregister {
        /// Resource set identifier.
        id: ResourceId,
        /// Request number echoed in the reply.
        reqno: RequestNo,
    },
}

impl Request {
    /// Wire message type of this request.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Register { .. } => MessageType::Register,
            Self::Update { .. } => MessageType::Update,
            Self::Acquire { .. } => MessageType::Acquire,
            Self::Release { .. } => MessageType::Release,
            Self::Unregister { .. } => MessageType::Unregister,
        }
    }

    /// Resource set the request refers to.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        match self {
            Self::Register { record } | Self::Update { record } => record.id,
            Self::Acquire { id, .. } | Self::Release { id, .. } | Self::Unregister { id, .. } => *id,
        }
    }

    /// Request number to echo.
    #[must_use]
    pub const fn reqno(&self) -> RequestNo {
        match self {
            Self::Register { record } | Self::Update { record } => record.reqno,
            Self::Acquire { reqno, .. }
            | Self::Release { reqno, .. }
            | Self::Unregister { reqno, .. } => *reqno,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { record } | Self::Update { record } => {
                write!(f, "{} {record}", self.message_type())
            }
            _ => write!(
                f,
                "{} id={} reqno={}",
                self.message_type(),
                self.id(),
                self.reqno()
            ),
        }
    }
}

/// Route a request to the arbiter and build the status reply.
///
/// `outbound` is only retained for `Register`; other requests reuse the
/// handle stored with the claim.
pub fn dispatch<S, P>(
    arbiter: &ResourceArbiter<S, P>,
    client: &ClientId,
    request: Request,
    outbound: &Arc<dyn Notifier>,
) -> StatusReply
where
    S: Schedule,
    P: ArbitrationPolicy,
{
    let id = request.id();
    let reqno = request.reqno();
    debug!(client = %client, "received {request}");

    let result = match request {
        Request::Register { record } => arbiter.register(client, record, Arc::clone(outbound)),
        Request::Update { record } => arbiter.update(client, record),
        Request::Acquire { id, reqno } => arbiter.acquire(client, id, reqno),
        Request::Release { id, reqno } => arbiter.release(client, id, reqno),
        Request::Unregister { id, reqno } => arbiter.unregister(client, id, reqno),
    };

    result.unwrap_or_else(|e| {
        warn!(client = %client, resource_id = id, reqno = reqno, error = %e, "request rejected");
        StatusReply::error(id, reqno, e.code(), e.to_string())
    })
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag; false once the scheduler stopped accepting events.
    pub ok: bool,
    /// Clients holding at least one claim.
    pub clients: usize,
    /// Notifications waiting to fire.
    pub pending_notifications: usize,
    /// Callbacks that panicked so far.
    pub failed_callbacks: u64,
}

/// Summarize arbiter state for a health endpoint.
#[must_use]
pub fn health<S, P>(arbiter: &ResourceArbiter<S, P>) -> Health
where
    S: Schedule,
    P: ArbitrationPolicy,
{
    let SchedulerStats {
        pending, failed, ..
    } = arbiter.scheduler_stats();
    Health {
        ok: !arbiter.is_shut_down(),
        clients: arbiter.client_count(),
        pending_notifications: pending,
        failed_callbacks: failed,
    }
}
