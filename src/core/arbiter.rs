//! Arbitration state machine and delayed notification delivery.
//!
//! Every inbound operation mutates the registry under its lock and returns a
//! [`StatusReply`] immediately. Register, acquire and release additionally
//! schedule a notification that fires after the decision delay. When it
//! fires, the callback re-validates the claim under the same lock, computes
//! the decision, releases the lock and only then delivers.
//!
//! Pending notifications are never retracted from the scheduler. With
//! supersession enabled (the default) each claim remembers the ticket of the
//! latest scheduled advice and grant, and a firing callback whose ticket no
//! longer matches is dropped. A rapid acquire/release pair therefore yields a
//! single grant reflecting the release, and a claim re-registered after
//! unregister never receives its predecessor's notifications.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ArbiterConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::{
    ArbiterError, ArbitrationPolicy, GrantMandatory, Notifier, ResourceClaim, ResourceRegistry,
    Schedule, SchedulerStats,
};
use crate::util::serde::{
    ClientId, Notification, RequestNo, ResourceId, ResourceRecord, ResourceSet, StatusReply,
};

/// Which notification a pending callback will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Advice after registration.
    Advise,
    /// Grant after acquire.
    Grant,
    /// Empty grant after release.
    Revoke,
}

/// Everything a fired callback needs to find and notify its claim.
#[derive(Debug)]
struct PendingNotification {
    client: ClientId,
    id: ResourceId,
    reqno: RequestNo,
    decision: Decision,
    ticket: u64,
}

/// Outcome of re-validating a claim at fire time.
enum Resolution {
    Deliver(Arc<dyn Notifier>, Notification),
    Unregistered,
    Superseded,
}

/// State shared between the arbiter and its scheduled callbacks.
struct DeliveryContext<P> {
    registry: Arc<Mutex<ResourceRegistry>>,
    policy: Arc<P>,
    audit: Option<Arc<dyn AuditSink>>,
    supersede_stale: bool,
}

impl<P: ArbitrationPolicy> DeliveryContext<P> {
    fn resolve(&self, pending: &PendingNotification) -> Resolution {
        let registry = self.registry.lock();
        let Some(claim) = registry.get(&pending.client, pending.id) else {
            return Resolution::Unregistered;
        };

        let current = match pending.decision {
            Decision::Advise => claim.advice_ticket(),
            Decision::Grant | Decision::Revoke => claim.grant_ticket(),
        };
        if self.supersede_stale && current != pending.ticket {
            return Resolution::Superseded;
        }

        let notification = match pending.decision {
            Decision::Advise => {
                Notification::advice(pending.id, pending.reqno, self.policy.advise(claim))
            }
            Decision::Grant => {
                Notification::grant(pending.id, pending.reqno, self.policy.decide(claim))
            }
            Decision::Revoke => Notification::grant(pending.id, pending.reqno, ResourceSet::empty()),
        };
        Resolution::Deliver(claim.outbound(), notification)
    }

    /// Runs on the scheduler worker.
    fn deliver(&self, pending: &PendingNotification) {
        match self.resolve(pending) {
            Resolution::Deliver(outbound, notification) => match outbound.notify(&notification) {
                Ok(()) => {
                    debug!(
                        client = %pending.client,
                        resource_id = pending.id,
                        reqno = pending.reqno,
                        "delivered {notification}"
                    );
                    self.record(pending, AuditAction::Deliver, Some(notification.to_string()));
                }
                Err(e) => {
                    warn!(
                        client = %pending.client,
                        resource_id = pending.id,
                        reqno = pending.reqno,
                        error = %e,
                        "notification not delivered"
                    );
                    self.record(pending, AuditAction::DeliveryFailed, Some(e.to_string()));
                }
            },
            Resolution::Unregistered => {
                debug!(
                    client = %pending.client,
                    resource_id = pending.id,
                    "claim gone, dropping notification"
                );
                self.record(pending, AuditAction::Drop, Some("unregistered".into()));
            }
            Resolution::Superseded => {
                debug!(
                    client = %pending.client,
                    resource_id = pending.id,
                    reqno = pending.reqno,
                    "superseded by a newer request, dropping notification"
                );
                self.record(pending, AuditAction::Drop, Some("superseded".into()));
            }
        }
    }

    fn record(&self, pending: &PendingNotification, action: AuditAction, payload: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(&pending.client, pending.id, action, payload));
        }
    }
}

/// Resource arbiter: claim registry plus delayed grant/advice notifications.
pub struct ResourceArbiter<S, P = GrantMandatory>
where
    S: Schedule,
    P: ArbitrationPolicy,
{
    registry: Arc<Mutex<ResourceRegistry>>,
    scheduler: S,
    policy: Arc<P>,
    decision_delay: Duration,
    supersede_stale: bool,
    audit: Option<Arc<dyn AuditSink>>,
    shut_down: AtomicBool,
}

impl<S, P> ResourceArbiter<S, P>
where
    S: Schedule,
    P: ArbitrationPolicy,
{
    /// Create an arbiter with default delay and supersession settings.
    pub fn new(scheduler: S, policy: P) -> Self {
        let defaults = ArbiterConfig::default();
        Self {
            registry: Arc::new(Mutex::new(ResourceRegistry::new())),
            scheduler,
            policy: Arc::new(policy),
            decision_delay: defaults.decision_delay(),
            supersede_stale: defaults.supersede_stale,
            audit: None,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Set the delay between a request and its notification.
    #[must_use]
    pub const fn with_decision_delay(mut self, delay: Duration) -> Self {
        self.decision_delay = delay;
        self
    }

    /// Enable or disable dropping of superseded notifications.
    #[must_use]
    pub const fn with_supersede_stale(mut self, supersede: bool) -> Self {
        self.supersede_stale = supersede;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Create or overwrite a claim and schedule an advice.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::InvalidResourceSet` if the masks are malformed
    /// - `ArbiterError::SchedulerShutdown` if the advice cannot be scheduled
    pub fn register(
        &self,
        client: &ClientId,
        record: ResourceRecord,
        outbound: Arc<dyn Notifier>,
    ) -> Result<StatusReply, ArbiterError> {
        let ticket = self.registry.lock().register(client, &record, outbound)?;
        info!(
            client = %client,
            resource_id = record.id,
            reqno = record.reqno,
            "resource set registered"
        );
        debug!(client = %client, "register {record}");
        self.record(client, record.id, AuditAction::Register, Some(record.to_string()));

        self.schedule(PendingNotification {
            client: client.clone(),
            id: record.id,
            reqno: record.reqno,
            decision: Decision::Advise,
            ticket,
        })?;
        Ok(StatusReply::ok(record.id, record.reqno))
    }

    /// Replace the masks of an existing claim. Schedules nothing.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::NotRegistered` if the claim is absent
    /// - `ArbiterError::InvalidResourceSet` if the masks are malformed
    pub fn update(&self, client: &ClientId, record: ResourceRecord) -> Result<StatusReply, ArbiterError> {
        self.registry.lock().update(client, &record)?;
        debug!(client = %client, "update {record}");
        self.record(client, record.id, AuditAction::Update, Some(record.to_string()));
        Ok(StatusReply::ok(record.id, record.reqno))
    }

    /// Request a grant decision for an existing claim.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::NotRegistered` if the claim is absent
    /// - `ArbiterError::SchedulerShutdown` if the grant cannot be scheduled
    pub fn acquire(
        &self,
        client: &ClientId,
        id: ResourceId,
        reqno: RequestNo,
    ) -> Result<StatusReply, ArbiterError> {
        self.request_grant(client, id, reqno, Decision::Grant, AuditAction::Acquire)
    }

    /// Give the resources back; the client receives an empty grant.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::NotRegistered` if the claim is absent
    /// - `ArbiterError::SchedulerShutdown` if the grant cannot be scheduled
    pub fn release(
        &self,
        client: &ClientId,
        id: ResourceId,
        reqno: RequestNo,
    ) -> Result<StatusReply, ArbiterError> {
        self.request_grant(client, id, reqno, Decision::Revoke, AuditAction::Release)
    }

    /// Remove a claim immediately. Pending notifications for it are dropped
    /// when they fire.
    ///
    /// # Errors
    ///
    /// `ArbiterError::NotRegistered` if the claim is absent.
    pub fn unregister(
        &self,
        client: &ClientId,
        id: ResourceId,
        reqno: RequestNo,
    ) -> Result<StatusReply, ArbiterError> {
        self.registry.lock().remove(client, id)?;
        info!(client = %client, resource_id = id, reqno = reqno, "resource set unregistered");
        self.record(client, id, AuditAction::Unregister, None);
        Ok(StatusReply::ok(id, reqno))
    }

    /// Snapshot of a claim.
    #[must_use]
    pub fn claim(&self, client: &ClientId, id: ResourceId) -> Option<ResourceClaim> {
        self.registry.lock().get(client, id).cloned()
    }

    /// Number of claims held by `client`.
    #[must_use]
    pub fn claim_count(&self, client: &ClientId) -> usize {
        self.registry.lock().claim_count(client)
    }

    /// Number of clients holding at least one claim.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.registry.lock().client_count()
    }

    /// Configured decision delay.
    #[must_use]
    pub const fn decision_delay(&self) -> Duration {
        self.decision_delay
    }

    /// Scheduler counters.
    #[must_use]
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Stop the scheduler; pending notifications are discarded.
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            info!(clients = self.client_count(), "arbiter shutting down");
        }
        self.scheduler.shutdown();
    }

    /// True once [`Self::shutdown`] ran.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn request_grant(
        &self,
        client: &ClientId,
        id: ResourceId,
        reqno: RequestNo,
        decision: Decision,
        action: AuditAction,
    ) -> Result<StatusReply, ArbiterError> {
        let ticket = self.registry.lock().stamp_grant(client, id)?;
        debug!(client = %client, resource_id = id, reqno = reqno, "{action} requested");
        self.record(client, id, action, None);

        self.schedule(PendingNotification {
            client: client.clone(),
            id,
            reqno,
            decision,
            ticket,
        })?;
        Ok(StatusReply::ok(id, reqno))
    }

    fn schedule(&self, pending: PendingNotification) -> Result<(), ArbiterError> {
        let ctx = DeliveryContext {
            registry: Arc::clone(&self.registry),
            policy: Arc::clone(&self.policy),
            audit: self.audit.clone(),
            supersede_stale: self.supersede_stale,
        };
        self.scheduler
            .schedule_after(self.decision_delay, Box::new(move || ctx.deliver(&pending)))
    }

    fn record(&self, client: &ClientId, id: ResourceId, action: AuditAction, payload: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(client, id, action, payload));
        }
    }
}
