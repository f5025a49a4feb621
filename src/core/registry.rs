//! Per-client claim bookkeeping.
//!
//! The registry owns every [`ResourceClaim`]. It has no locking of its own;
//! the arbiter keeps it behind a single mutex shared by the dispatch path and
//! the scheduler callbacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::{ArbiterError, Notifier};
use crate::util::serde::{ClientId, ModeFlags, ResourceId, ResourceRecord, ResourceSet};

/// One client's claim on one resource set id.
#[derive(Clone)]
pub struct ResourceClaim {
    /// Resource set identifier, unique within the client.
    pub resource_id: ResourceId,
    /// Required resources.
    pub mandatory: ResourceSet,
    /// Resources used when available.
    pub optional: ResourceSet,
    /// Resources the client is willing to share.
    pub share: ResourceSet,
    /// Application class.
    pub class: String,
    /// Claim mode.
    pub mode: ModeFlags,
    outbound: Arc<dyn Notifier>,
    advice_ticket: u64,
    grant_ticket: u64,
}

impl ResourceClaim {
    /// Handle notifications for this claim are delivered through.
    #[must_use]
    pub fn outbound(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.outbound)
    }

    /// Ticket of the most recently scheduled advice.
    #[must_use]
    pub const fn advice_ticket(&self) -> u64 {
        self.advice_ticket
    }

    /// Ticket of the most recently scheduled grant.
    #[must_use]
    pub const fn grant_ticket(&self) -> u64 {
        self.grant_ticket
    }

    fn apply(&mut self, record: &ResourceRecord) {
        self.mandatory = record.mandatory;
        self.optional = record.optional;
        self.share = record.share;
        self.class.clone_from(&record.class);
        self.mode = record.mode;
    }
}

impl fmt::Debug for ResourceClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClaim")
            .field("resource_id", &self.resource_id)
            .field("mandatory", &self.mandatory)
            .field("optional", &self.optional)
            .field("share", &self.share)
            .field("class", &self.class)
            .field("mode", &self.mode)
            .field("advice_ticket", &self.advice_ticket)
            .field("grant_ticket", &self.grant_ticket)
            .finish_non_exhaustive()
    }
}

/// Reject masks that name unknown resources or share what is not claimed.
///
/// Optional bits may also appear in the mandatory mask: clients commonly send
/// the union of both as mandatory and the optional subset on its own.
///
/// # Errors
///
/// `ArbiterError::InvalidResourceSet` describing the first problem found.
pub fn validate_record(record: &ResourceRecord) -> Result<(), ArbiterError> {
    let all = record.mandatory | record.optional;
    let unknown = all.unknown_bits() | record.share.unknown_bits();
    if unknown != 0 {
        return Err(ArbiterError::InvalidResourceSet(format!(
            "unknown resource bits {unknown:#x}"
        )));
    }
    if !record.share.is_subset_of(all) {
        return Err(ArbiterError::InvalidResourceSet(format!(
            "share {} is not a subset of the claimed resources {}",
            record.share, all
        )));
    }
    Ok(())
}

/// Mapping of client to claims keyed by resource set id.
#[derive(Default)]
pub struct ResourceRegistry {
    clients: HashMap<ClientId, HashMap<ResourceId, ResourceClaim>>,
    next_ticket: u64,
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the claim for (`client`, `record.id`) and stamp a
    /// fresh advice ticket on it. Returns that ticket.
    ///
    /// # Errors
    ///
    /// `ArbiterError::InvalidResourceSet` if the masks are malformed.
    pub fn register(
        &mut self,
        client: &ClientId,
        record: &ResourceRecord,
        outbound: Arc<dyn Notifier>,
    ) -> Result<u64, ArbiterError> {
        validate_record(record)?;
        let ticket = self.issue_ticket();
        let claims = self.clients.entry(client.clone()).or_default();

        match claims.get_mut(&record.id) {
            Some(claim) => {
                claim.apply(record);
                claim.outbound = outbound;
                claim.advice_ticket = ticket;
            }
            None => {
                claims.insert(
                    record.id,
                    ResourceClaim {
                        resource_id: record.id,
                        mandatory: record.mandatory,
                        optional: record.optional,
                        share: record.share,
                        class: record.class.clone(),
                        mode: record.mode,
                        outbound,
                        advice_ticket: ticket,
                        grant_ticket: 0,
                    },
                );
            }
        }
        Ok(ticket)
    }

    /// Replace the masks of an existing claim in place.
    ///
    /// # Errors
    ///
    /// - `ArbiterError::NotRegistered` if the claim is absent
    /// - `ArbiterError::InvalidResourceSet` if the masks are malformed
    pub fn update(&mut self, client: &ClientId, record: &ResourceRecord) -> Result<(), ArbiterError> {
        let claim = self.claim_mut(client, record.id)?;
        validate_record(record)?;
        claim.apply(record);
        Ok(())
    }

    /// Stamp a fresh grant ticket on an existing claim and return it.
    ///
    /// # Errors
    ///
    /// `ArbiterError::NotRegistered` if the claim is absent.
    pub fn stamp_grant(&mut self, client: &ClientId, id: ResourceId) -> Result<u64, ArbiterError> {
        let ticket = self.next_ticket + 1;
        let claim = self.claim_mut(client, id)?;
        claim.grant_ticket = ticket;
        self.next_ticket = ticket;
        Ok(ticket)
    }

    /// Remove a claim, and the client record once it holds no claims.
    ///
    /// # Errors
    ///
    /// `ArbiterError::NotRegistered` if the claim is absent.
    pub fn remove(&mut self, client: &ClientId, id: ResourceId) -> Result<ResourceClaim, ArbiterError> {
        let claims = self
            .clients
            .get_mut(client)
            .ok_or(ArbiterError::NotRegistered { resource_id: id })?;
        let claim = claims
            .remove(&id)
            .ok_or(ArbiterError::NotRegistered { resource_id: id })?;
        if claims.is_empty() {
            self.clients.remove(client);
        }
        Ok(claim)
    }

    /// Look up a claim.
    #[must_use]
    pub fn get(&self, client: &ClientId, id: ResourceId) -> Option<&ResourceClaim> {
        self.clients.get(client).and_then(|claims| claims.get(&id))
    }

    /// Number of claims held by `client`.
    #[must_use]
    pub fn claim_count(&self, client: &ClientId) -> usize {
        self.clients.get(client).map_or(0, HashMap::len)
    }

    /// Number of clients holding at least one claim.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// True when no client holds a claim.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn claim_mut(&mut self, client: &ClientId, id: ResourceId) -> Result<&mut ResourceClaim, ArbiterError> {
        self.clients
            .get_mut(client)
            .and_then(|claims| claims.get_mut(&id))
            .ok_or(ArbiterError::NotRegistered { resource_id: id })
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}
