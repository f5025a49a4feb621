//! Grant decision policies.

use crate::core::ResourceClaim;
use crate::util::serde::ResourceSet;

/// Decides what a claim is granted or advised.
///
/// Evaluated on the scheduler worker when the notification fires, with the
/// registry lock held, so decisions see the claim's current masks.
pub trait ArbitrationPolicy: Send + Sync + 'static {
    /// Resources granted in response to an acquire.
    fn decide(&self, claim: &ResourceClaim) -> ResourceSet;

    /// Resources advised after registration. Defaults to the mandatory set.
    fn advise(&self, claim: &ResourceClaim) -> ResourceSet {
        claim.mandatory
    }
}

/// Grants the full mandatory set and never arbitrates between clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantMandatory;

impl ArbitrationPolicy for GrantMandatory {
    fn decide(&self, claim: &ResourceClaim) -> ResourceSet {
        claim.mandatory
    }
}
