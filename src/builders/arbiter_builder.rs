//! Builders to construct arbiters from configuration.

use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::Receiver;
use tracing::info;

use crate::config::{ArbiterConfig, RuntimeConfig};
use crate::core::{
    AppResult, ArbiterError, ArbitrationPolicy, AuditSink, ResourceArbiter, Schedule,
};
use crate::infra::ChannelNotifier;
use crate::util::serde::Notification;
#[cfg(not(target_arch = "wasm32"))]
use crate::core::DelayedEventScheduler;

/// Start the scheduler selected by `cfg.runtime`.
///
/// The tokio runtime must be entered by the caller when `runtime` is `tokio`.
///
/// # Errors
///
/// - `ArbiterError::InvalidConfig` if the configuration is invalid or names a
///   runtime this build does not include
/// - `ArbiterError::Backend` if the worker cannot be started
pub fn build_scheduler(cfg: &ArbiterConfig) -> Result<Box<dyn Schedule>, ArbiterError> {
    cfg.validate().map_err(ArbiterError::InvalidConfig)?;

    match cfg.runtime {
        #[cfg(not(target_arch = "wasm32"))]
        RuntimeConfig::Native => Ok(Box::new(DelayedEventScheduler::new(&cfg.scheduler)?)),
        #[cfg(feature = "tokio-runtime")]
        RuntimeConfig::Tokio => Ok(Box::new(
            crate::runtime::TokioDelayedScheduler::spawn_current()?,
        )),
        #[allow(unreachable_patterns)]
        other => Err(ArbiterError::InvalidConfig(format!(
            "runtime {other:?} is not available in this build"
        ))),
    }
}

/// Build an arbiter with the scheduler, delay and supersession from `cfg`.
///
/// # Errors
///
/// See [`build_scheduler`].
pub fn build_arbiter<P: ArbitrationPolicy>(
    cfg: &ArbiterConfig,
    policy: P,
) -> Result<ResourceArbiter<Box<dyn Schedule>, P>, ArbiterError> {
    ArbiterBuilder::new(cfg.clone()).build(policy)
}

/// Create the outbound queue for one client, sized by `cfg.notifier`.
///
/// The transport keeps the receiver and forwards what arrives on it; the
/// notifier is handed to the arbiter when the client registers.
#[must_use]
pub fn build_client_notifier(cfg: &ArbiterConfig) -> (ChannelNotifier, Receiver<Notification>) {
    ChannelNotifier::from_config(&cfg.notifier)
}

/// Build an arbiter from `ARBITER_*` environment variables and `.env`.
///
/// # Errors
///
/// Returns an error if the environment holds invalid values or the
/// scheduler cannot be started.
pub fn build_arbiter_from_env<P: ArbitrationPolicy>(
    policy: P,
) -> AppResult<ResourceArbiter<Box<dyn Schedule>, P>> {
    let cfg = ArbiterConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading arbiter configuration from environment")?;
    build_arbiter(&cfg, policy).context("starting resource arbiter")
}

/// Step-by-step arbiter construction.
#[derive(Default)]
pub struct ArbiterBuilder {
    config: ArbiterConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl ArbiterBuilder {
    /// Start from `config`.
    #[must_use]
    pub fn new(config: ArbiterConfig) -> Self {
        Self {
            config,
            audit: None,
        }
    }

    /// Record lifecycle and delivery events in `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Configuration the arbiter will be built from.
    #[must_use]
    pub const fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Outbound queue for one client, sized by the configured depth.
    #[must_use]
    pub fn client_notifier(&self) -> (ChannelNotifier, Receiver<Notification>) {
        build_client_notifier(&self.config)
    }

    /// Start the scheduler and assemble the arbiter.
    ///
    /// # Errors
    ///
    /// See [`build_scheduler`].
    pub fn build<P: ArbitrationPolicy>(
        self,
        policy: P,
    ) -> Result<ResourceArbiter<Box<dyn Schedule>, P>, ArbiterError> {
        let scheduler = build_scheduler(&self.config)?;
        let mut arbiter = ResourceArbiter::new(scheduler, policy)
            .with_decision_delay(self.config.decision_delay())
            .with_supersede_stale(self.config.supersede_stale);
        if let Some(sink) = self.audit {
            arbiter = arbiter.with_audit(sink);
        }

        info!(
            decision_delay_ms = self.config.decision_delay_ms,
            supersede_stale = self.config.supersede_stale,
            queue_depth = self.config.notifier.queue_depth,
            runtime = ?self.config.runtime,
            "resource arbiter built"
        );
        Ok(arbiter)
    }
}
