//! # Prometheus Resource Arbiter
//!
//! Core of a resource arbitration service: clients register claims on sets
//! of device resources (audio playback, vibration, LEDs, ...) and later ask
//! for them to be granted or give them back. Every request is acknowledged
//! immediately; the resulting advice or grant notification is delivered
//! asynchronously after a fixed decision delay by a dedicated scheduler.
//!
//! ## Key Features
//!
//! - **Claim Registry**: per-client claims keyed by resource-set id, validated
//!   and overwritten on re-registration
//! - **Delayed Decisions**: advice and grant notifications fire after a
//!   configurable delay and reflect the claim as it is at fire time
//! - **Stale Supersession**: a newer request on a claim drops the pending
//!   notification of an older one
//! - **Single-Worker Scheduler**: deadline-ordered, FIFO on ties, never fires
//!   early, sooner events preempt a longer wait
//! - **Pluggable Policy and Transport**: grant decisions and outbound delivery
//!   sit behind traits
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use prometheus_resource_arbiter::builders::{build_arbiter, build_client_notifier};
//! use prometheus_resource_arbiter::config::ArbiterConfig;
//! use prometheus_resource_arbiter::core::GrantMandatory;
//! use prometheus_resource_arbiter::util::serde::{ClientId, ResourceKind, ResourceRecord};
//!
//! let cfg = ArbiterConfig::default();
//! let arbiter = build_arbiter(&cfg, GrantMandatory)?;
//! let client = ClientId::new(":1.42");
//! let (notifier, rx) = build_client_notifier(&cfg);
//!
//! let record = ResourceRecord::new(1, 0, ResourceKind::AudioPlayback.into());
//! arbiter.register(&client, record, Arc::new(notifier))?;
//! arbiter.acquire(&client, 1, 1)?;
//!
//! // Advice, then grant, each about one decision delay later.
//! let advice = rx.recv()?;
//! let grant = rx.recv()?;
//! # let _ = (advice, grant);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For complete scenarios, see `tests/arbitration_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Claim registry, arbitration, scheduling, and delivery abstractions.
pub mod core;
/// Configuration models for the arbiter, scheduler, and notifiers.
pub mod config;
/// Builders to construct arbiters from configuration.
pub mod builders;
/// Infrastructure adapters for deadline queues and notification delivery.
pub mod infra;
/// Runtime adapters (tokio) and request dispatch surface.
pub mod runtime;
/// Shared utilities and wire-level data types.
pub mod util;
