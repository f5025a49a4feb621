//! Builders to construct arbiters from configuration.

pub mod arbiter_builder;

pub use arbiter_builder::{
    build_arbiter, build_arbiter_from_env, build_client_notifier, build_scheduler, ArbiterBuilder,
};
