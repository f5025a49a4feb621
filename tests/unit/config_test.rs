//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_resource_arbiter::config::{
    ArbiterConfig, NotifierConfig, RuntimeConfig, SchedulerConfig,
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let cfg = ArbiterConfig::default();
    assert_eq!(cfg.decision_delay(), Duration::from_secs(1));
    assert!(cfg.supersede_stale);
    assert_eq!(cfg.scheduler.thread_name, "arbiter-scheduler");
    assert_eq!(cfg.notifier, NotifierConfig { queue_depth: 64 });
    assert_eq!(cfg.runtime, RuntimeConfig::Native);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_delay_rejected() {
    let cfg = ArbiterConfig::new().with_decision_delay(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_sub_millisecond_delay_rounds_up() {
    let cfg = ArbiterConfig::new().with_decision_delay(Duration::from_micros(500));
    assert_eq!(cfg.decision_delay_ms, 1);
    assert!(cfg.validate().is_ok());

    let cfg = ArbiterConfig::new().with_decision_delay(Duration::from_micros(20_100));
    assert_eq!(cfg.decision_delay(), Duration::from_millis(21));

    let cfg = ArbiterConfig::new().with_decision_delay(Duration::from_millis(40));
    assert_eq!(cfg.decision_delay_ms, 40);
}

#[test]
fn test_small_stack_rejected() {
    let cfg = ArbiterConfig {
        scheduler: SchedulerConfig {
            stack_size: 1024,
            ..SchedulerConfig::default()
        },
        ..ArbiterConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("stack_size"));
}

#[test]
fn test_empty_thread_name_rejected() {
    let cfg = ArbiterConfig::new().with_thread_name("  ");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_queue_depth_rejected() {
    let cfg = ArbiterConfig {
        notifier: NotifierConfig { queue_depth: 0 },
        ..ArbiterConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_partial() {
    let cfg = ArbiterConfig::from_json_str(
        r#"{ "decision_delay_ms": 250, "runtime": "tokio", "scheduler": { "thread_name": "arb" } }"#,
    )
    .unwrap();
    assert_eq!(cfg.decision_delay_ms, 250);
    assert_eq!(cfg.runtime, RuntimeConfig::Tokio);
    assert_eq!(cfg.scheduler.thread_name, "arb");
    assert_eq!(cfg.scheduler.stack_size, SchedulerConfig::default().stack_size);
    assert!(cfg.supersede_stale);
}

#[test]
fn test_from_json_invalid() {
    assert!(ArbiterConfig::from_json_str("{ not json").is_err());
    assert!(ArbiterConfig::from_json_str(r#"{ "decision_delay_ms": 0 }"#).is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = ArbiterConfig::from_lookup(lookup(&[
        ("ARBITER_DECISION_DELAY_MS", "40"),
        ("ARBITER_SUPERSEDE_STALE", "false"),
        ("ARBITER_QUEUE_DEPTH", " 8 "),
        ("ARBITER_RUNTIME", "tokio"),
    ]))
    .unwrap();
    assert_eq!(cfg.decision_delay(), Duration::from_millis(40));
    assert!(!cfg.supersede_stale);
    assert_eq!(cfg.notifier.queue_depth, 8);
    assert_eq!(cfg.runtime, RuntimeConfig::Tokio);
}

#[test]
fn test_from_lookup_rejects_bad_values() {
    let err = ArbiterConfig::from_lookup(lookup(&[("ARBITER_DECISION_DELAY_MS", "soon")]))
        .unwrap_err();
    assert!(err.contains("ARBITER_DECISION_DELAY_MS"));

    assert!(ArbiterConfig::from_lookup(lookup(&[("ARBITER_RUNTIME", "wasm")])).is_err());
}

#[test]
fn test_from_lookup_empty_is_default() {
    let cfg = ArbiterConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, ArbiterConfig::default());
}
