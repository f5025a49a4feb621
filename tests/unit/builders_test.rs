//! Tests for arbiter builders

use std::sync::Arc;
use std::time::Duration;

use prometheus_resource_arbiter::builders::{
    build_arbiter, build_client_notifier, build_scheduler, ArbiterBuilder,
};
use prometheus_resource_arbiter::config::{ArbiterConfig, NotifierConfig, RuntimeConfig};
use prometheus_resource_arbiter::core::{
    ArbiterError, AuditAction, GrantMandatory, InMemoryAuditSink, Notifier, Schedule,
};
use prometheus_resource_arbiter::infra::RecordingNotifier;
use prometheus_resource_arbiter::util::serde::{
    ClientId, Notification, ResourceRecord, ResourceSet,
};

#[test]
fn test_build_arbiter_applies_config() {
    let cfg = ArbiterConfig::new()
        .with_decision_delay(Duration::from_millis(20))
        .with_thread_name("builder-test");
    let arbiter = build_arbiter(&cfg, GrantMandatory).unwrap();

    assert_eq!(arbiter.decision_delay(), Duration::from_millis(20));
    assert_eq!(arbiter.client_count(), 0);
    arbiter.shutdown();
    assert!(arbiter.is_shut_down());
}

#[test]
fn test_build_arbiter_rejects_invalid_config() {
    let cfg = ArbiterConfig::new().with_thread_name("");
    assert!(matches!(
        build_arbiter(&cfg, GrantMandatory),
        Err(ArbiterError::InvalidConfig(_))
    ));
}

#[test]
fn test_tokio_runtime_needs_a_runtime() {
    let cfg = ArbiterConfig::new().with_runtime(RuntimeConfig::Tokio);
    assert!(build_scheduler(&cfg).is_err());
}

#[test]
fn test_build_scheduler_native() {
    let scheduler = build_scheduler(&ArbiterConfig::default()).unwrap();
    let (tx, rx) = crossbeam_channel::bounded(1);
    scheduler
        .schedule_after(Duration::ZERO, Box::new(move || tx.send(()).unwrap()))
        .unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    scheduler.shutdown();
}

#[test]
fn test_builder_attaches_audit() {
    let sink = Arc::new(InMemoryAuditSink::new(16));
    let arbiter = ArbiterBuilder::new(
        ArbiterConfig::new().with_decision_delay(Duration::from_millis(10)),
    )
    .with_audit(sink.clone())
    .build(GrantMandatory)
    .unwrap();

    let client = ClientId::new(":1.3");
    let out = Arc::new(RecordingNotifier::new());
    arbiter
        .register(&client, ResourceRecord::new(1, 0, ResourceSet::from_bits(1)), out.clone())
        .unwrap();
    out.wait_for(1, Duration::from_secs(2));

    // The delivery is audited right after the notifier returns.
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while sink.actions().len() < 2 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(sink.actions(), vec![AuditAction::Register, AuditAction::Deliver]);
}

#[test]
fn test_client_notifier_uses_configured_depth() {
    let cfg = ArbiterConfig {
        notifier: NotifierConfig { queue_depth: 1 },
        ..ArbiterConfig::default()
    };
    let (notifier, rx) = build_client_notifier(&cfg);
    let n = Notification::advice(1, 0, ResourceSet::from_bits(1));

    notifier.notify(&n).unwrap();
    assert!(matches!(notifier.notify(&n), Err(ArbiterError::DeliveryFailure(_))));
    assert_eq!(rx.try_recv().unwrap(), n);
}

#[test]
fn test_builder_client_notifier_feeds_arbiter() {
    let builder = ArbiterBuilder::new(
        ArbiterConfig::new().with_decision_delay(Duration::from_millis(10)),
    );
    let (notifier, rx) = builder.client_notifier();
    let arbiter = builder.build(GrantMandatory).unwrap();

    let client = ClientId::new(":1.4");
    arbiter
        .register(&client, ResourceRecord::new(2, 0, ResourceSet::from_bits(1)), Arc::new(notifier))
        .unwrap();
    let advice = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(advice, Notification::advice(2, 0, ResourceSet::from_bits(1)));
}
