//! Tests for audit sink

use prometheus_resource_arbiter::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink};
use prometheus_resource_arbiter::util::serde::ClientId;

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);
    let client = ClientId::new(":1.7");

    let event = build_audit_event(&client, 3, AuditAction::Register, Some("payload".to_string()));
    sink.record(event.clone());

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_id, event.event_id);
    assert_eq!(events[0].client, ":1.7");
    assert_eq!(events[0].resource_id, 3);
    assert_eq!(events[0].action, AuditAction::Register);
    assert_eq!(events[0].payload.as_deref(), Some("payload"));
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);
    let client = ClientId::new(":1.7");

    sink.record(build_audit_event(&client, 1, AuditAction::Register, None));
    sink.record(build_audit_event(&client, 1, AuditAction::Acquire, None));
    sink.record(build_audit_event(&client, 1, AuditAction::Release, None));

    assert_eq!(sink.actions(), vec![AuditAction::Acquire, AuditAction::Release]);
}

#[test]
fn test_zero_capacity_sink_stores_nothing() {
    let sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event(&ClientId::new("c"), 1, AuditAction::Drop, None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_audit_event_ids_are_unique() {
    let client = ClientId::new(":1.7");
    let a = build_audit_event(&client, 1, AuditAction::Deliver, None);
    let b = build_audit_event(&client, 1, AuditAction::Deliver, None);
    assert_ne!(a.event_id, b.event_id);
    assert!(b.created_at_ms >= a.created_at_ms);
}

#[test]
fn test_audit_event_serializes_action_snake_case() {
    let event = build_audit_event(&ClientId::new("c"), 2, AuditAction::DeliveryFailed, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "delivery_failed");
    assert_eq!(AuditAction::DeliveryFailed.to_string(), "delivery_failed");
}
