//! Tests for runtime API surface

use std::sync::Arc;
use std::time::Duration;

use prometheus_resource_arbiter::builders::build_arbiter;
use prometheus_resource_arbiter::config::ArbiterConfig;
use prometheus_resource_arbiter::core::error::{ERRCOD_INVALID, ERRCOD_NOT_REGISTERED};
use prometheus_resource_arbiter::core::{GrantMandatory, Notifier};
use prometheus_resource_arbiter::infra::RecordingNotifier;
use prometheus_resource_arbiter::runtime::{dispatch, health, Request};
use prometheus_resource_arbiter::util::serde::{
    ClientId, MessageType, Notification, ResourceRecord, ResourceSet,
};

#[test]
fn test_request_accessors() {
    let record = ResourceRecord::new(4, 11, ResourceSet::from_bits(1));
    let register = Request::Register { record };
    assert_eq!(register.message_type(), MessageType::Register);
    assert_eq!(register.id(), 4);
    assert_eq!(register.reqno(), 11);

    let release = Request::Release { id: 4, reqno: 12 };
    assert_eq!(release.message_type(), MessageType::Release);
    assert_eq!(release.to_string(), "release id=4 reqno=12");
}

#[test]
fn test_request_from_json() {
    let request: Request =
        serde_json::from_str(r#"{ "type": "acquire", "id": 3, "reqno": 8 }"#).unwrap();
    assert_eq!(request, Request::Acquire { id: 3, reqno: 8 });

    let request: Request = serde_json::from_str(
        r#"{ "type": "register", "record": { "id": 1, "reqno": 0, "mandatory": 5, "optional": 16 } }"#,
    )
    .unwrap();
    match request {
        Request::Register { record } => {
            assert_eq!(record.mandatory.bits(), 5);
            assert_eq!(record.optional.bits(), 16);
            assert!(record.share.is_empty());
        }
        other => panic!("unexpected request {other:?}"),
    }
}

#[test]
fn test_dispatch_flow_and_error_folding() {
    let cfg = ArbiterConfig::new().with_decision_delay(Duration::from_millis(10));
    let arbiter = build_arbiter(&cfg, GrantMandatory).unwrap();
    let client = ClientId::new(":1.9");
    let recorder = Arc::new(RecordingNotifier::new());
    let outbound: Arc<dyn Notifier> = recorder.clone();

    let reply = dispatch(&arbiter, &client, Request::Acquire { id: 2, reqno: 1 }, &outbound);
    assert_eq!(reply.errcod, ERRCOD_NOT_REGISTERED);
    assert_eq!((reply.id, reply.reqno), (2, 1));

    let bad = ResourceRecord::new(2, 2, ResourceSet::from_bits(1))
        .with_optional(ResourceSet::from_bits(1));
    let reply = dispatch(&arbiter, &client, Request::Register { record: bad }, &outbound);
    assert_eq!(reply.errcod, ERRCOD_INVALID);

    let good = ResourceRecord::new(2, 3, ResourceSet::from_bits(1));
    let reply = dispatch(&arbiter, &client, Request::Register { record: good }, &outbound);
    assert!(reply.is_ok());

    let notes = recorder.wait_for(1, Duration::from_secs(2));
    assert_eq!(
        notes[0].notification,
        Notification::advice(2, 3, ResourceSet::from_bits(1))
    );

    let reply = dispatch(&arbiter, &client, Request::Unregister { id: 2, reqno: 4 }, &outbound);
    assert!(reply.is_ok());
    assert_eq!(arbiter.client_count(), 0);
}

#[test]
fn test_health_reports_state() {
    let arbiter = build_arbiter(&ArbiterConfig::default(), GrantMandatory).unwrap();
    let client = ClientId::new(":1.2");
    arbiter
        .register(
            &client,
            ResourceRecord::new(1, 0, ResourceSet::from_bits(1)),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();

    let status = health(&arbiter);
    assert!(status.ok);
    assert_eq!(status.clients, 1);
    assert_eq!(status.pending_notifications, 1);

    arbiter.shutdown();
    let status = health(&arbiter);
    assert!(!status.ok);
    assert_eq!(status.pending_notifications, 0);
}
