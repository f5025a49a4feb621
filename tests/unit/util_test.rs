//! Tests for utility functions and wire types

use prometheus_resource_arbiter::util::serde::{
    ClientId, MessageType, ModeFlags, Notification, ResourceKind, ResourceRecord, ResourceSet,
    StatusReply,
};
use prometheus_resource_arbiter::util::clock::now_ms;
use prometheus_resource_arbiter::util::telemetry::init_tracing_with;

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_resource_kind_bits() {
    assert_eq!(ResourceKind::AudioPlayback.bit(), 0x1);
    assert_eq!(ResourceKind::Vibra.bit(), 0x10);
    assert_eq!(ResourceKind::SystemButton.bit(), 0x100);
    assert_eq!(ResourceKind::LensCover.bit(), 0x1000);
    assert!(ResourceKind::ALL
        .iter()
        .all(|k| ResourceSet::KNOWN.contains(*k)));
}

#[test]
fn test_resource_set_operations() {
    let audio = ResourceSet::from(ResourceKind::AudioPlayback)
        | ResourceSet::from(ResourceKind::AudioRecording);
    let vibra = ResourceSet::from(ResourceKind::Vibra);

    assert_eq!(audio.bits(), 0b101);
    assert!(!vibra.is_subset_of(audio));
    assert!(audio.is_subset_of(audio | vibra));
    assert!(!(audio | vibra).is_subset_of(audio));
    assert!((audio | vibra).contains(ResourceKind::Vibra));
    assert!(ResourceSet::empty().is_empty());
    assert_eq!(ResourceSet::from_bits(0x80).unknown_bits(), 0x80);
}

#[test]
fn test_resource_set_display() {
    assert_eq!(
        ResourceSet::from_bits(0b101).to_string(),
        "audio_playback,audio_recording (0x5)"
    );
    assert_eq!(ResourceSet::empty().to_string(), "<none> (0x0)");
}

#[test]
fn test_client_id() {
    let client = ClientId::from(":1.42");
    assert_eq!(client.as_str(), ":1.42");
    assert_eq!(client.to_string(), ":1.42");
    assert_eq!(client, ClientId::new(String::from(":1.42")));
}

#[test]
fn test_message_type_round_trip_through_tag() {
    for tag in [0, 1, 2, 3, 4, 5, 6, 8] {
        let ty = MessageType::try_from(tag).unwrap();
        assert_eq!(ty.tag(), tag);
    }
    assert_eq!(MessageType::try_from(7), Err(7));
}

#[test]
fn test_record_display() {
    let record = ResourceRecord::new(1, 4, ResourceKind::AudioPlayback.into())
        .with_optional(ResourceKind::Vibra.into())
        .with_class("player")
        .with_mode(ModeFlags::AUTO_RELEASE);
    let dump = record.to_string();
    assert!(dump.contains("id=1 reqno=4"));
    assert!(dump.contains("mandatory=audio_playback (0x1)"));
    assert!(dump.contains("optional=vibra (0x10)"));
    assert!(dump.contains("class='player'"));
    assert!(dump.contains("mode=auto_release (0x1)"));
}

#[test]
fn test_notification_and_status() {
    let grant = Notification::grant(2, 9, ResourceSet::empty());
    assert_eq!(grant.type_tag(), 5);
    assert_eq!(Notification::advice(2, 9, ResourceSet::empty()).type_tag(), 6);

    let ok = StatusReply::ok(2, 9);
    assert!(ok.is_ok());
    assert_eq!(ok.kind, MessageType::Status);
    assert_eq!(ok.errmsg, "OK");

    let err = StatusReply::error(2, 9, 22, "invalid");
    assert!(!err.is_ok());
    assert_eq!(err.errcod, 22);
}

#[test]
fn test_init_tracing_installs_once() {
    init_tracing_with("prometheus_resource_arbiter=debug");
    init_tracing_with("prometheus_resource_arbiter=trace");
    assert!(tracing::dispatcher::has_been_set());
    tracing::info!(target: "prometheus_resource_arbiter", "subscriber installed");
}
