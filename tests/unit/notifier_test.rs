//! Tests for notifier backends

use std::time::Duration;

use prometheus_resource_arbiter::config::NotifierConfig;
use prometheus_resource_arbiter::core::{ArbiterError, Notifier};
use prometheus_resource_arbiter::infra::{ChannelNotifier, RecordingNotifier};
use prometheus_resource_arbiter::util::serde::{Notification, ResourceSet};

fn grant(reqno: u32) -> Notification {
    Notification::grant(1, reqno, ResourceSet::from_bits(1))
}

#[test]
fn test_channel_notifier_respects_configured_depth() {
    let (notifier, rx) = ChannelNotifier::from_config(&NotifierConfig { queue_depth: 2 });
    notifier.notify(&grant(1)).unwrap();
    notifier.notify(&grant(2)).unwrap();
    assert!(matches!(
        notifier.notify(&grant(3)),
        Err(ArbiterError::DeliveryFailure(_))
    ));

    assert_eq!(rx.try_recv().unwrap().reqno, 1);
    assert_eq!(rx.try_recv().unwrap().reqno, 2);
}

#[test]
fn test_recording_notifier_wait_for() {
    let notifier = std::sync::Arc::new(RecordingNotifier::new());
    let producer = std::sync::Arc::clone(&notifier);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(10));
        producer.notify(&grant(1)).unwrap();
        producer.notify(&grant(2)).unwrap();
    });

    let deliveries = notifier.wait_for(2, Duration::from_secs(2));
    handle.join().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert!(deliveries[0].received_at <= deliveries[1].received_at);
}

#[test]
fn test_recording_notifier_wait_times_out() {
    let notifier = RecordingNotifier::new();
    let deliveries = notifier.wait_for(1, Duration::from_millis(20));
    assert!(deliveries.is_empty());
}

#[test]
fn test_unreachable_recorder_fails() {
    let notifier = RecordingNotifier::new();
    notifier.set_unreachable(true);
    assert!(notifier.notify(&grant(1)).is_err());
    assert!(notifier.is_empty());

    notifier.set_unreachable(false);
    notifier.notify(&grant(2)).unwrap();
    assert_eq!(notifier.len(), 1);
}
