use crate::buildings::BuildingId;
use crate::earthquake::EarthquakeConfig;
use crate::test_harness::{recorded, MonitorSetup, TestMonitor, TEST_CENTER};

#[test]
fn test_one_reading_notification_per_tick() {
    let mut monitor = TestMonitor::new();
    let (_, snapshots) = monitor.record_readings();
    monitor.tick(5);

    let snapshots = recorded(&snapshots);
    assert_eq!(snapshots.len(), 5);
    for (idx, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.tick, idx as u64 + 1);
        assert_eq!(snapshot.timestamp_ms, 50 * (idx as u64 + 1));
        assert_eq!(snapshot.readings.len(), 80);
        assert!(snapshot
            .readings
            .values()
            .all(|r| r.timestamp_ms == snapshot.timestamp_ms));
    }
}

#[test]
fn test_every_subscriber_sees_the_same_snapshot() {
    let mut monitor = TestMonitor::new();
    let (_, first) = monitor.record_readings();
    let (_, second) = monitor.record_readings();
    monitor.tick(3);

    let first = recorded(&first);
    assert_eq!(first.len(), 3);
    assert_eq!(first, recorded(&second));
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let mut monitor = TestMonitor::new();
    let (handle, snapshots) = monitor.record_readings();
    let (_, other) = monitor.record_readings();
    monitor.tick(2);

    assert!(monitor.unsubscribe_readings(handle));
    assert!(!monitor.unsubscribe_readings(handle), "already removed");
    monitor.tick(3);

    assert_eq!(recorded(&snapshots).len(), 2);
    assert_eq!(recorded(&other).len(), 5, "remaining subscriber unaffected");
}

#[test]
fn test_silenced_sensor_absent_from_snapshot() {
    let mut monitor = TestMonitor::new();
    let (_, snapshots) = monitor.record_readings();
    monitor.tick(1);
    monitor.silence_sensor(BuildingId(4));
    monitor.tick(1);

    let snapshots = recorded(&snapshots);
    let last = snapshots.last().expect("snapshot");
    assert_eq!(last.readings.len(), 79);
    assert!(!last.readings.contains_key(&BuildingId(4)));
}

#[test]
fn test_damage_notifications_follow_ledger_changes() {
    let mut monitor = MonitorSetup::new().without_sensor_loss().build();
    let (_, snapshots) = monitor.record_damage();

    // Initial state is published once, then nothing while idle.
    monitor.tick(5);
    assert_eq!(recorded(&snapshots).len(), 1);

    monitor.trigger_earthquake(EarthquakeConfig {
        intensity: 1.0,
        duration_ms: 500,
        epicenter: TEST_CENTER,
    });
    monitor.tick(10);
    let after_event = recorded(&snapshots);
    assert_eq!(after_event.len(), 2, "one notification for the merge");
    let merged = after_event.last().expect("snapshot");
    assert_eq!(merged.tick, 15);
    assert_eq!(merged.summary, monitor.summary());
    for (id, record) in &merged.records {
        assert_eq!(monitor.damage_record(*id).as_ref(), Some(record));
    }

    monitor.reset_all();
    monitor.tick(1);
    assert_eq!(recorded(&snapshots).len(), 3);
}

#[test]
fn test_earthquake_listener_can_unsubscribe() {
    let mut monitor = TestMonitor::new();
    let (handle, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(EarthquakeConfig {
        intensity: 1.0,
        duration_ms: 1000,
        epicenter: TEST_CENTER,
    });
    monitor.tick(4);
    assert!(monitor.unsubscribe_earthquake(handle));
    monitor.tick(16);

    assert_eq!(recorded(&updates).len(), 4);
    monitor.assert_event_active(false);
}
