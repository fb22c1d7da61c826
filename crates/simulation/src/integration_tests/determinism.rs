use crate::earthquake::EarthquakeConfig;
use crate::test_harness::{MonitorSetup, TestMonitor, TEST_CENTER};

fn scripted_run(seed: u64) -> (Vec<u64>, TestMonitor) {
    let mut monitor = MonitorSetup::new().seed(seed).build();
    let mut hashes = Vec::new();
    for tick in 0..60 {
        if tick == 10 {
            monitor.trigger_earthquake(EarthquakeConfig {
                intensity: 2.0,
                duration_ms: 1500,
                epicenter: TEST_CENTER.offset_km(0.8, -0.4),
            });
        }
        monitor.tick(1);
        hashes.push(monitor.state_hash());
    }
    (hashes, monitor)
}

#[test]
fn test_same_seed_same_hash_sequence() {
    let (a_hashes, a) = scripted_run(7);
    let (b_hashes, b) = scripted_run(7);
    assert_eq!(a_hashes, b_hashes);
    assert_eq!(a.summary(), b.summary());
    assert_eq!(a.silenced(), b.silenced());
    assert_eq!(a.buildings().len(), b.buildings().len());
    for (x, y) in a.buildings().iter().zip(b.buildings().iter()) {
        assert_eq!(x, y);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let (a_hashes, _) = scripted_run(7);
    let (b_hashes, _) = scripted_run(8);
    assert_ne!(a_hashes[0], b_hashes[0]);
}

#[test]
fn test_hash_changes_every_tick() {
    let (hashes, _) = scripted_run(3);
    for pair in hashes.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
}

#[test]
fn test_worlds_are_independent() {
    let mut a = MonitorSetup::new().seed(1).build();
    let b = MonitorSetup::new().seed(1).build();
    a.tick(5);
    assert_eq!(a.tick_count(), 5);
    assert_eq!(b.tick_count(), 0);
    assert_eq!(b.now_ms(), 0);
    assert!(b.reading(crate::buildings::BuildingId(0)).is_none());
}

#[test]
fn test_observation_exports_json() {
    let mut monitor = TestMonitor::new().with_earthquake(EarthquakeConfig {
        intensity: 1.0,
        duration_ms: 1000,
        epicenter: TEST_CENTER,
    });
    monitor.tick(4);

    let observation = monitor.observation();
    assert_eq!(observation.tick, 4);
    assert_eq!(observation.buildings.len(), 80);
    assert_eq!(observation.summary.total(), 80);

    let json = observation.to_json().expect("serialize");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["phase"]["state"], "running_event");
    assert_eq!(value["phase"]["tick"], 4);
    assert_eq!(value["phase"]["total_ticks"], 20);
    assert_eq!(value["state_hash"], monitor.state_hash());
    assert_eq!(
        value["recent_command_results"][0]["outcome"],
        serde_json::json!("Applied")
    );
}
