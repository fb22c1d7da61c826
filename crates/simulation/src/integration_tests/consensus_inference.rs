use crate::buildings::BuildingId;
use crate::damage_ledger::BuildingStatus;
use crate::earthquake::EarthquakeConfig;
use crate::test_harness::{cluster, MonitorSetup, TestMonitor, TEST_CENTER};

const TARGET: BuildingId = BuildingId(0);

/// Quiet, long event so nothing is lost or damaged on its own.
fn long_quiet_quake() -> EarthquakeConfig {
    EarthquakeConfig {
        intensity: 0.1,
        duration_ms: 10_000,
        epicenter: TEST_CENTER,
    }
}

/// `count` buildings, the target at the centre and the rest on a ring.
fn monitor_with_ring(count: u32, radius_km: f64) -> TestMonitor {
    MonitorSetup::new()
        .buildings(cluster(TEST_CENTER, count, radius_km))
        .base_score(0)
        .without_sensor_loss()
        .build()
}

#[test]
fn test_silent_building_with_active_neighbours_is_inferred_collapsed() {
    let mut monitor = monitor_with_ring(5, 0.5).with_earthquake(long_quiet_quake());
    monitor.tick(2);
    monitor.silence_sensor(TARGET);

    // Below the 1 s silence threshold.
    monitor.tick(10);
    monitor.assert_status(TARGET, BuildingStatus::Stable);
    assert!(monitor.consensus_evidence(TARGET).is_none());

    monitor.tick(15);
    monitor.assert_status(TARGET, BuildingStatus::CollapseInferred);
    assert_eq!(
        monitor.consensus_evidence(TARGET),
        Some(vec![BuildingId(1), BuildingId(2), BuildingId(3), BuildingId(4)])
    );
    assert_eq!(monitor.summary().collapsed, 1);
    monitor.assert_summary_covers_population();

    // The score itself is untouched by the override.
    let record = monitor.damage_record(TARGET).expect("record");
    assert_eq!(record.total_score, 0);
}

#[test]
fn test_resumed_heartbeat_retracts_inference() {
    let mut monitor = monitor_with_ring(5, 0.5).with_earthquake(long_quiet_quake());
    monitor.tick(2);
    monitor.silence_sensor(TARGET);
    monitor.tick(25);
    monitor.assert_status(TARGET, BuildingStatus::CollapseInferred);

    monitor.restore_sensor(TARGET);
    monitor.tick(1);
    monitor.assert_reporting(TARGET);
    monitor.assert_status(TARGET, BuildingStatus::Stable);
    assert!(monitor.consensus_evidence(TARGET).is_none());
    assert_eq!(monitor.summary().collapsed, 0);
}

#[test]
fn test_too_few_witnesses_no_inference() {
    let mut monitor = monitor_with_ring(3, 0.5).with_earthquake(long_quiet_quake());
    monitor.tick(2);
    monitor.silence_sensor(TARGET);
    monitor.tick(40);
    monitor.assert_status(TARGET, BuildingStatus::Stable);
}

#[test]
fn test_witnesses_beyond_radius_do_not_count() {
    let mut monitor = monitor_with_ring(5, 2.0).with_earthquake(long_quiet_quake());
    monitor.tick(2);
    monitor.silence_sensor(TARGET);
    monitor.tick(40);
    monitor.assert_status(TARGET, BuildingStatus::Stable);
}

#[test]
fn test_no_inference_while_idle() {
    let mut monitor = monitor_with_ring(5, 0.5);
    monitor.tick(2);
    monitor.silence_sensor(TARGET);
    monitor.tick(40);
    monitor.assert_silent(TARGET);
    monitor.assert_status(TARGET, BuildingStatus::Stable);
}

#[test]
fn test_reset_clears_inference_and_silence() {
    let mut monitor = monitor_with_ring(5, 0.5).with_earthquake(long_quiet_quake());
    monitor.tick(2);
    monitor.silence_sensor(TARGET);
    monitor.tick(25);
    monitor.assert_status(TARGET, BuildingStatus::CollapseInferred);

    monitor.reset_all();
    monitor.assert_event_active(false);
    assert!(monitor.silenced().is_empty());
    assert!(monitor.consensus_evidence(TARGET).is_none());
    assert_ne!(monitor.status(TARGET), Some(BuildingStatus::CollapseInferred));

    monitor.tick(1);
    monitor.assert_reporting(TARGET);
}

#[test]
fn test_sensor_loss_during_quake_leads_to_inference() {
    let mut monitor = MonitorSetup::new()
        .buildings(cluster(TEST_CENTER, 12, 0.5))
        .base_score(80)
        .build()
        .with_earthquake(EarthquakeConfig {
            intensity: 2.0,
            duration_ms: 5000,
            epicenter: TEST_CENTER,
        });

    // Tick until the first inference; it must land while the event runs.
    let mut first_inference = None;
    while monitor.is_event_active() {
        monitor.tick(1);
        let inferred = monitor.ledger().inferred().next();
        if let Some(id) = inferred {
            first_inference = Some((id, monitor.tick_count(), monitor.is_event_active()));
            break;
        }
    }
    let (first, tick, active) = first_inference.expect("an inference during the event");
    assert!(active, "inferred at tick {tick} after the event ended");
    assert!(tick > 20, "needs a full silence window, got tick {tick}");
    assert!(monitor.silenced().contains(&first));

    monitor.run_until_idle(200);
    monitor.assert_event_active(false);

    let silenced = monitor.silenced();
    let mut inferred_count = 0;
    for building in monitor.buildings().iter() {
        let id = building.id;
        let record = monitor.damage_record(id).expect("record");
        assert!(record.earthquake_damage > 0, "{id} missing merged damage");
        assert_eq!(record.total_score, 100);

        match monitor.status(id) {
            Some(BuildingStatus::CollapseInferred) => {
                inferred_count += 1;
                assert!(silenced.contains(&id), "{id} inferred while reporting");
                let witnesses = monitor.consensus_evidence(id).expect("evidence");
                assert!(witnesses.len() >= 3, "{id}: {witnesses:?}");
                assert!(witnesses.windows(2).all(|w| w[0] < w[1]));
                assert!(!witnesses.contains(&id));
            }
            Some(BuildingStatus::Collapse) => {
                assert!(monitor.consensus_evidence(id).is_none());
            }
            other => panic!("{id} ended as {other:?}"),
        }
    }
    assert!(inferred_count >= 1);
    assert_eq!(monitor.summary().collapsed, 12);
    monitor.assert_summary_covers_population();
}
