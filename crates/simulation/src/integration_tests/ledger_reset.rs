use crate::buildings::BuildingId;
use crate::damage_ledger::BuildingStatus;
use crate::earthquake::{EarthquakeConfig, EarthquakeUpdate};
use crate::monitor_commands::{CommandOutcome, MonitorCommand, MonitorCommandQueue};
use crate::test_harness::{line_east, recorded, MonitorSetup, TestMonitor, TEST_CENTER};

fn quake(intensity: f64, duration_ms: u64) -> EarthquakeConfig {
    EarthquakeConfig {
        intensity,
        duration_ms,
        epicenter: TEST_CENTER,
    }
}

#[test]
fn test_reset_population_has_two_elevated_buildings() {
    let mut monitor = TestMonitor::new();
    monitor.tick(5);
    monitor.reset_all();

    let summary = monitor.summary();
    assert_eq!(summary.total(), 80);
    assert!(
        summary.damaged + summary.critical + summary.collapsed >= 2,
        "expected at least two damaged buildings, got {summary:?}"
    );
    for (_, record) in monitor.ledger().records() {
        assert_eq!(record.earthquake_damage, 0);
        assert_eq!(record.total_score, record.base_score);
    }
}

#[test]
fn test_reset_supersedes_running_event() {
    let mut monitor = MonitorSetup::new().without_sensor_loss().build();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(2.0, 1000));
    monitor.tick(5);

    monitor.reset_all();
    monitor.assert_event_active(false);
    monitor.tick(30);

    let updates = recorded(&updates);
    assert_eq!(updates.len(), 5, "only the pre-reset progress updates");
    assert!(updates
        .iter()
        .all(|u| matches!(u, EarthquakeUpdate::Progress { .. })));
    assert!(monitor
        .ledger()
        .records()
        .all(|(_, r)| r.earthquake_damage == 0));
}

#[test]
fn test_reset_drops_queued_trigger() {
    let mut monitor = TestMonitor::new();
    let (_, updates) = monitor.record_earthquake();
    monitor.enqueue(MonitorCommand::TriggerEarthquake(quake(1.0, 5000)));
    monitor.enqueue(MonitorCommand::ResetFatigue { building: None });

    monitor.reset_all();
    assert_eq!(monitor.resource::<MonitorCommandQueue>().len(), 1);
    let log = monitor.command_log().last_n(2).to_vec();
    assert!(matches!(log[0].0, MonitorCommand::TriggerEarthquake(_)));
    assert_eq!(
        log[0].1,
        CommandOutcome::Ignored("superseded by reset".to_string())
    );
    assert_eq!(log[1].0, MonitorCommand::Reset);

    monitor.tick(3);
    monitor.assert_event_active(false);
    assert!(recorded(&updates).is_empty());
    assert!(monitor.command_log().latest().is_some_and(|(command, outcome)| {
        *command == MonitorCommand::ResetFatigue { building: None } && outcome.is_applied()
    }));
}

#[test]
fn test_trigger_queued_after_reset_still_runs() {
    let mut monitor = TestMonitor::new();
    monitor.reset_all();
    monitor.enqueue(MonitorCommand::TriggerEarthquake(quake(1.0, 1000)));
    monitor.tick(1);
    monitor.assert_event_active(true);
}

#[test]
fn test_damage_accumulates_across_events() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 3, 1.0))
        .base_score(0)
        .without_damage_jitter()
        .build();

    monitor.trigger_earthquake(quake(1.0, 500));
    monitor.tick(10);
    monitor.trigger_earthquake(quake(1.0, 500));
    monitor.tick(10);

    let record = monitor.damage_record(BuildingId(0)).expect("record");
    assert_eq!(record.earthquake_damage, 30);
    assert_eq!(record.total_score, 30);
    monitor.assert_status(BuildingId(0), BuildingStatus::Warning);
}

#[test]
fn test_total_score_saturates_at_collapse() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 1, 0.0))
        .base_score(60)
        .without_damage_jitter()
        .without_sensor_loss()
        .build()
        .with_earthquake(quake(5.0, 500));
    monitor.tick(10);

    let record = monitor.damage_record(BuildingId(0)).expect("record");
    assert_eq!(record.earthquake_damage, 75);
    assert_eq!(record.total_score, 100);
    monitor.assert_status(BuildingId(0), BuildingStatus::Collapse);
    assert_eq!(monitor.summary().collapsed, 1);
}

#[test]
fn test_reset_brings_silenced_sensors_back() {
    let mut monitor = TestMonitor::new();
    monitor.tick(1);
    monitor.silence_sensor(BuildingId(3));
    monitor.tick(3);
    monitor.assert_silent(BuildingId(3));

    monitor.reset_all();
    monitor.tick(1);
    monitor.assert_reporting(BuildingId(3));
}

#[test]
fn test_summary_matches_individual_statuses() {
    let mut monitor = TestMonitor::new().with_earthquake(quake(2.5, 1000));
    monitor.tick(20);

    let summary = monitor.summary();
    let ids: Vec<BuildingId> = monitor.buildings().ids().collect();
    let collapsed = ids
        .iter()
        .filter(|id| monitor.status(**id).is_some_and(BuildingStatus::is_collapsed))
        .count();
    let critical = ids
        .iter()
        .filter(|id| monitor.status(**id) == Some(BuildingStatus::Critical))
        .count();
    assert_eq!(summary.collapsed, collapsed);
    assert_eq!(summary.critical, critical);
    monitor.assert_summary_covers_population();
}
