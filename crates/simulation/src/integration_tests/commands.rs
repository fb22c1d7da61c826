use crate::buildings::BuildingId;
use crate::earthquake::EarthquakeConfig;
use crate::monitor_commands::{
    CommandError, CommandOutcome, CommandSource, MonitorCommand, MonitorCommandQueue,
};
use crate::test_harness::{TestMonitor, TEST_CENTER};

fn quake() -> EarthquakeConfig {
    EarthquakeConfig {
        intensity: 1.0,
        duration_ms: 1000,
        epicenter: TEST_CENTER,
    }
}

#[test]
fn test_queued_trigger_starts_on_next_tick() {
    let mut monitor = TestMonitor::new();
    monitor.enqueue(MonitorCommand::TriggerEarthquake(quake()));
    monitor.assert_event_active(false);

    monitor.tick(1);
    monitor.assert_event_active(true);
    assert_eq!(monitor.active_run().map(|r| r.tick), Some(1));
    let (command, outcome) = monitor.command_log().latest().expect("logged");
    assert_eq!(command.name(), MonitorCommand::TriggerEarthquake(quake()).name());
    assert!(outcome.is_applied());
}

#[test]
fn test_queue_drains_in_order() {
    let mut monitor = TestMonitor::new();
    {
        let mut queue = monitor
            .world_mut()
            .resource_mut::<MonitorCommandQueue>();
        queue.push(0, CommandSource::Automation, MonitorCommand::TriggerEarthquake(quake()));
        queue.push(0, CommandSource::Automation, MonitorCommand::TriggerEarthquake(quake()));
    }
    monitor.tick(1);

    let log = monitor.command_log().last_n(2).to_vec();
    assert_eq!(log.len(), 2);
    assert!(log[0].1.is_applied());
    assert!(matches!(log[1].1, CommandOutcome::Ignored(_)));
    assert!(monitor.resource::<MonitorCommandQueue>().is_empty());
}

#[test]
fn test_noise_pulse_ignored_during_event() {
    let mut monitor = TestMonitor::new().with_earthquake(quake());
    monitor.tick(2);
    let outcome = monitor.inject_noise_pulse(BuildingId(1));
    assert!(matches!(outcome, CommandOutcome::Ignored(_)), "{outcome:?}");
}

#[test]
fn test_noise_pulse_on_silenced_sensor_ignored() {
    let mut monitor = TestMonitor::new();
    monitor.tick(1);
    monitor.silence_sensor(BuildingId(2));
    let outcome = monitor.inject_noise_pulse(BuildingId(2));
    assert!(outcome.reason().is_some_and(|r| r.contains("silenced")));
}

#[test]
fn test_noise_pulse_unknown_building_rejected() {
    let mut monitor = TestMonitor::new();
    let outcome = monitor.inject_noise_pulse(BuildingId(500));
    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CommandError::UnknownBuilding(BuildingId(500)))
    );
}

#[test]
fn test_command_log_is_bounded() {
    let mut monitor = TestMonitor::new();
    for _ in 0..70 {
        monitor.reset_fatigue(None);
    }
    assert_eq!(monitor.command_log().len(), 64);
}

#[test]
fn test_reset_is_logged_as_applied() {
    let mut monitor = TestMonitor::new();
    monitor.reset_all();
    let (command, outcome) = monitor.command_log().latest().expect("logged");
    assert_eq!(*command, MonitorCommand::Reset);
    assert_eq!(*outcome, CommandOutcome::Applied);
}
