use crate::buildings::{BuildingId, StructuralType};
use crate::earthquake::EarthquakeConfig;
use crate::fatigue::FatigueIndicator;
use crate::monitor_commands::{CommandError, CommandOutcome};
use crate::readings::ReadingClass;
use crate::synthesizer::natural_frequency;
use crate::test_harness::{building, line_east, MonitorSetup, TEST_CENTER};

#[test]
fn test_steady_building_has_no_warning() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 1, 0.0))
        .base_score(0)
        .build();
    monitor.tick(40);

    let indicator = monitor.fatigue_indicator(BuildingId(0)).expect("known");
    assert_eq!(indicator.sample_count, 40);
    assert!(!indicator.has_warning, "{indicator:?}");
    let baseline = indicator.baseline_frequency_hz.expect("baseline after 10 samples");
    assert!((baseline - natural_frequency(0.0)).abs() < 0.03);
    assert!(indicator.deviation_pct.abs() < 1.5);
}

#[test]
fn test_damage_step_raises_fatigue_warning() {
    // Old, tall masonry at the epicenter: vulnerability 1.5 * 1.3 * 1.2.
    let fragile = building(0, TEST_CENTER, StructuralType::Masonry, 6, 1960);
    let mut monitor = MonitorSetup::new()
        .buildings(vec![fragile])
        .base_score(0)
        .without_damage_jitter()
        .build();

    monitor.tick(60);
    monitor.trigger_earthquake(EarthquakeConfig {
        intensity: 2.0,
        duration_ms: 500,
        epicenter: TEST_CENTER,
    });
    monitor.tick(10);
    assert_eq!(monitor.damage_record(BuildingId(0)).map(|r| r.total_score), Some(70));
    monitor.tick(59);

    let indicator = monitor.fatigue_indicator(BuildingId(0)).expect("known");
    assert_eq!(indicator.sample_count, 120, "seismic samples are not counted");
    assert!(indicator.trend_slope < -0.005, "{indicator:?}");
    assert!(indicator.trend_confidence > 0.6, "{indicator:?}");
    assert!(indicator.deviation_pct < -40.0, "{indicator:?}");
    assert!(indicator.has_warning);

    let observation = monitor.observation();
    assert_eq!(observation.fatigue_warnings, vec![BuildingId(0)]);
}

#[test]
fn test_noise_pulse_samples_are_skipped() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 2, 0.5))
        .base_score(0)
        .build();
    monitor.tick(10);

    let outcome = monitor.inject_noise_pulse(BuildingId(1));
    assert!(outcome.is_applied());
    monitor.tick(1);
    let reading = monitor.reading(BuildingId(1)).expect("reading");
    assert_eq!(reading.classification, ReadingClass::Noise);
    assert!((8.0..=10.0).contains(&reading.dominant_frequency_hz));

    monitor.tick(9);
    let pulsed = monitor.fatigue_indicator(BuildingId(1)).expect("known");
    let steady = monitor.fatigue_indicator(BuildingId(0)).expect("known");
    assert_eq!(steady.sample_count, 20);
    assert_eq!(pulsed.sample_count, 15, "five pulse ticks excluded");
    assert_eq!(
        monitor.reading(BuildingId(1)).map(|r| r.classification),
        Some(ReadingClass::Idle)
    );
}

#[test]
fn test_reset_fatigue_for_one_building() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 2, 0.5))
        .base_score(0)
        .build();
    monitor.tick(25);

    assert!(monitor.reset_fatigue(Some(BuildingId(0))).is_applied());
    assert_eq!(
        monitor.fatigue_indicator(BuildingId(0)),
        Some(FatigueIndicator::empty())
    );
    assert_eq!(
        monitor.fatigue_indicator(BuildingId(1)).map(|i| i.sample_count),
        Some(25)
    );

    monitor.tick(3);
    assert_eq!(
        monitor.fatigue_indicator(BuildingId(0)).map(|i| i.sample_count),
        Some(3)
    );
}

#[test]
fn test_reset_fatigue_rejects_unknown_building() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 2, 0.5))
        .build();
    let outcome = monitor.reset_fatigue(Some(BuildingId(77)));
    assert_eq!(
        outcome,
        CommandOutcome::Rejected(CommandError::UnknownBuilding(BuildingId(77)))
    );
}

#[test]
fn test_reset_all_clears_every_history() {
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 3, 0.5))
        .build();
    monitor.tick(30);
    monitor.reset_all();
    for id in 0..3 {
        assert_eq!(
            monitor.fatigue_indicator(BuildingId(id)),
            Some(FatigueIndicator::empty())
        );
    }
}
