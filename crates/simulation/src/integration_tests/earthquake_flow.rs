use crate::buildings::BuildingId;
use crate::earthquake::{EarthquakeConfig, EarthquakeUpdate};
use crate::monitor_commands::{CommandError, CommandOutcome};
use crate::readings::{ReadingClass, ReadingTable};
use crate::test_harness::{cluster, line_east, recorded, MonitorSetup, TestMonitor, TEST_CENTER};

fn quake(intensity: f64, duration_ms: u64) -> EarthquakeConfig {
    EarthquakeConfig {
        intensity,
        duration_ms,
        epicenter: TEST_CENTER,
    }
}

fn finished_damage(updates: &[EarthquakeUpdate]) -> crate::earthquake::DamageMap {
    updates
        .iter()
        .find_map(|u| match u {
            EarthquakeUpdate::Finished { damage, .. } => Some(damage.clone()),
            EarthquakeUpdate::Progress { .. } => None,
        })
        .expect("event should have finished")
}

#[test]
fn test_progress_stream_then_single_finished() {
    let mut monitor = TestMonitor::new();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(1.0, 1000));

    monitor.tick(20);
    monitor.assert_event_active(false);

    let updates = recorded(&updates);
    assert_eq!(updates.len(), 21, "20 progress updates and one finish");

    let mut last_pct = 0.0;
    for (idx, update) in updates[..20].iter().enumerate() {
        let EarthquakeUpdate::Progress { tick, progress_pct } = update else {
            panic!("expected progress at position {idx}, got {update:?}");
        };
        assert_eq!(*tick as usize, idx + 1);
        assert!(*progress_pct >= last_pct, "progress went backwards");
        last_pct = *progress_pct;
    }
    assert_eq!(last_pct, 100.0);
    assert!(matches!(updates[20], EarthquakeUpdate::Finished { .. }));
}

#[test]
fn test_finished_damage_is_merged_into_ledger() {
    let mut monitor = MonitorSetup::new().without_sensor_loss().build();
    let before: Vec<(BuildingId, u8)> = monitor
        .ledger()
        .records()
        .map(|(id, r)| (id, r.base_score))
        .collect();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(1.5, 500));
    monitor.tick(10);

    let damage = finished_damage(&recorded(&updates));
    assert_eq!(damage.len(), before.len());
    for (id, base) in before {
        let record = monitor.damage_record(id).expect("record");
        assert_eq!(record.base_score, base);
        assert_eq!(record.earthquake_damage, damage[&id]);
        assert_eq!(
            u32::from(record.total_score),
            (u32::from(base) + damage[&id]).min(100)
        );
    }
    monitor.assert_summary_covers_population();
}

#[test]
fn test_event_readings_are_seismic() {
    let mut monitor = MonitorSetup::new()
        .without_sensor_loss()
        .build()
        .with_earthquake(quake(1.0, 1000));
    monitor.tick(5);

    let table = monitor.resource::<ReadingTable>();
    assert_eq!(table.len(), 80);
    for (id, reading) in table.readings() {
        assert_eq!(reading.classification, ReadingClass::Seismic, "{id}");
        assert!(
            (2.0..=3.0).contains(&reading.dominant_frequency_hz),
            "{id}: {} Hz outside the resonant band",
            reading.dominant_frequency_hz
        );
    }
}

#[test]
fn test_final_tick_returns_to_idle_readings() {
    let mut monitor = MonitorSetup::new()
        .without_sensor_loss()
        .build()
        .with_earthquake(quake(1.0, 500));
    monitor.tick(10);

    monitor.assert_event_active(false);
    for reading in monitor.resource::<ReadingTable>().readings().values() {
        assert_eq!(reading.classification, ReadingClass::Idle);
    }
}

#[test]
fn test_second_trigger_is_ignored() {
    let mut monitor = TestMonitor::new().with_earthquake(quake(1.0, 2000));
    monitor.tick(3);

    let outcome = monitor.trigger_earthquake(quake(5.0, 500));
    assert!(matches!(outcome, CommandOutcome::Ignored(_)), "{outcome:?}");

    let run = monitor.active_run().expect("first event still running");
    assert_eq!(run.config.intensity, 1.0);
    assert_eq!(run.tick, 3);
    assert_eq!(run.total_ticks, 40);
}

#[test]
fn test_invalid_trigger_is_rejected() {
    let mut monitor = TestMonitor::new();
    let outcome = monitor.trigger_earthquake(quake(0.0, 1000));
    assert!(matches!(
        outcome,
        CommandOutcome::Rejected(CommandError::InvalidParameter(_))
    ));
    let outcome = monitor.trigger_earthquake(quake(1.0, 0));
    assert!(matches!(outcome, CommandOutcome::Rejected(_)));
    monitor.assert_event_active(false);
}

#[test]
fn test_epicenter_building_takes_largest_damage() {
    // Equal structural profile, 1 km apart, no jitter: damage follows distance.
    let mut monitor = MonitorSetup::new()
        .buildings(line_east(TEST_CENTER, 6, 1.0))
        .base_score(0)
        .without_damage_jitter()
        .build();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(3.0, 500));
    monitor.tick(10);

    let damage = finished_damage(&recorded(&updates));
    // 3.0 * 15 * distance factor 1.0 * vulnerability 1.0
    assert_eq!(damage[&BuildingId(0)], 45);
    let ordered: Vec<u32> = (0..6).map(|id| damage[&BuildingId(id)]).collect();
    for pair in ordered.windows(2) {
        assert!(pair[0] > pair[1], "damage should fall with distance: {ordered:?}");
    }
}

#[test]
fn test_epicenter_beats_distant_buildings_with_jitter() {
    let mut buildings = line_east(TEST_CENTER, 1, 0.0);
    buildings.extend(
        line_east(TEST_CENTER.offset_km(5.0, 0.0), 4, 0.5)
            .into_iter()
            .enumerate()
            .map(|(idx, mut b)| {
                b.id = BuildingId(idx as u32 + 1);
                b
            }),
    );
    let mut monitor = MonitorSetup::new().buildings(buildings).base_score(0).build();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(3.0, 500));
    monitor.tick(10);

    let damage = finished_damage(&recorded(&updates));
    let epicenter = damage[&BuildingId(0)];
    for id in 1..5 {
        assert!(epicenter > damage[&BuildingId(id)]);
    }
}

#[test]
fn test_violent_phase_silences_destroyed_sensors() {
    let mut monitor = MonitorSetup::new()
        .buildings(cluster(TEST_CENTER, 5, 0.3))
        .base_score(80)
        .build();
    let (_, updates) = monitor.record_earthquake();
    let mut monitor = monitor.with_earthquake(quake(3.0, 1000));
    monitor.tick(20);

    let updates = recorded(&updates);
    let Some(EarthquakeUpdate::Finished { silenced, .. }) = updates.last() else {
        panic!("event should have finished");
    };
    assert!(!silenced.is_empty(), "violent shaking should cost sensors");

    let mut lost = silenced.clone();
    lost.sort();
    assert_eq!(lost, monitor.silenced());

    monitor.tick(5);
    for id in lost {
        monitor.assert_silent(id);
    }
}
