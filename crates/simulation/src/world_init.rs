// =============================================================================
// World generation: the fixed building population and its initial damage
// ledger.
// =============================================================================

use bevy::prelude::*;
use rand::Rng;

use crate::buildings::{Building, BuildingId, BuildingRoster, GeoPoint, InspectionDate, StructuralType};
use crate::consensus::ConsensusEvidence;
use crate::damage_ledger::DamageLedger;
use crate::earthquake::MonitorPhase;
use crate::fatigue::FatigueTracker;
use crate::monitor_commands::{CommandOutcome, CommandResultLog, MonitorCommandQueue};
use crate::params::{MonitorParams, PopulationParams};
use crate::readings::{Heartbeats, ReadingTable, SilencedSensors};
use crate::sim_rng::SimRng;
use crate::synthesizer::NoisePulses;

const DISTRICTS: [&str; 8] = [
    "Harbor",
    "Old Town",
    "Riverside",
    "Hillcrest",
    "Market",
    "Station",
    "University",
    "Lighthouse",
];

/// Startup system: generates the roster unless one was inserted beforehand
/// (the test harness supplies hand-placed buildings), then assigns the
/// initial base scores.
pub fn init_world(
    params: Res<MonitorParams>,
    mut rng: ResMut<SimRng>,
    mut roster: ResMut<BuildingRoster>,
    mut ledger: ResMut<DamageLedger>,
) {
    if roster.is_empty() {
        *roster = BuildingRoster::new(generate_population(&params.population, &mut rng.0));
    }
    if ledger.is_empty() {
        ledger.reset(&roster, &params.population, &mut rng.0);
    }
    info!(
        "Monitor world initialised: {} buildings around ({:.4}, {:.4})",
        roster.len(),
        params.population.center.lat,
        params.population.center.lng,
    );
}

/// Fresh base scores for the existing roster. Clears every derived state and
/// supersedes a running event as well as triggers still waiting in the queue.
pub fn reset_world(world: &mut World) {
    let superseded = world.resource::<MonitorPhase>().is_event_active();
    *world.resource_mut::<MonitorPhase>() = MonitorPhase::Idle;

    let dropped = world.resource_mut::<MonitorCommandQueue>().take_triggers();
    if !dropped.is_empty() {
        info!("Reset dropped {} queued earthquake trigger(s)", dropped.len());
    }
    let mut log = world.resource_mut::<CommandResultLog>();
    for entry in dropped {
        log.push(
            entry.command,
            CommandOutcome::Ignored("superseded by reset".to_string()),
        );
    }

    world.resource_scope(|world, mut ledger: Mut<DamageLedger>| {
        world.resource_scope(|world, mut rng: Mut<SimRng>| {
            ledger.reset(
                world.resource::<BuildingRoster>(),
                &world.resource::<MonitorParams>().population,
                &mut rng.0,
            );
        });
    });
    world.resource_mut::<Heartbeats>().clear();
    world.resource_mut::<ConsensusEvidence>().clear();
    world.resource_mut::<SilencedSensors>().clear();
    world.resource_mut::<NoisePulses>().clear();
    world.resource_mut::<ReadingTable>().clear();
    world.resource_mut::<FatigueTracker>().reset(None);

    let summary = world.resource::<DamageLedger>().summary();
    info!(
        "Monitor reset{}: safe={} damaged={} critical={} collapsed={}",
        if superseded { " (running event cancelled)" } else { "" },
        summary.safe,
        summary.damaged,
        summary.critical,
        summary.collapsed,
    );
}

/// Scatter `building_count` buildings uniformly over a disc around the
/// configured centre with random structural metadata.
pub fn generate_population<R: Rng + ?Sized>(params: &PopulationParams, rng: &mut R) -> Vec<Building> {
    (0..params.building_count)
        .map(|idx| {
            // sqrt keeps the density uniform over the disc
            let radius = params.spread_km * rng.gen::<f64>().sqrt();
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let position = params
                .center
                .offset_km(radius * angle.cos(), radius * angle.sin());
            random_building(BuildingId(idx as u32), position, rng)
        })
        .collect()
}

fn random_building<R: Rng + ?Sized>(id: BuildingId, position: GeoPoint, rng: &mut R) -> Building {
    let district = DISTRICTS[id.0 as usize % DISTRICTS.len()];
    let block = id.0 as usize / DISTRICTS.len() + 1;
    let structural_type = StructuralType::ALL[rng.gen_range(0..StructuralType::ALL.len())];
    let floors = match structural_type {
        StructuralType::Timber => rng.gen_range(1..=3),
        StructuralType::Masonry => rng.gen_range(1..=6),
        StructuralType::ReinforcedConcrete | StructuralType::Steel => rng.gen_range(2..=20),
    };
    Building {
        id,
        name: format!("{district} Block {block:02}"),
        position,
        floors,
        year_built: rng.gen_range(1925..=2022),
        structural_type,
        last_inspection: InspectionDate {
            year: rng.gen_range(2015..=2025),
            month: rng.gen_range(1..=12),
            day: rng.gen_range(1..=28),
        },
        sensor_id: format!("SHM-{:04X}", 0x1000 + id.0),
    }
}
