//! Headless runner: ticks one monitored world in real time, triggers a
//! single earthquake, logs what collaborators would see and exits once the
//! event has settled.

mod config;

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use simulation::damage_ledger::DamageSummary;
use simulation::earthquake::{EarthquakeConfig, EarthquakeUpdate, MonitorPhase};
use simulation::listeners::{DamageListeners, EarthquakeListeners, ReadingListeners};
use simulation::monitor_commands::{CommandSource, MonitorCommand, MonitorCommandQueue};
use simulation::observation::MonitorObservation;
use simulation::params::MonitorParams;
use simulation::sim_rng::SimRng;
use simulation::TickCounter;

use config::RunnerConfig;

/// Readings are summarised once per this many ticks.
const READING_LOG_EVERY: u64 = 20;

fn main() {
    let config = RunnerConfig::from_env();

    let mut params = MonitorParams::default();
    params.population.building_count = config.building_count;
    let rng = match config.seed {
        Some(seed) => SimRng::from_seed_u64(seed),
        None => SimRng::from_entropy(),
    };

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(
            params.tick_interval_ms / 5,
        ))),
    )
    .add_plugins(LogPlugin::default())
    .insert_resource(params)
    .insert_resource(rng)
    .insert_resource(Scenario::new(config))
    .add_plugins(simulation::SimulationPlugin)
    .add_systems(Startup, (report_config_issues, register_console_listeners))
    .add_systems(Update, (drive_scenario, finish_run).chain());

    app.run();
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScenarioStage {
    Waiting,
    Queued,
    Running,
    Settling { since_tick: u64 },
    Done,
}

#[derive(Resource, Debug)]
struct Scenario {
    config: RunnerConfig,
    stage: ScenarioStage,
}

impl Scenario {
    fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            stage: ScenarioStage::Waiting,
        }
    }
}

fn drive_scenario(
    tick: Res<TickCounter>,
    phase: Res<MonitorPhase>,
    params: Res<MonitorParams>,
    mut queue: ResMut<MonitorCommandQueue>,
    mut scenario: ResMut<Scenario>,
) {
    let now = tick.0;
    scenario.stage = match scenario.stage {
        ScenarioStage::Waiting if now >= scenario.config.quake_at_tick => {
            let quake = EarthquakeConfig {
                intensity: scenario.config.quake_intensity,
                duration_ms: scenario.config.quake_duration_ms,
                epicenter: params.population.center,
            };
            queue.push(
                now,
                CommandSource::Automation,
                MonitorCommand::TriggerEarthquake(quake),
            );
            ScenarioStage::Queued
        }
        ScenarioStage::Queued if phase.is_event_active() => ScenarioStage::Running,
        ScenarioStage::Running if !phase.is_event_active() => {
            ScenarioStage::Settling { since_tick: now }
        }
        ScenarioStage::Settling { since_tick }
            if now.saturating_sub(since_tick) >= scenario.config.linger_ticks =>
        {
            ScenarioStage::Done
        }
        stage => stage,
    };
}

/// Environment problems found before logging was installed.
fn report_config_issues(scenario: Res<Scenario>) {
    for issue in &scenario.config.ignored {
        warn!("{issue}");
    }
}

/// Log the final observation and stop the runner.
fn finish_run(world: &mut World) {
    if world.resource::<Scenario>().stage != ScenarioStage::Done {
        return;
    }
    let observation = MonitorObservation::capture(world);
    match observation.to_json() {
        Ok(json) => info!("Final observation: {json}"),
        Err(err) => warn!("Final observation could not be serialised: {err}"),
    }
    log_summary("Final", observation.summary);
    world.send_event(AppExit::Success);
}

// ---------------------------------------------------------------------------
// Console listeners
// ---------------------------------------------------------------------------

fn register_console_listeners(
    mut readings: ResMut<ReadingListeners>,
    mut damage: ResMut<DamageListeners>,
    mut earthquakes: ResMut<EarthquakeListeners>,
) {
    readings.add(|snapshot| {
        if snapshot.tick % READING_LOG_EVERY != 0 {
            return;
        }
        let peak = snapshot
            .readings
            .iter()
            .max_by(|a, b| a.1.magnitude.total_cmp(&b.1.magnitude));
        if let Some((id, reading)) = peak {
            info!(
                "tick {}: {} sensors reporting, strongest {id} at {:.3} g / {:.2} Hz ({:?})",
                snapshot.tick,
                snapshot.readings.len(),
                reading.magnitude,
                reading.dominant_frequency_hz,
                reading.classification,
            );
        }
    });

    damage.add(|snapshot| log_summary(&format!("tick {}", snapshot.tick), snapshot.summary));

    let mut last_quarter = None;
    earthquakes.add(move |update| match update {
        EarthquakeUpdate::Progress { tick, progress_pct } => {
            let quarter = (*progress_pct / 25.0).floor() as u32;
            if last_quarter != Some(quarter) {
                last_quarter = Some(quarter);
                info!("Earthquake tick {tick}: {progress_pct:.0}%");
            }
        }
        EarthquakeUpdate::Finished { damage, silenced } => {
            let worst = damage.iter().max_by_key(|(_, delta)| **delta);
            info!(
                "Earthquake finished: {} buildings hit, worst {:?}, {} sensors lost",
                damage.values().filter(|d| **d > 0).count(),
                worst,
                silenced.len(),
            );
        }
    });
}

fn log_summary(label: &str, summary: DamageSummary) {
    info!(
        "{label}: safe={} damaged={} critical={} collapsed={}",
        summary.safe, summary.damaged, summary.critical, summary.collapsed
    );
}
