//! Bevy integration: generator resource, command events in, placement events out.

use bevy::prelude::*;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::exits::CloseReason;
use crate::generator::{AppendOutcome, AppendTask, GeneratorEvent, GridGenerator, SpawnPoint, TaskStep};
use crate::layout::LayoutLibrary;
use crate::orientation::Orientation;

pub struct TileChainPlugin {
    pub config: GeneratorConfig,
    pub library: LayoutLibrary,
}

impl Default for TileChainPlugin {
    fn default() -> Self {
        Self {
            config: GeneratorConfig::default(),
            library: LayoutLibrary::builtin(),
        }
    }
}

impl Plugin for TileChainPlugin {
    fn build(&self, app: &mut App) {
        let generator = GridGenerator::new(self.config.clone(), self.library.clone());

        app.insert_resource(TileChainGenerator(generator))
            .init_resource::<PendingAppend>()
            .add_event::<GenerationCommand>()
            .add_event::<TilePlacedEvent>()
            .add_event::<ExitClosedEvent>()
            .add_event::<SpawnPointAddedEvent>()
            .add_event::<AppendFinishedEvent>()
            .add_systems(Startup, generate_on_start_system)
            .add_systems(
                Update,
                (
                    handle_generation_commands,
                    drive_pending_append,
                    publish_generator_events,
                )
                    .chain(),
            );
    }
}

#[derive(Resource)]
pub struct TileChainGenerator(pub GridGenerator);

/// Frame-yielding append in flight, stepped once per `Update`
#[derive(Resource, Default)]
pub struct PendingAppend(pub Option<AppendTask>);

/// Requests from UI or gameplay code
#[derive(Event, Debug, Clone)]
pub enum GenerationCommand {
    GenerateFirst,
    AppendNext,
    /// Spread the attempts over frames
    AppendNextAsync,
    /// Forced-template append by pool layout name
    AppendWithLayout(String),
    SelectExit(usize),
    SelectExitByLabel(String),
    CleanupCaches,
    Reset,
}

#[derive(Event, Debug, Clone)]
pub struct TilePlacedEvent {
    pub tile_index: usize,
    pub layout: String,
    pub origin: Vec3,
    pub orientation: Orientation,
}

#[derive(Event, Debug, Clone)]
pub struct ExitClosedEvent {
    pub exit_index: usize,
    pub reason: CloseReason,
}

#[derive(Event, Debug, Clone)]
pub struct SpawnPointAddedEvent(pub SpawnPoint);

#[derive(Event, Debug, Clone)]
pub struct AppendFinishedEvent {
    pub outcome: AppendOutcome,
}

fn generate_on_start_system(mut gen: ResMut<TileChainGenerator>) {
    if gen.0.config().generate_on_start {
        // failures are logged by the generator
        let _ = gen.0.generate_first();
    }
}

fn handle_generation_commands(
    mut commands: EventReader<GenerationCommand>,
    mut gen: ResMut<TileChainGenerator>,
    mut pending: ResMut<PendingAppend>,
    mut finished: EventWriter<AppendFinishedEvent>,
) {
    for command in commands.read() {
        debug!(?command, "generation command");
        match command {
            GenerationCommand::GenerateFirst => {
                let _ = gen.0.generate_first();
            }
            GenerationCommand::AppendNext => {
                let outcome = gen.0.append_next_using_selected_exit();
                finished.send(AppendFinishedEvent { outcome });
            }
            GenerationCommand::AppendNextAsync => {
                if pending.0.is_some() {
                    warn!("append already in flight, ignoring");
                    continue;
                }
                pending.0 = Some(gen.0.begin_append());
            }
            GenerationCommand::AppendWithLayout(name) => {
                let Some(layout) = gen.0.library().candidate(name).cloned() else {
                    warn!(layout = %name, "unknown layout requested");
                    continue;
                };
                let outcome = gen.0.append_next_using_selected_exit_with_layout(&layout);
                finished.send(AppendFinishedEvent { outcome });
            }
            GenerationCommand::SelectExit(index) => gen.0.set_exit_index(*index),
            GenerationCommand::SelectExitByLabel(label) => {
                if !gen.0.set_exit_by_label(label) {
                    warn!(%label, "no open exit with label");
                }
            }
            GenerationCommand::CleanupCaches => gen.0.cleanup_caches(),
            GenerationCommand::Reset => gen.0.reset(),
        }
    }
}

fn drive_pending_append(
    mut gen: ResMut<TileChainGenerator>,
    mut pending: ResMut<PendingAppend>,
    mut finished: EventWriter<AppendFinishedEvent>,
) {
    let Some(task) = pending.0.as_mut() else {
        return;
    };
    match task.step(&mut gen.0) {
        TaskStep::Pending { attempts } => debug!(attempts, "append pending"),
        TaskStep::Finished(outcome) => {
            info!(?outcome, "async append finished");
            pending.0 = None;
            finished.send(AppendFinishedEvent { outcome });
        }
    }
}

fn publish_generator_events(
    mut gen: ResMut<TileChainGenerator>,
    mut placed: EventWriter<TilePlacedEvent>,
    mut closed: EventWriter<ExitClosedEvent>,
    mut spawns: EventWriter<SpawnPointAddedEvent>,
) {
    for event in gen.0.drain_events() {
        match event {
            GeneratorEvent::TilePlaced {
                tile_index,
                layout,
                origin,
                orientation,
                ..
            } => {
                placed.send(TilePlacedEvent {
                    tile_index,
                    layout,
                    origin,
                    orientation,
                });
            }
            GeneratorEvent::ExitClosed { exit_index, reason } => {
                closed.send(ExitClosedEvent { exit_index, reason });
            }
            GeneratorEvent::SpawnPointAdded(point) => {
                spawns.send(SpawnPointAddedEvent(point));
            }
        }
    }
}
