//! Grid generator: grows a chain of oriented layout tiles from open exits.
//!
//! The generator owns every collection (chain, exits, overlap index, core,
//! spawn points) and keeps them consistent:
//!
//! 1. `generate_first` validates the setup and places the initial template.
//! 2. Each append resolves the selected Open exit, tries shuffled candidates
//!    against the overlap index and commits the first fit.
//! 3. After every commit the reconciliation pass closes Open exits whose next
//!    cell is already covered by another tile and records them as permanent
//!    spawn points.
//!
//! The frame-yielding variant is an [`AppendTask`] that performs one placement
//! attempt per [`AppendTask::step`]; the synchronous append drives the same
//! task to completion.

mod append_task;
mod preview;
mod rng;
mod spawn_points;

pub use append_task::{AppendTask, TaskStep};
pub use preview::{preview_note, PlacementPreview, PreviewStatus};
pub use rng::{session_rng, session_seed};
pub use spawn_points::{SpawnPoint, SpawnPointRegistry};

use std::sync::Arc;

use bevy::math::{IVec2, Vec2, Vec3};
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, error, info, warn};

use crate::anchor::CoreService;
use crate::candidates::{entry_faces, Candidate, CandidateProvider};
use crate::chain::{ChainRepository, PlacedTile, TileHandle};
use crate::config::GeneratorConfig;
use crate::exits::{CloseReason, ExitRecord, ExitRepository};
use crate::instantiate::{LayoutInstantiator, PlacementSequencer, RecordingInstantiator, StaggeredSequencer};
use crate::layout::{CellKind, ExitGeometryError, LayoutLibrary, TileLayout};
use crate::logging::TimingSpan;
use crate::orientation::{dir_to_world, Orientation, OrientationService};
use crate::placement::{compute_aabb, PlacementCalculator};
use crate::spatial::{Aabb, SpatialOverlapChecker};

use spawn_points::push_unique;

/// Setup problems that stop generation before any state changes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("no initial layout configured")]
    MissingInitialLayout,
    #[error("candidate pool is empty")]
    EmptyCandidatePool,
    #[error("prefab table has no entry for {0:?}")]
    IncompletePrefabs(Vec<CellKind>),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("layout `{0}` overlaps an existing tile")]
    Blocked(String),
}

/// Result of one append request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// A tile was committed through the exit that had `exit_label`
    Placed { tile_index: usize, exit_label: String },
    /// The exit left the Open set without a tile
    ExitClosed { exit_index: usize, reason: CloseReason },
    /// No Open exit at the selected position
    NoExit,
    /// Attempt budget spent but some placement still fits; nothing changed
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Uninitialized,
    Ready,
    /// Chain exists but no exit is Open
    Stalled,
}

/// Notifications accumulated until the host drains them
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorEvent {
    TilePlaced {
        tile_index: usize,
        layout: String,
        origin: Vec3,
        orientation: Orientation,
        handle: TileHandle,
    },
    ExitClosed {
        exit_index: usize,
        reason: CloseReason,
    },
    SpawnPointAdded(SpawnPoint),
}

/// A resolved Open exit: where it sits and which way it faces
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExitContext {
    pub exit_index: usize,
    pub tile_index: usize,
    pub exit_world: Vec3,
    pub outward: IVec2,
    pub prev_bounds: Aabb,
}

pub struct GridGenerator {
    config: GeneratorConfig,
    library: LayoutLibrary,
    orient: OrientationService,
    provider: CandidateProvider,
    placement: PlacementCalculator,
    chain: ChainRepository,
    exits: ExitRepository,
    overlap: SpatialOverlapChecker,
    core: CoreService,
    spawns: SpawnPointRegistry,
    instantiator: Box<dyn LayoutInstantiator>,
    sequencer: Box<dyn PlacementSequencer>,
    selected_exit: usize,
    base_seed: u64,
    epoch: u64,
    rng: Xoshiro256PlusPlus,
    next_handle: u32,
    cells_instantiated: usize,
    events: Vec<GeneratorEvent>,
}

impl GridGenerator {
    /// Generator with in-memory collaborators
    pub fn new(config: GeneratorConfig, library: LayoutLibrary) -> Self {
        let instantiator = RecordingInstantiator::new(config.prefabs.clone());
        Self::with_collaborators(
            config,
            library,
            Box::new(instantiator),
            Box::new(StaggeredSequencer::default()),
        )
    }

    pub fn with_collaborators(
        config: GeneratorConfig,
        library: LayoutLibrary,
        instantiator: Box<dyn LayoutInstantiator>,
        sequencer: Box<dyn PlacementSequencer>,
    ) -> Self {
        let base_seed = config.seed.unwrap_or_else(rand::random);
        Self {
            placement: PlacementCalculator::new(config.tile_gap, config.extra_tile_offset),
            overlap: SpatialOverlapChecker::new(config.partition_cell_size),
            config,
            library,
            orient: OrientationService,
            provider: CandidateProvider,
            chain: ChainRepository::new(),
            exits: ExitRepository::new(),
            core: CoreService::new(),
            spawns: SpawnPointRegistry::new(),
            instantiator,
            sequencer,
            selected_exit: 0,
            base_seed,
            epoch: 0,
            rng: session_rng(base_seed, 0),
            next_handle: 0,
            cells_instantiated: 0,
            events: Vec::new(),
        }
    }

    // ===== accessors =====

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn library(&self) -> &LayoutLibrary {
        &self.library
    }

    pub fn chain(&self) -> &ChainRepository {
        &self.chain
    }

    pub fn exits(&self) -> &ExitRepository {
        &self.exits
    }

    pub fn orientation_service(&self) -> &OrientationService {
        &self.orient
    }

    /// Incremented by every clear; in-flight tasks from older epochs finish as `NoExit`
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn selected_exit(&self) -> usize {
        self.selected_exit
    }

    pub fn cells_instantiated(&self) -> usize {
        self.cells_instantiated
    }

    pub fn state(&self) -> GeneratorState {
        if self.chain.is_empty() {
            GeneratorState::Uninitialized
        } else if self.exits.open_count() > 0 {
            GeneratorState::Ready
        } else {
            GeneratorState::Stalled
        }
    }

    pub fn drain_events(&mut self) -> Vec<GeneratorEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== bootstrap =====

    fn check_bootstrap(&self) -> Result<Arc<TileLayout>, GenerationError> {
        self.config
            .validate()
            .map_err(|e| GenerationError::InvalidConfig(e.to_string()))?;
        let initial = self
            .library
            .initial()
            .cloned()
            .ok_or(GenerationError::MissingInitialLayout)?;
        if self.library.candidates().is_empty() {
            return Err(GenerationError::EmptyCandidatePool);
        }
        let missing = self.config.prefabs.missing();
        if !missing.is_empty() {
            return Err(GenerationError::IncompletePrefabs(missing));
        }
        Ok(initial)
    }

    /// Place the initial template. Returns its chain index.
    pub fn generate_first(&mut self) -> Result<usize, GenerationError> {
        let _span = TimingSpan::new("generate_first");
        let initial = match self.check_bootstrap() {
            Ok(layout) => layout,
            Err(e) => {
                error!(error = %e, "generation aborted");
                return Err(e);
            }
        };

        if self.config.clear_on_generate {
            self.reset();
        }

        let origin = initial.origin();
        let orientation = Orientation::IDENTITY;
        let data = self.orient.oriented_data(&initial, orientation);
        let bounds = compute_aabb(origin, data.width, data.height, initial.cell_size());
        if self.overlap.overlaps_any(&bounds) {
            let e = GenerationError::Blocked(initial.name().to_string());
            error!(error = %e, "generation aborted");
            return Err(e);
        }

        let tile_index = self.commit_tile(Arc::clone(&initial), origin, orientation, bounds, None);

        let core_cell = initial
            .core()
            .or_else(|| self.config.core_at_entry_fallback.then(|| initial.entry()));
        if let Some(cell) = core_cell {
            let pos = self.chain.get(tile_index).cell_world(&self.orient, cell) + self.config.core_offset;
            self.core.spawn_core(pos);
        }

        self.exits.relabel();
        self.update_permanent_spawn_points_for_all_exits();
        info!(
            layout = initial.name(),
            open_exits = self.exits.open_count(),
            core = self.core.has_core(),
            "initial tile generated"
        );
        Ok(tile_index)
    }

    // ===== append =====

    /// Blocking append: drives an [`AppendTask`] to completion
    pub fn append_next_using_selected_exit(&mut self) -> AppendOutcome {
        let _span = TimingSpan::new("append");
        let mut task = self.begin_append();
        loop {
            if let TaskStep::Finished(outcome) = task.step(self) {
                return outcome;
            }
        }
    }

    /// Start a frame-yielding append through the selected exit
    pub fn begin_append(&self) -> AppendTask {
        AppendTask::new(self.epoch)
    }

    /// Attach exactly `layout` to the selected exit, trying every allowed orientation
    pub fn append_next_using_selected_exit_with_layout(&mut self, layout: &Arc<TileLayout>) -> AppendOutcome {
        let _span = TimingSpan::new("append_forced");
        let ctx = match self.resolve_selected() {
            Ok(ctx) => ctx,
            Err(outcome) => return outcome,
        };

        let fit = Orientation::enumerate(self.config.allow_rotations, self.config.allow_flip).find_map(|o| {
            let data = self.orient.oriented_data(layout, o);
            if !entry_faces(ctx.outward, &data) {
                return None;
            }
            self.try_fit(&ctx, layout, o).map(|(origin, bounds)| (o, origin, bounds))
        });

        match fit {
            Some((orientation, origin, bounds)) => {
                self.commit_append(&ctx, Arc::clone(layout), orientation, origin, bounds)
            }
            None => {
                debug!(layout = layout.name(), exit = ctx.exit_index, "forced layout does not fit");
                self.finish_exhausted(&ctx)
            }
        }
    }

    /// Editor placement at an explicit transform
    pub fn place_manual(
        &mut self,
        layout: Arc<TileLayout>,
        origin: Vec3,
        orientation: Orientation,
    ) -> Result<usize, GenerationError> {
        let data = self.orient.oriented_data(&layout, orientation);
        let bounds = compute_aabb(origin, data.width, data.height, layout.cell_size());
        if self.overlap.overlaps_any(&bounds) {
            warn!(layout = layout.name(), ?origin, "manual placement overlaps");
            return Err(GenerationError::Blocked(layout.name().to_string()));
        }
        let tile_index = self.commit_tile(layout, origin, orientation, bounds, None);
        self.exits.relabel();
        self.update_permanent_spawn_points_for_all_exits();
        self.clamp_selection();
        Ok(tile_index)
    }

    // ===== pipeline pieces (shared with AppendTask) =====

    pub(crate) fn exit_context(&self, exit_index: usize) -> Result<ExitContext, ExitGeometryError> {
        let rec = self.exits.get(exit_index);
        let tile = self.chain.get(rec.tile_index);
        let neighbor = tile.layout.single_path_neighbor(rec.cell)?;
        let outward = self.orient.apply_to_dir(rec.cell - neighbor, tile.orientation);
        Ok(ExitContext {
            exit_index,
            tile_index: rec.tile_index,
            exit_world: tile.cell_world(&self.orient, rec.cell),
            outward,
            prev_bounds: tile.bounds,
        })
    }

    /// Selected Open exit, or the outcome that ends the request
    pub(crate) fn resolve_selected(&mut self) -> Result<ExitContext, AppendOutcome> {
        let Some(global) = self.exits.global_index_from_available(self.selected_exit) else {
            debug!(selected = self.selected_exit, "no open exit at selection");
            return Err(AppendOutcome::NoExit);
        };
        match self.exit_context(global) {
            Ok(ctx) => Ok(ctx),
            Err(e) => {
                warn!(exit = global, error = %e, "exit has invalid geometry, closing");
                Err(self.close_exit(global, CloseReason::InvalidGeometry))
            }
        }
    }

    pub(crate) fn is_exit_open(&self, exit_index: usize) -> bool {
        exit_index < self.exits.len() && self.exits.get(exit_index).is_open()
    }

    pub(crate) fn connection_tries(&self) -> u32 {
        self.config.connection_tries
    }

    pub(crate) fn shuffled_candidates(&mut self, ctx: &ExitContext) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .provider
            .valid_candidates(
                self.library.candidates(),
                ctx.outward,
                self.config.allow_rotations,
                self.config.allow_flip,
                &self.orient,
            )
            .collect();
        candidates.shuffle(&mut self.rng);
        candidates
    }

    fn fit(&self, ctx: &ExitContext, layout: &TileLayout, orientation: Orientation) -> (Vec3, Aabb) {
        let data = self.orient.oriented_data(layout, orientation);
        let origin = self.placement.compute_new_origin(
            layout,
            orientation,
            data.entry,
            ctx.outward,
            &ctx.prev_bounds,
            ctx.exit_world,
        );
        (origin, compute_aabb(origin, data.width, data.height, layout.cell_size()))
    }

    /// Origin and footprint when the placement is free
    pub(crate) fn try_fit(
        &self,
        ctx: &ExitContext,
        layout: &TileLayout,
        orientation: Orientation,
    ) -> Option<(Vec3, Aabb)> {
        let (origin, bounds) = self.fit(ctx, layout, orientation);
        (!self.overlap.overlaps_any(&bounds)).then_some((origin, bounds))
    }

    /// Unshuffled scan of the whole pool
    fn has_any_valid_placement(&self, ctx: &ExitContext) -> bool {
        self.provider
            .valid_candidates(
                self.library.candidates(),
                ctx.outward,
                self.config.allow_rotations,
                self.config.allow_flip,
                &self.orient,
            )
            .any(|c| self.try_fit(ctx, &c.layout, c.orientation).is_some())
    }

    pub(crate) fn finish_exhausted(&mut self, ctx: &ExitContext) -> AppendOutcome {
        if self.has_any_valid_placement(ctx) {
            debug!(exit = ctx.exit_index, "attempt budget spent, placement still possible");
            return AppendOutcome::Retry;
        }
        info!(exit = ctx.exit_index, "no template fits exit, closing");
        self.close_exit(ctx.exit_index, CloseReason::NoCandidate)
    }

    fn close_exit(&mut self, exit_index: usize, reason: CloseReason) -> AppendOutcome {
        if self.exits.mark_closed(exit_index, reason) {
            self.events.push(GeneratorEvent::ExitClosed { exit_index, reason });
        }
        self.exits.relabel();
        self.selected_exit = 0;
        AppendOutcome::ExitClosed { exit_index, reason }
    }

    pub(crate) fn commit_append(
        &mut self,
        ctx: &ExitContext,
        layout: Arc<TileLayout>,
        orientation: Orientation,
        origin: Vec3,
        bounds: Aabb,
    ) -> AppendOutcome {
        let exit_label = self.exits.get(ctx.exit_index).label.clone();
        self.exits.mark_used(ctx.exit_index);
        let entry = layout.entry();
        let tile_index = self.commit_tile(layout, origin, orientation, bounds, Some(entry));
        self.exits.relabel();
        self.update_permanent_spawn_points_for_all_exits();
        self.clamp_selection();
        AppendOutcome::Placed { tile_index, exit_label }
    }

    /// `skip_exit` is the entry cell of an attached tile, which never becomes an exit
    fn commit_tile(
        &mut self,
        layout: Arc<TileLayout>,
        origin: Vec3,
        orientation: Orientation,
        bounds: Aabb,
        skip_exit: Option<IVec2>,
    ) -> usize {
        let tile_index = self.chain.len();
        let handle = TileHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        let cells = self.instantiator.instantiate_layout(&layout, origin, orientation, handle);
        self.cells_instantiated += cells;
        let delay = self.sequencer.next_tile_start_delay(tile_index);
        self.sequencer.play_for_group(handle, delay);

        let placed = PlacedTile {
            layout: Arc::clone(&layout),
            world_origin: origin,
            orientation,
            bounds,
            handle,
        };
        self.overlap.add(&placed, tile_index);
        self.chain.add(placed);

        for &cell in layout.exits() {
            if Some(cell) != skip_exit {
                self.exits.add(ExitRecord::open(tile_index, cell));
            }
        }

        info!(
            tile = tile_index,
            layout = layout.name(),
            rotation = orientation.degrees(),
            flipped = orientation.flipped,
            cells,
            "tile placed"
        );
        self.events.push(GeneratorEvent::TilePlaced {
            tile_index,
            layout: layout.name().to_string(),
            origin,
            orientation,
            handle,
        });
        tile_index
    }

    fn clamp_selection(&mut self) {
        if self.selected_exit >= self.exits.open_count() {
            self.selected_exit = 0;
        }
    }

    // ===== reconciliation =====

    /// Close every Open exit whose next cell is covered by another tile and
    /// keep it as a permanent spawn point.
    pub fn update_permanent_spawn_points_for_all_exits(&mut self) {
        let open: Vec<usize> = self.exits.indices_available().collect();
        let mut closed = 0;
        for exit_index in open {
            // invalid geometry is handled when the exit is selected
            let Ok(ctx) = self.exit_context(exit_index) else {
                continue;
            };
            let cs = self.chain.get(ctx.tile_index).layout.cell_size();
            let outward = dir_to_world(ctx.outward);
            let next = ctx.exit_world + outward * cs;
            if self.overlap.point_hits(next, Some(ctx.tile_index)).is_empty() {
                continue;
            }

            let point = SpawnPoint {
                position: ctx.exit_world,
                facing: -outward,
            };
            if self.spawns.add(point) {
                self.events.push(GeneratorEvent::SpawnPointAdded(point));
            }
            if self.exits.mark_closed(exit_index, CloseReason::PermanentSpawn) {
                self.events.push(GeneratorEvent::ExitClosed {
                    exit_index,
                    reason: CloseReason::PermanentSpawn,
                });
                closed += 1;
            }
        }
        self.exits.relabel();
        if closed > 0 {
            debug!(closed, spawns = self.spawns.permanent().len(), "blocked exits became spawn points");
            self.clamp_selection();
        }
    }

    // ===== previews =====

    /// Every candidate for the selected exit with its would-be footprint
    pub fn placement_previews(&self) -> Vec<PlacementPreview> {
        let Some(global) = self.exits.global_index_from_available(self.selected_exit) else {
            return Vec::new();
        };
        let Ok(ctx) = self.exit_context(global) else {
            return Vec::new();
        };
        self.provider
            .valid_candidates(
                self.library.candidates(),
                ctx.outward,
                self.config.allow_rotations,
                self.config.allow_flip,
                &self.orient,
            )
            .map(|c| {
                let (origin, bounds) = self.fit(&ctx, &c.layout, c.orientation);
                let (sx, sz) = bounds.size_xz();
                let status = if self.overlap.overlaps_any(&bounds) {
                    PreviewStatus::Overlap
                } else {
                    PreviewStatus::Valid
                };
                PlacementPreview {
                    layout: c.layout.name().to_string(),
                    orientation: c.orientation,
                    origin,
                    size: Vec2::new(sx, sz),
                    cell_size: c.layout.cell_size(),
                    status,
                    note: preview_note(c.layout.name(), c.orientation),
                }
            })
            .collect()
    }

    // ===== exit selection & queries =====

    pub fn available_exits(&self) -> Vec<(String, Vec3)> {
        self.exits.available_world(&self.orient, |i| self.chain.get(i))
    }

    pub fn available_exit_labels(&self) -> Vec<String> {
        self.exits.available_labels()
    }

    /// Position within the Open set; out-of-range selections append nothing
    pub fn set_exit_index(&mut self, index: usize) {
        self.selected_exit = index;
    }

    pub fn set_exit_by_label(&mut self, label: &str) -> bool {
        match self.exits.available_index_by_label(label) {
            Some(index) => {
                self.selected_exit = index;
                true
            }
            None => false,
        }
    }

    /// World position and outward ground-plane direction of the selected exit
    pub fn selected_exit_world(&self) -> Option<(Vec3, IVec2)> {
        let global = self.exits.global_index_from_available(self.selected_exit)?;
        let ctx = self.exit_context(global).ok()?;
        Some((ctx.exit_world, ctx.outward))
    }

    pub fn current_layout(&self) -> Option<&Arc<TileLayout>> {
        self.chain
            .last()
            .map(|t| &t.layout)
            .or_else(|| self.library.initial())
    }

    pub fn current_world_origin(&self) -> Vec3 {
        self.chain.last().map_or(Vec3::ZERO, |t| t.world_origin)
    }

    pub fn current_orientation(&self) -> Orientation {
        self.chain.last().map_or(Orientation::IDENTITY, |t| t.orientation)
    }

    /// Up to `count` distinct pool templates in session-random order
    pub fn random_candidate_set(&mut self, count: usize) -> Vec<Arc<TileLayout>> {
        let mut pool: Vec<Arc<TileLayout>> = self.library.candidates().to_vec();
        pool.shuffle(&mut self.rng);
        pool.truncate(count);
        pool
    }

    // ===== spawn points & core =====

    pub fn permanent_spawn_points(&self) -> &[SpawnPoint] {
        self.spawns.permanent()
    }

    /// Permanent spawns, then Open exits; the last tile's layout exits when both are empty
    pub fn spawn_points(&self) -> Vec<Vec3> {
        let mut points = Vec::new();
        for sp in self.spawns.permanent() {
            push_unique(&mut points, sp.position);
        }
        for (_, world) in self.available_exits() {
            push_unique(&mut points, world);
        }
        if points.is_empty() {
            if let Some(last) = self.chain.last() {
                for &cell in last.layout.exits() {
                    push_unique(&mut points, last.cell_world(&self.orient, cell));
                }
            }
        }
        points
    }

    /// Cycles through `spawn_points`, lifted to core height plus the spawn offset
    pub fn next_spawn_round_robin(&mut self) -> Option<Vec3> {
        let points = self.spawn_points();
        let idx = self.spawns.next_index(points.len())?;
        let mut p = points[idx];
        p.y = match self.core.position() {
            Some(core) => core.y + self.config.spawn_height_offset,
            None => p.y + self.config.spawn_height_offset,
        };
        Some(p)
    }

    pub fn has_core(&self) -> bool {
        self.core.has_core()
    }

    pub fn core_position(&self) -> Option<Vec3> {
        self.core.position()
    }

    // ===== cleanup =====

    fn start_new_epoch(&mut self) {
        self.epoch += 1;
        self.rng = session_rng(self.base_seed, self.epoch);
    }

    /// Clear chain, exits, overlap index and core; spawn points and visuals stay
    pub fn cleanup_caches(&mut self) {
        self.chain.clear();
        self.exits.clear();
        self.overlap.clear();
        self.core.clear_core();
        self.selected_exit = 0;
        self.start_new_epoch();
        debug!(epoch = self.epoch, "caches cleared");
    }

    /// Full clear, including spawn points and instantiated geometry
    pub fn reset(&mut self) {
        self.cleanup_caches();
        self.spawns.clear();
        self.instantiator.clear();
        self.cells_instantiated = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exits::ExitStatus;
    use crate::instantiate::PrefabTable;

    fn straight() -> TileLayout {
        TileLayout::from_ascii("straight", &["###"], IVec2::ZERO, &[IVec2::new(2, 0)]).unwrap()
    }

    fn corridor_config() -> GeneratorConfig {
        GeneratorConfig {
            allow_rotations: false,
            allow_flip: false,
            seed: Some(1),
            ..Default::default()
        }
    }

    fn corridor() -> GridGenerator {
        GridGenerator::new(corridor_config(), LayoutLibrary::new(Some(straight()), vec![straight()]))
    }

    #[test]
    fn test_uninitialized_until_generated() {
        let mut gen = corridor();
        assert_eq!(gen.state(), GeneratorState::Uninitialized);
        assert_eq!(gen.append_next_using_selected_exit(), AppendOutcome::NoExit);
        gen.generate_first().unwrap();
        assert_eq!(gen.state(), GeneratorState::Ready);
        assert_eq!(gen.available_exit_labels(), vec!["A"]);
    }

    #[test]
    fn test_missing_initial_aborts_without_state() {
        let mut gen = GridGenerator::new(corridor_config(), LayoutLibrary::new(None, vec![straight()]));
        assert_eq!(gen.generate_first(), Err(GenerationError::MissingInitialLayout));
        assert!(gen.chain().is_empty());
        assert_eq!(gen.epoch(), 0);
    }

    #[test]
    fn test_empty_pool_aborts() {
        let mut gen = GridGenerator::new(corridor_config(), LayoutLibrary::new(Some(straight()), vec![]));
        assert_eq!(gen.generate_first(), Err(GenerationError::EmptyCandidatePool));
    }

    #[test]
    fn test_incomplete_prefabs_abort() {
        let config = GeneratorConfig {
            prefabs: PrefabTable {
                grass: None,
                ..Default::default()
            },
            ..corridor_config()
        };
        let mut gen = GridGenerator::new(config, LayoutLibrary::new(Some(straight()), vec![straight()]));
        assert_eq!(
            gen.generate_first(),
            Err(GenerationError::IncompletePrefabs(vec![CellKind::Grass]))
        );
        assert_eq!(gen.state(), GeneratorState::Uninitialized);
    }

    #[test]
    fn test_append_marks_exit_used() {
        let mut gen = corridor();
        gen.generate_first().unwrap();
        let outcome = gen.append_next_using_selected_exit();
        assert_eq!(
            outcome,
            AppendOutcome::Placed {
                tile_index: 1,
                exit_label: "A".into()
            }
        );
        assert_eq!(gen.exits().get(0).status, ExitStatus::Used);
        assert_eq!(gen.chain().get(1).world_origin, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(gen.current_world_origin(), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(gen.cells_instantiated(), 6);
    }

    #[test]
    fn test_core_fallback_to_entry() {
        let config = GeneratorConfig {
            core_at_entry_fallback: true,
            core_offset: Vec3::new(0.0, 1.0, 0.0),
            ..corridor_config()
        };
        let mut gen = GridGenerator::new(config, LayoutLibrary::new(Some(straight()), vec![straight()]));
        gen.generate_first().unwrap();
        assert_eq!(gen.core_position(), Some(Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_no_core_without_fallback() {
        let mut gen = corridor();
        gen.generate_first().unwrap();
        assert!(!gen.has_core());
    }

    #[test]
    fn test_preview_lists_candidates() {
        let mut gen = corridor();
        gen.generate_first().unwrap();
        let previews = gen.placement_previews();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].status, PreviewStatus::Valid);
        assert_eq!(previews[0].note, "straight | 0° | flip=0");
        assert_eq!(previews[0].size, Vec2::new(3.0, 1.0));
        // previews never commit
        assert_eq!(gen.chain().len(), 1);
    }

    #[test]
    fn test_selected_exit_world() {
        let mut gen = corridor();
        assert_eq!(gen.selected_exit_world(), None);
        gen.generate_first().unwrap();
        assert_eq!(gen.selected_exit_world(), Some((Vec3::new(2.0, 0.0, 0.0), IVec2::X)));
    }

    #[test]
    fn test_reset_bumps_epoch_and_clears() {
        let mut gen = corridor();
        gen.generate_first().unwrap();
        let epoch = gen.epoch();
        gen.reset();
        assert_eq!(gen.epoch(), epoch + 1);
        assert_eq!(gen.state(), GeneratorState::Uninitialized);
        assert!(gen.spawn_points().is_empty());
        assert_eq!(gen.cells_instantiated(), 0);
    }

    #[test]
    fn test_events_are_drained() {
        let mut gen = corridor();
        gen.generate_first().unwrap();
        let events = gen.drain_events();
        assert!(matches!(events[0], GeneratorEvent::TilePlaced { tile_index: 0, .. }));
        assert!(gen.drain_events().is_empty());
    }

    #[test]
    fn test_random_candidate_set_is_bounded() {
        let mut gen = GridGenerator::new(corridor_config(), LayoutLibrary::builtin());
        let pool = gen.library().candidates().len();
        assert_eq!(gen.random_candidate_set(2).len(), 2);
        assert_eq!(gen.random_candidate_set(100).len(), pool);
    }
}
