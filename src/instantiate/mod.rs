//! External collaborator seams: instantiation, prefab selection, reveal sequencing.
//!
//! The generator never looks inside these; it only hands over committed
//! placements and reads back a cell count for diagnostics.

use std::collections::HashMap;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::chain::TileHandle;
use crate::layout::{CellKind, PathEffect, TileLayout};
use crate::orientation::{Orientation, OrientationService};

/// Picks the visual representation for a cell kind
pub trait PrefabSelector {
    fn prefab_for(&self, kind: CellKind) -> Option<&str>;
}

/// One prefab id per cell kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabTable {
    pub grass: Option<String>,
    pub path_basic: Option<String>,
    pub path_damage: Option<String>,
    pub path_slow: Option<String>,
    pub path_stun: Option<String>,
}

impl Default for PrefabTable {
    fn default() -> Self {
        Self {
            grass: Some("grass".into()),
            path_basic: Some("path_basic".into()),
            path_damage: Some("path_damage".into()),
            path_slow: Some("path_slow".into()),
            path_stun: Some("path_stun".into()),
        }
    }
}

impl PrefabTable {
    /// Cell kinds without a usable prefab
    pub fn missing(&self) -> Vec<CellKind> {
        CellKind::ALL
            .into_iter()
            .filter(|k| self.prefab_for(*k).is_none())
            .collect()
    }
}

impl PrefabSelector for PrefabTable {
    fn prefab_for(&self, kind: CellKind) -> Option<&str> {
        let slot = match kind {
            CellKind::Grass => &self.grass,
            CellKind::Path(PathEffect::Basic) => &self.path_basic,
            CellKind::Path(PathEffect::Damage) => &self.path_damage,
            CellKind::Path(PathEffect::Slow) => &self.path_slow,
            CellKind::Path(PathEffect::Stun) => &self.path_stun,
        };
        slot.as_deref().filter(|s| !s.is_empty())
    }
}

/// Turns a committed placement into geometry owned by the caller
pub trait LayoutInstantiator: Send + Sync {
    /// Returns the number of cells instantiated
    fn instantiate_layout(
        &mut self,
        layout: &TileLayout,
        origin: Vec3,
        orientation: Orientation,
        parent: TileHandle,
    ) -> usize;

    /// Drop (or recycle) everything instantiated so far
    fn clear(&mut self) {}
}

/// Per-tile reveal animation trigger, fire-and-forget
pub trait PlacementSequencer: Send + Sync {
    fn next_tile_start_delay(&self, tile_index: usize) -> f32;
    fn play_for_group(&mut self, handle: TileHandle, start_delay: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellInstance {
    pub parent: TileHandle,
    pub kind: CellKind,
    pub prefab: String,
    pub position: Vec3,
}

/// In-memory instantiator: records every cell with its world position and
/// recycles prefab instances across `clear` calls.
#[derive(Debug, Default)]
pub struct RecordingInstantiator {
    prefabs: PrefabTable,
    orient: OrientationService,
    instances: Vec<CellInstance>,
    pool: HashMap<String, usize>,
    reused: usize,
}

impl RecordingInstantiator {
    pub fn new(prefabs: PrefabTable) -> Self {
        Self {
            prefabs,
            ..Default::default()
        }
    }

    pub fn instances(&self) -> &[CellInstance] {
        &self.instances
    }

    /// Instances served from the pool instead of freshly allocated
    pub fn reused(&self) -> usize {
        self.reused
    }

    pub fn pooled(&self, prefab: &str) -> usize {
        self.pool.get(prefab).copied().unwrap_or(0)
    }
}

impl LayoutInstantiator for RecordingInstantiator {
    fn instantiate_layout(
        &mut self,
        layout: &TileLayout,
        origin: Vec3,
        orientation: Orientation,
        parent: TileHandle,
    ) -> usize {
        let mut count = 0;
        for (cell, kind) in layout.cells() {
            let Some(prefab) = self.prefabs.prefab_for(kind) else {
                continue;
            };
            if let Some(free) = self.pool.get_mut(prefab).filter(|n| **n > 0) {
                *free -= 1;
                self.reused += 1;
            }
            self.instances.push(CellInstance {
                parent,
                kind,
                prefab: prefab.to_string(),
                position: origin + self.orient.cell_to_world_local(cell, layout, orientation),
            });
            count += 1;
        }
        count
    }

    fn clear(&mut self) {
        for inst in self.instances.drain(..) {
            *self.pool.entry(inst.prefab).or_default() += 1;
        }
    }
}

/// Staggers reveal start per tile and records what it was asked to play
#[derive(Debug, Default, Clone)]
pub struct StaggeredSequencer {
    pub per_tile_start_delay: f32,
    played: Vec<(TileHandle, f32)>,
}

impl StaggeredSequencer {
    pub fn new(per_tile_start_delay: f32) -> Self {
        Self {
            per_tile_start_delay,
            played: Vec::new(),
        }
    }

    pub fn played(&self) -> &[(TileHandle, f32)] {
        &self.played
    }
}

impl PlacementSequencer for StaggeredSequencer {
    fn next_tile_start_delay(&self, tile_index: usize) -> f32 {
        self.per_tile_start_delay * tile_index as f32
    }

    fn play_for_group(&mut self, handle: TileHandle, start_delay: f32) {
        self.played.push((handle, start_delay));
    }
}
