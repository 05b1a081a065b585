//! Chain repository: append-only list of placed tiles.

use std::sync::Arc;

use bevy::math::{IVec2, Vec3};

use crate::layout::TileLayout;
use crate::orientation::{Orientation, OrientationService};
use crate::spatial::Aabb;

/// Opaque handle to the external owner of a tile's visuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileHandle(pub u32);

/// One committed template instance
#[derive(Debug, Clone)]
pub struct PlacedTile {
    pub layout: Arc<TileLayout>,
    pub world_origin: Vec3,
    pub orientation: Orientation,
    /// Computed once at commit
    pub bounds: Aabb,
    pub handle: TileHandle,
}

impl PlacedTile {
    /// World centre of one of this tile's layout cells
    pub fn cell_world(&self, orient: &OrientationService, cell: IVec2) -> Vec3 {
        self.world_origin + orient.cell_to_world_local(cell, &self.layout, self.orientation)
    }
}

#[derive(Debug, Default)]
pub struct ChainRepository {
    tiles: Vec<PlacedTile>,
}

impl ChainRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new tile's chain index
    pub fn add(&mut self, tile: PlacedTile) -> usize {
        self.tiles.push(tile);
        self.tiles.len() - 1
    }

    /// Panics when `index` is out of range
    pub fn get(&self, index: usize) -> &PlacedTile {
        &self.tiles[index]
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn last(&self) -> Option<&PlacedTile> {
        self.tiles.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedTile> {
        self.tiles.iter()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }
}
