//! Placement calculator: where a candidate lands and what it covers.
//!
//! The candidate's oriented entry cell centre lands one cell step outside the
//! previous tile's exit cell centre, so the two footprints touch without
//! overlapping. `compute_aabb` is the only footprint function in the crate:
//! committed tiles, candidates and previews all go through it.

use bevy::math::{IVec2, Vec3};
use tracing::debug;

use crate::constants::POINT_EPSILON;
use crate::layout::TileLayout;
use crate::orientation::{dir_to_world, Orientation};
use crate::spatial::Aabb;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementCalculator {
    /// Extra distance along the outward direction between tiles
    pub tile_gap: f32,
    /// Constant offset added to every appended tile
    pub extra_offset: Vec3,
}

impl PlacementCalculator {
    pub fn new(tile_gap: f32, extra_offset: Vec3) -> Self {
        Self {
            tile_gap,
            extra_offset,
        }
    }

    /// World position where the candidate's entry cell centre must land
    pub fn entry_target(&self, cell_size: f32, outward: IVec2, prev_exit_world: Vec3) -> Vec3 {
        prev_exit_world + dir_to_world(outward) * (cell_size + self.tile_gap) + self.extra_offset
    }

    pub fn compute_new_origin(
        &self,
        candidate: &TileLayout,
        orientation: Orientation,
        oriented_entry: IVec2,
        outward: IVec2,
        prev_bounds: &Aabb,
        prev_exit_world: Vec3,
    ) -> Vec3 {
        let cs = candidate.cell_size();
        let target = self.entry_target(cs, outward, prev_exit_world);
        if prev_bounds.contains_xz(target, -POINT_EPSILON) {
            // exit cell was not on the previous tile's border; the overlap test rejects it
            debug!(
                layout = candidate.name(),
                rotation = orientation.degrees(),
                "entry target lies inside the previous tile"
            );
        }
        let entry_offset = Vec3::new(oriented_entry.x as f32 * cs, 0.0, oriented_entry.y as f32 * cs);
        target - entry_offset
    }

    pub fn compute_aabb(&self, origin: Vec3, oriented_width: i32, oriented_height: i32, cell_size: f32) -> Aabb {
        compute_aabb(origin, oriented_width, oriented_height, cell_size)
    }
}

/// Footprint of an oriented grid whose cell (0, 0) is centred on `origin`
pub fn compute_aabb(origin: Vec3, oriented_width: i32, oriented_height: i32, cell_size: f32) -> Aabb {
    let half = cell_size * 0.5;
    let min = Vec3::new(origin.x - half, origin.y, origin.z - half);
    let max = Vec3::new(
        origin.x + oriented_width as f32 * cell_size - half,
        origin.y,
        origin.z + oriented_height as f32 * cell_size - half,
    );
    Aabb::new(min, max)
}
