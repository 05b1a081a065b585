//! Orientation service: rotation steps and mirror flip for layout grids.
//!
//! The flip mirrors the x axis (`x → w-1-x`) and is applied first; the rotation
//! then turns the grid counter-clockwise by `steps × 90°` in the (x, y) plane,
//! where layout y maps to world +Z. Odd rotation steps swap width and height.
//!
//! Oriented cell `(ox, oy)` sits at world offset `(ox·cs, 0, oy·cs)` from the
//! placed tile's origin, so the origin is the world centre of oriented cell
//! `(0, 0)`.

use bevy::math::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::ROTATION_STEPS;
use crate::layout::TileLayout;

/// Rotation steps (multiples of 90°) plus optional mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub rotation_steps: u8,
    pub flipped: bool,
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation {
        rotation_steps: 0,
        flipped: false,
    };

    pub fn new(rotation_steps: u8, flipped: bool) -> Self {
        Self {
            rotation_steps: rotation_steps % ROTATION_STEPS,
            flipped,
        }
    }

    pub fn degrees(&self) -> u32 {
        u32::from(self.rotation_steps) * 90
    }

    /// Orientations allowed by the generator switches, rotation-major
    pub fn enumerate(allow_rotations: bool, allow_flip: bool) -> impl Iterator<Item = Orientation> {
        let rotations = if allow_rotations { ROTATION_STEPS } else { 1 };
        let flips: &'static [bool] = if allow_flip { &[false, true] } else { &[false] };
        (0..rotations).flat_map(move |r| flips.iter().map(move |&f| Orientation::new(r, f)))
    }
}

/// Oriented extents and entry of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedData {
    pub width: i32,
    pub height: i32,
    pub entry: IVec2,
}

/// Clamp to one of the four orthogonal unit vectors.
///
/// The strictly larger axis wins; ties and pure-y vectors resolve to the y
/// axis; a zero component sign counts as positive and the zero vector is +Y.
pub fn clamp_to_ortho(v: IVec2) -> IVec2 {
    if v.x.abs() > v.y.abs() {
        return IVec2::new(if v.x >= 0 { 1 } else { -1 }, 0);
    }
    if v.y.abs() > 0 {
        return IVec2::new(0, if v.y >= 0 { 1 } else { -1 });
    }
    IVec2::Y
}

/// Counter-clockwise quarter turn
fn rotate_ccw(v: IVec2) -> IVec2 {
    IVec2::new(-v.y, v.x)
}

fn rotate_cw(v: IVec2) -> IVec2 {
    IVec2::new(v.y, -v.x)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationService;

impl OrientationService {
    pub fn oriented_size(&self, layout: &TileLayout, orientation: Orientation) -> (i32, i32) {
        if orientation.rotation_steps % 2 == 1 {
            (layout.height(), layout.width())
        } else {
            (layout.width(), layout.height())
        }
    }

    /// Map a layout cell into the oriented grid
    pub fn orient_cell(&self, cell: IVec2, layout: &TileLayout, orientation: Orientation) -> IVec2 {
        let (w, h) = (layout.width(), layout.height());
        let mut c = cell;
        if orientation.flipped {
            c.x = w - 1 - c.x;
        }
        match orientation.rotation_steps % ROTATION_STEPS {
            0 => c,
            1 => IVec2::new(h - 1 - c.y, c.x),
            2 => IVec2::new(w - 1 - c.x, h - 1 - c.y),
            _ => IVec2::new(c.y, w - 1 - c.x),
        }
    }

    pub fn cell_to_world_local(
        &self,
        cell: IVec2,
        layout: &TileLayout,
        orientation: Orientation,
    ) -> Vec3 {
        let o = self.orient_cell(cell, layout, orientation);
        let cs = layout.cell_size();
        Vec3::new(o.x as f32 * cs, 0.0, o.y as f32 * cs)
    }

    /// Layout-space direction → oriented (world ground-plane) direction
    pub fn apply_to_dir(&self, dir: IVec2, orientation: Orientation) -> IVec2 {
        let mut d = clamp_to_ortho(dir);
        if orientation.flipped {
            d.x = -d.x;
        }
        for _ in 0..orientation.rotation_steps % ROTATION_STEPS {
            d = rotate_ccw(d);
        }
        d
    }

    pub fn apply_inverse_to_dir(&self, dir: IVec2, orientation: Orientation) -> IVec2 {
        let mut d = clamp_to_ortho(dir);
        for _ in 0..orientation.rotation_steps % ROTATION_STEPS {
            d = rotate_cw(d);
        }
        if orientation.flipped {
            d.x = -d.x;
        }
        d
    }

    pub fn oriented_data(&self, layout: &TileLayout, orientation: Orientation) -> OrientedData {
        let (width, height) = self.oriented_size(layout, orientation);
        OrientedData {
            width,
            height,
            entry: self.orient_cell(layout.entry(), layout, orientation),
        }
    }
}

/// World ground-plane vector for an orthogonal grid direction
pub fn dir_to_world(dir: IVec2) -> Vec3 {
    Vec3::new(dir.x as f32, 0.0, dir.y as f32)
}
