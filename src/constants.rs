//! Centralized constants for the tile-chain generator.
//!
//! Geometry tolerances and generator defaults shared by the placement pipeline,
//! the overlap checker and the reconciliation pass. Per-module constants stay in
//! their modules.

use bevy::math::IVec2;

// =====================================================
// Geometry tolerances
// =====================================================

/// Tolerance applied to AABB overlap tests so edge-adjacent tiles never collide
pub const OVERLAP_EPSILON: f32 = 1e-4;

/// Tolerance used when testing whether a point falls inside a tile's footprint
pub const POINT_EPSILON: f32 = 1e-4;

/// Two spawn points closer than this are the same point
pub const SPAWN_DEDUP_DISTANCE: f32 = 0.05;

// =====================================================
// Generator defaults
// =====================================================

/// Overlapping placement attempts allowed per append before giving up on an exit
pub const DEFAULT_CONNECTION_TRIES: u32 = 24;

/// Edge length (world units) of one spatial partition bucket
pub const DEFAULT_PARTITION_CELL_SIZE: f32 = 8.0;

/// Height added to spawn points handed out round-robin
pub const DEFAULT_SPAWN_HEIGHT_OFFSET: f32 = 0.05;

/// Session seed used when the configuration does not pin one and a caller asks
/// for a reproducible default
pub const DEFAULT_SESSION_SEED: u64 = 42;

// =====================================================
// Orientation
// =====================================================

/// Number of 90° rotation steps
pub const ROTATION_STEPS: u8 = 4;

/// Orthogonal neighbour offsets in layout space (+X, -X, +Y, -Y)
pub const ORTHO_DIRS: [IVec2; 4] = [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y];
