//! Spatial overlap checker: placed tile footprints on the ground plane.
//!
//! Footprints are bucketed into a uniform grid so queries only test nearby
//! tiles. The partition only narrows the candidate set; the boolean answer is
//! always the exact epsilon-tolerant AABB test.

use std::collections::HashMap;

use bevy::math::{IVec2, Vec3};

use crate::chain::PlacedTile;
use crate::constants::{OVERLAP_EPSILON, POINT_EPSILON};

/// Axis-aligned bounding box; only X and Z take part in tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// True only when the boxes share more than `eps` on both X and Z;
    /// touching edges do not overlap.
    pub fn overlaps(&self, other: &Aabb, eps: f32) -> bool {
        self.min.x < other.max.x - eps
            && self.max.x > other.min.x + eps
            && self.min.z < other.max.z - eps
            && self.max.z > other.min.z + eps
    }

    pub fn contains_xz(&self, p: Vec3, eps: f32) -> bool {
        p.x >= self.min.x - eps
            && p.x <= self.max.x + eps
            && p.z >= self.min.z - eps
            && p.z <= self.max.z + eps
    }

    pub fn size_xz(&self) -> (f32, f32) {
        (self.max.x - self.min.x, self.max.z - self.min.z)
    }
}

#[derive(Debug)]
pub struct SpatialOverlapChecker {
    bucket_size: f32,
    buckets: HashMap<IVec2, Vec<usize>>,
    boxes: Vec<(usize, Aabb)>,
}

impl SpatialOverlapChecker {
    pub fn new(bucket_size: f32) -> Self {
        Self {
            bucket_size: bucket_size.max(f32::EPSILON),
            buckets: HashMap::new(),
            boxes: Vec::new(),
        }
    }

    fn bucket_of(&self, x: f32, z: f32) -> IVec2 {
        IVec2::new(
            (x / self.bucket_size).floor() as i32,
            (z / self.bucket_size).floor() as i32,
        )
    }

    fn bucket_range(&self, min: Vec3, max: Vec3) -> impl Iterator<Item = IVec2> {
        let lo = self.bucket_of(min.x, min.z);
        let hi = self.bucket_of(max.x, max.z);
        (lo.x..=hi.x).flat_map(move |x| (lo.y..=hi.y).map(move |z| IVec2::new(x, z)))
    }

    pub fn add(&mut self, tile: &PlacedTile, chain_index: usize) {
        self.insert(tile.bounds, chain_index);
    }

    pub fn insert(&mut self, bounds: Aabb, chain_index: usize) {
        let slot = self.boxes.len();
        self.boxes.push((chain_index, bounds));
        let keys: Vec<IVec2> = self.bucket_range(bounds.min, bounds.max).collect();
        for key in keys {
            self.buckets.entry(key).or_default().push(slot);
        }
    }

    /// Slots whose buckets intersect the given (padded) range, deduplicated
    fn nearby(&self, min: Vec3, max: Vec3) -> Vec<usize> {
        let pad = Vec3::new(POINT_EPSILON, 0.0, POINT_EPSILON);
        let mut slots: Vec<usize> = self
            .bucket_range(min - pad, max + pad)
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .copied()
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    pub fn overlaps_any(&self, candidate: &Aabb) -> bool {
        self.nearby(candidate.min, candidate.max)
            .into_iter()
            .any(|slot| self.boxes[slot].1.overlaps(candidate, OVERLAP_EPSILON))
    }

    /// Chain indices (other than `exclude`) whose footprint contains `point`
    pub fn point_hits(&self, point: Vec3, exclude: Option<usize>) -> Vec<usize> {
        let mut hits: Vec<usize> = self
            .nearby(point, point)
            .into_iter()
            .map(|slot| self.boxes[slot])
            .filter(|(index, bounds)| Some(*index) != exclude && bounds.contains_xz(point, POINT_EPSILON))
            .map(|(index, _)| index)
            .collect();
        hits.sort_unstable();
        hits
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.boxes.clear();
    }
}
