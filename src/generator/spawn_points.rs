//! Permanent spawn points and the round-robin cursor.

use bevy::math::Vec3;

use crate::constants::SPAWN_DEDUP_DISTANCE;

/// A blocked exit turned into an enemy entrance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec3,
    /// Unit vector pointing back into the network
    pub facing: Vec3,
}

pub(crate) fn push_unique(points: &mut Vec<Vec3>, p: Vec3) {
    if !points.iter().any(|q| q.distance(p) < SPAWN_DEDUP_DISTANCE) {
        points.push(p);
    }
}

#[derive(Debug, Default)]
pub struct SpawnPointRegistry {
    permanent: Vec<SpawnPoint>,
    rr_index: usize,
}

impl SpawnPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when a point already sits within dedup distance
    pub fn add(&mut self, point: SpawnPoint) -> bool {
        if self
            .permanent
            .iter()
            .any(|p| p.position.distance(point.position) < SPAWN_DEDUP_DISTANCE)
        {
            return false;
        }
        self.permanent.push(point);
        true
    }

    pub fn permanent(&self) -> &[SpawnPoint] {
        &self.permanent
    }

    /// Advance the cursor over a list of `len` points
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let idx = self.rr_index % len;
        self.rr_index = (idx + 1) % len;
        Some(idx)
    }

    pub fn clear(&mut self) {
        self.permanent.clear();
        self.rr_index = 0;
    }
}
