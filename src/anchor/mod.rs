//! Core placement service (single core anchor per session).
//!
//! Only the position is tracked here; whatever represents the core visually is
//! owned by the caller.

use bevy::math::Vec3;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct CoreService {
    position: Option<Vec3>,
}

impl CoreService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawning again without clearing replaces the tracked position
    pub fn spawn_core(&mut self, position: Vec3) {
        if let Some(previous) = self.position.replace(position) {
            debug!(?previous, ?position, "core replaced");
        } else {
            debug!(?position, "core spawned");
        }
    }

    pub fn clear_core(&mut self) {
        self.position = None;
    }

    pub fn has_core(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.position
    }
}
