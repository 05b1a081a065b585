//! Placement previews for the selected exit.

use bevy::math::{Vec2, Vec3};

use crate::orientation::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    Valid,
    Overlap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPreview {
    pub layout: String,
    pub orientation: Orientation,
    pub origin: Vec3,
    /// Footprint extent on X/Z
    pub size: Vec2,
    pub cell_size: f32,
    pub status: PreviewStatus,
    pub note: String,
}

/// `"{name} | {deg}° | flip={0|1}"`
pub fn preview_note(name: &str, orientation: Orientation) -> String {
    format!(
        "{} | {}° | flip={}",
        name,
        orientation.degrees(),
        u8::from(orientation.flipped)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_note_format() {
        assert_eq!(preview_note("corner", Orientation::new(3, true)), "corner | 270° | flip=1");
        assert_eq!(preview_note("hub", Orientation::IDENTITY), "hub | 0° | flip=0");
    }
}
