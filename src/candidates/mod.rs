//! Candidate provider: which (template, orientation) pairs can attach to an exit.

use std::sync::Arc;

use bevy::math::IVec2;

use crate::layout::TileLayout;
use crate::orientation::{OrientedData, Orientation, OrientationService};

/// A template under one orientation
#[derive(Debug, Clone)]
pub struct Candidate {
    pub layout: Arc<TileLayout>,
    pub orientation: Orientation,
}

/// Does the oriented entry sit on the edge facing back toward the exit?
///
/// A tile attached through an exit pointing `outward` is entered from the side
/// opposite `outward`.
pub fn entry_faces(outward: IVec2, oriented: &OrientedData) -> bool {
    match (outward.x, outward.y) {
        (1, 0) => oriented.entry.x == 0,
        (-1, 0) => oriented.entry.x == oriented.width - 1,
        (0, 1) => oriented.entry.y == 0,
        (0, -1) => oriented.entry.y == oriented.height - 1,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateProvider;

impl CandidateProvider {
    /// Lazily yields every valid pairing, template-major then rotation then flip
    pub fn valid_candidates<'a>(
        &self,
        pool: &'a [Arc<TileLayout>],
        required_outward: IVec2,
        allow_rotations: bool,
        allow_flip: bool,
        orient: &'a OrientationService,
    ) -> impl Iterator<Item = Candidate> + 'a {
        pool.iter().flat_map(move |layout| {
            Orientation::enumerate(allow_rotations, allow_flip).filter_map(move |orientation| {
                let data = orient.oriented_data(layout, orientation);
                entry_faces(required_outward, &data).then(|| Candidate {
                    layout: Arc::clone(layout),
                    orientation,
                })
            })
        })
    }
}
