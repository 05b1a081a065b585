//! Tile-Chain Grid Generator
//!
//! Builds a connected path network by appending rectangular layout templates
//! end-to-end through their exits:
//! - Layout templates (ASCII authored, RON libraries)
//! - Orientation under 4 rotations and an optional mirror
//! - Exit tracking with positional labels
//! - Overlap-checked placement over a uniform-grid partition
//! - Reconciliation of blocked exits into permanent spawn points
//! - Bevy plugin with a one-attempt-per-frame async append

pub mod anchor;
pub mod candidates;
pub mod chain;
pub mod config;
pub mod constants;
pub mod exits;
pub mod generator;
pub mod instantiate;
pub mod layout;
pub mod logging;
pub mod orientation;
pub mod placement;
pub mod plugin;
pub mod spatial;

pub use config::GeneratorConfig;
pub use generator::{AppendOutcome, GenerationError, GeneratorState, GridGenerator};
pub use layout::{LayoutLibrary, TileLayout};
pub use plugin::TileChainPlugin;
