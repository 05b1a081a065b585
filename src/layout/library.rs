//! Layout library: the initial template plus the candidate pool.
//!
//! Libraries are authored in RON:
//!
//! ```text
//! (
//!     initial: Some("hub"),
//!     candidates: ["straight", "corner"],
//!     layouts: [
//!         (name: "hub", rows: [".#.", "###", ".#."], entry: (0, 1),
//!          exits: [(2, 1), (1, 0), (1, 2)], core: Some((1, 1))),
//!         (name: "straight", rows: ["###"], entry: (0, 0), exits: [(2, 0)]),
//!     ],
//! )
//! ```
//!
//! An empty `candidates` list selects every layout except the initial one.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use bevy::math::IVec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LayoutDef, LayoutError, TileLayout};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LibraryDef {
    #[serde(default)]
    initial: Option<String>,
    #[serde(default)]
    candidates: Vec<String>,
    layouts: Vec<LayoutDef>,
}

/// Initial template and candidate pool handed to the generator
#[derive(Debug, Clone, Default)]
pub struct LayoutLibrary {
    initial: Option<Arc<TileLayout>>,
    candidates: Vec<Arc<TileLayout>>,
}

impl LayoutLibrary {
    pub fn new(initial: Option<TileLayout>, candidates: Vec<TileLayout>) -> Self {
        Self {
            initial: initial.map(Arc::new),
            candidates: candidates.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn initial(&self) -> Option<&Arc<TileLayout>> {
        self.initial.as_ref()
    }

    pub fn candidates(&self) -> &[Arc<TileLayout>] {
        &self.candidates
    }

    pub fn candidate(&self, name: &str) -> Option<&Arc<TileLayout>> {
        self.candidates.iter().find(|l| l.name() == name)
    }

    pub fn from_ron_str(source: &str) -> Result<Self, LayoutError> {
        let def: LibraryDef = ron::from_str(source)?;

        let mut seen = HashSet::new();
        let mut layouts = Vec::with_capacity(def.layouts.len());
        for layout_def in def.layouts {
            if !seen.insert(layout_def.name.clone()) {
                return Err(LayoutError::Duplicate(layout_def.name));
            }
            let layout = TileLayout::from_def(layout_def)?;
            for issue in layout.lint() {
                warn!(layout = layout.name(), %issue, "exit will be skipped at runtime");
            }
            layouts.push(Arc::new(layout));
        }

        let find = |name: &str| {
            layouts
                .iter()
                .find(|l| l.name() == name)
                .cloned()
                .ok_or_else(|| LayoutError::Unknown(name.to_string()))
        };

        let initial = def.initial.as_deref().map(find).transpose()?;
        let candidates = if def.candidates.is_empty() {
            layouts
                .iter()
                .filter(|l| initial.as_ref().map_or(true, |i| !Arc::ptr_eq(i, l)))
                .cloned()
                .collect()
        } else {
            def.candidates
                .iter()
                .map(|name| find(name))
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(
            layouts = layouts.len(),
            candidates = candidates.len(),
            "layout library loaded"
        );
        Ok(Self {
            initial,
            candidates,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Library compiled into the crate: a cross-shaped hub with a core and a
    /// small pool of corridors, bends and junctions.
    pub fn builtin() -> Self {
        let v = IVec2::new;
        let layout = |name: &str, rows: &[&str], entry: IVec2, exits: &[IVec2]| {
            TileLayout::from_ascii(name, rows, entry, exits)
                .unwrap_or_else(|e| panic!("builtin layout `{name}` is invalid: {e}"))
        };

        let hub = layout(
            "hub",
            &[".#.", "###", ".#."],
            v(0, 1),
            &[v(2, 1), v(1, 0), v(1, 2)],
        )
        .with_core(v(1, 1))
        .unwrap_or_else(|e| panic!("builtin hub core is invalid: {e}"));

        let candidates = vec![
            layout("straight", &["###"], v(0, 0), &[v(2, 0)]),
            layout("corner", &["##", ".#"], v(0, 0), &[v(1, 1)]),
            layout("tee", &["###", ".#."], v(0, 0), &[v(2, 0), v(1, 1)]),
            layout("long_damage", &["##D##"], v(0, 0), &[v(4, 0)]),
            layout("slow_bend", &["#..", "#..", "#SS"], v(0, 0), &[v(2, 2)]),
            layout("stun_zig", &["##.", ".#T"], v(0, 0), &[v(2, 1)]),
        ];

        Self::new(Some(hub), candidates)
    }
}
