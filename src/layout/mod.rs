//! Layout templates: immutable rectangular grids of cell kinds.
//!
//! A template carries its entry cell (where it attaches to a predecessor), its
//! exit cells (where successors may attach) and an optional core cell. Templates
//! are shared between placed tiles through `Arc` and never mutated after
//! construction.
//!
//! Construction validates the authoring invariants: entry, exit and core cells
//! are inside the grid, are path cells, and entry/exits lie on the border. The
//! "exactly one interior path neighbour" rule for exits is only linted; the
//! generator skips offending exits at runtime.

pub mod library;

use bevy::math::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::ORTHO_DIRS;

pub use library::LayoutLibrary;

/// Status effect carried by a path cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathEffect {
    Basic,
    Damage,
    Slow,
    Stun,
}

/// What occupies one layout cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Grass,
    Path(PathEffect),
}

impl CellKind {
    /// Every kind, in prefab table order
    pub const ALL: [CellKind; 5] = [
        CellKind::Grass,
        CellKind::Path(PathEffect::Basic),
        CellKind::Path(PathEffect::Damage),
        CellKind::Path(PathEffect::Slow),
        CellKind::Path(PathEffect::Stun),
    ];

    pub fn is_path(&self) -> bool {
        matches!(self, CellKind::Path(_))
    }

    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(CellKind::Grass),
            '#' => Some(CellKind::Path(PathEffect::Basic)),
            'D' => Some(CellKind::Path(PathEffect::Damage)),
            'S' => Some(CellKind::Path(PathEffect::Slow)),
            'T' => Some(CellKind::Path(PathEffect::Stun)),
            _ => None,
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            CellKind::Grass => '.',
            CellKind::Path(PathEffect::Basic) => '#',
            CellKind::Path(PathEffect::Damage) => 'D',
            CellKind::Path(PathEffect::Slow) => 'S',
            CellKind::Path(PathEffect::Stun) => 'T',
        }
    }
}

/// Authoring-time template errors
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout `{0}` has no cells")]
    Empty(String),
    #[error("layout `{name}` row {row} has width {found}, expected {expected}")]
    Ragged {
        name: String,
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("layout `{name}` has unknown glyph `{glyph}` at {cell}")]
    UnknownGlyph {
        name: String,
        glyph: char,
        cell: IVec2,
    },
    #[error("layout `{name}` cell size must be positive, got {size}")]
    CellSize { name: String, size: f32 },
    #[error("layout `{name}` {role} cell {cell} is outside the grid")]
    Outside {
        name: String,
        role: &'static str,
        cell: IVec2,
    },
    #[error("layout `{name}` {role} cell {cell} is not a path cell")]
    NotPath {
        name: String,
        role: &'static str,
        cell: IVec2,
    },
    #[error("layout `{name}` {role} cell {cell} is not on the border")]
    NotOnBorder {
        name: String,
        role: &'static str,
        cell: IVec2,
    },
    #[error("duplicate layout name `{0}`")]
    Duplicate(String),
    #[error("unknown layout `{0}`")]
    Unknown(String),
    #[error("failed to parse layout library: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an exit cell cannot yield an outward direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExitGeometryError {
    #[error("cell {0} is outside the layout")]
    Outside(IVec2),
    #[error("cell {0} is not a path cell")]
    NotPath(IVec2),
    #[error("cell {cell} has {count} interior path neighbours, expected exactly one")]
    AmbiguousNeighbor { cell: IVec2, count: usize },
}

fn default_cell_size() -> f32 {
    1.0
}

/// Serializable template description (RON library entries)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDef {
    pub name: String,
    /// ASCII rows, `rows[y]`, one glyph per cell
    pub rows: Vec<String>,
    pub entry: (i32, i32),
    #[serde(default)]
    pub exits: Vec<(i32, i32)>,
    #[serde(default)]
    pub core: Option<(i32, i32)>,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default)]
    pub origin: (f32, f32, f32),
}

/// Immutable layout template
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayout {
    name: String,
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
    cell_size: f32,
    origin: Vec3,
    entry: IVec2,
    exits: Vec<IVec2>,
    core: Option<IVec2>,
}

impl TileLayout {
    /// Build from ASCII rows with unit cells at the world origin
    pub fn from_ascii(
        name: &str,
        rows: &[&str],
        entry: IVec2,
        exits: &[IVec2],
    ) -> Result<Self, LayoutError> {
        Self::from_def(LayoutDef {
            name: name.to_string(),
            rows: rows.iter().map(|r| r.to_string()).collect(),
            entry: (entry.x, entry.y),
            exits: exits.iter().map(|e| (e.x, e.y)).collect(),
            core: None,
            cell_size: default_cell_size(),
            origin: (0.0, 0.0, 0.0),
        })
    }

    pub fn from_def(def: LayoutDef) -> Result<Self, LayoutError> {
        let name = def.name;
        let height = def.rows.len();
        let width = def.rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(LayoutError::Empty(name));
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in def.rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    name,
                    row: y,
                    found,
                    expected: width,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let kind = CellKind::from_glyph(glyph).ok_or_else(|| LayoutError::UnknownGlyph {
                    name: name.clone(),
                    glyph,
                    cell: IVec2::new(x as i32, y as i32),
                })?;
                cells.push(kind);
            }
        }

        if !(def.cell_size.is_finite() && def.cell_size > 0.0) {
            return Err(LayoutError::CellSize {
                name,
                size: def.cell_size,
            });
        }

        let layout = Self {
            name,
            width: width as i32,
            height: height as i32,
            cells,
            cell_size: def.cell_size,
            origin: Vec3::new(def.origin.0, def.origin.1, def.origin.2),
            entry: IVec2::new(def.entry.0, def.entry.1),
            exits: def.exits.iter().map(|&(x, y)| IVec2::new(x, y)).collect(),
            core: def.core.map(|(x, y)| IVec2::new(x, y)),
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn with_core(mut self, cell: IVec2) -> Result<Self, LayoutError> {
        self.core = Some(cell);
        self.validate()?;
        Ok(self)
    }

    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Result<Self, LayoutError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(LayoutError::CellSize {
                name: self.name,
                size: cell_size,
            });
        }
        self.cell_size = cell_size;
        Ok(self)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        self.check_cell("entry", self.entry, true)?;
        for &exit in &self.exits {
            self.check_cell("exit", exit, true)?;
        }
        if let Some(core) = self.core {
            self.check_cell("core", core, false)?;
        }
        Ok(())
    }

    fn check_cell(&self, role: &'static str, cell: IVec2, border: bool) -> Result<(), LayoutError> {
        let name = || self.name.clone();
        if !self.is_inside(cell) {
            return Err(LayoutError::Outside { name: name(), role, cell });
        }
        if !self.is_path(cell) {
            return Err(LayoutError::NotPath { name: name(), role, cell });
        }
        if border && !self.is_on_border(cell) {
            return Err(LayoutError::NotOnBorder { name: name(), role, cell });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn entry(&self) -> IVec2 {
        self.entry
    }

    pub fn exits(&self) -> &[IVec2] {
        &self.exits
    }

    pub fn core(&self) -> Option<IVec2> {
        self.core
    }

    pub fn is_inside(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    pub fn cell_kind(&self, cell: IVec2) -> Option<CellKind> {
        if !self.is_inside(cell) {
            return None;
        }
        self.cells
            .get((cell.y * self.width + cell.x) as usize)
            .copied()
    }

    /// Out-of-grid cells are never path
    pub fn is_path(&self, cell: IVec2) -> bool {
        self.cell_kind(cell).is_some_and(|k| k.is_path())
    }

    pub fn is_on_border(&self, cell: IVec2) -> bool {
        self.is_inside(cell)
            && (cell.x == 0 || cell.y == 0 || cell.x == self.width - 1 || cell.y == self.height - 1)
    }

    /// Every cell with its kind, row-major
    pub fn cells(&self) -> impl Iterator<Item = (IVec2, CellKind)> + '_ {
        self.cells.iter().enumerate().map(move |(i, kind)| {
            let i = i as i32;
            (IVec2::new(i % self.width, i / self.width), *kind)
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The unique orthogonal path neighbour of `cell` inside this layout.
    ///
    /// `exit − neighbour` is the exit's outward direction in layout space.
    pub fn single_path_neighbor(&self, cell: IVec2) -> Result<IVec2, ExitGeometryError> {
        if !self.is_inside(cell) {
            return Err(ExitGeometryError::Outside(cell));
        }
        if !self.is_path(cell) {
            return Err(ExitGeometryError::NotPath(cell));
        }
        let mut count = 0;
        let mut found = cell;
        for dir in ORTHO_DIRS {
            let n = cell + dir;
            if self.is_path(n) {
                count += 1;
                found = n;
            }
        }
        if count == 1 {
            Ok(found)
        } else {
            Err(ExitGeometryError::AmbiguousNeighbor { cell, count })
        }
    }

    /// Exits that will be skipped at runtime
    pub fn lint(&self) -> Vec<ExitGeometryError> {
        self.exits
            .iter()
            .filter_map(|&exit| self.single_path_neighbor(exit).err())
            .collect()
    }
}
