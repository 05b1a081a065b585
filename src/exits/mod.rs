//! Exit repository: open connection points of the placed chain.
//!
//! Selection from the outside is by *position within the Open set*, so labels
//! are reassigned from the current Open order after every change to that set.

use bevy::math::{IVec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::PlacedTile;
use crate::orientation::OrientationService;

/// Why an exit left the Open set without a tile attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// No template could ever attach here
    NoCandidate,
    /// A later tile occupies the cell outside the exit
    PermanentSpawn,
    /// The exit cell has zero or several interior path neighbours
    InvalidGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitStatus {
    Open,
    Used,
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitRecord {
    pub tile_index: usize,
    /// Layout-local cell of the owning tile
    pub cell: IVec2,
    pub label: String,
    pub status: ExitStatus,
}

impl ExitRecord {
    pub fn open(tile_index: usize, cell: IVec2) -> Self {
        Self {
            tile_index,
            cell,
            label: String::new(),
            status: ExitStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ExitStatus::Open
    }
}

/// Spreadsheet-style label: 0 → "A", 25 → "Z", 26 → "AA"
pub fn label_for(position: usize) -> String {
    let mut n = position + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct ExitRepository {
    records: Vec<ExitRecord>,
}

impl ExitRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record's global index
    pub fn add(&mut self, record: ExitRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn get(&self, index: usize) -> &ExitRecord {
        &self.records[index]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Open → Used. Any other starting status is rejected.
    pub fn mark_used(&mut self, index: usize) -> bool {
        self.transition(index, ExitStatus::Used)
    }

    /// Open → Closed. Any other starting status is rejected.
    pub fn mark_closed(&mut self, index: usize, reason: CloseReason) -> bool {
        self.transition(index, ExitStatus::Closed(reason))
    }

    fn transition(&mut self, index: usize, to: ExitStatus) -> bool {
        match self.records.get_mut(index) {
            Some(rec) if rec.is_open() => {
                debug!(exit = index, label = %rec.label, ?to, "exit status changed");
                rec.status = to;
                true
            }
            _ => false,
        }
    }

    pub fn relabel(&mut self) {
        let mut position = 0;
        for rec in &mut self.records {
            if rec.is_open() {
                rec.label = label_for(position);
                position += 1;
            } else {
                rec.label.clear();
            }
        }
    }

    pub fn indices_available(&self) -> impl Iterator<Item = usize> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_open())
            .map(|(i, _)| i)
    }

    pub fn open_count(&self) -> usize {
        self.indices_available().count()
    }

    pub fn global_index_from_available(&self, position: usize) -> Option<usize> {
        self.indices_available().nth(position)
    }

    pub fn available_index_by_label(&self, label: &str) -> Option<usize> {
        self.indices_available()
            .position(|i| self.records[i].label == label)
    }

    pub fn available_labels(&self) -> Vec<String> {
        self.indices_available()
            .map(|i| self.records[i].label.clone())
            .collect()
    }

    /// `(label, world position)` of every Open exit, resolving tiles through `lookup`
    pub fn available_world<'t, F>(&self, orient: &OrientationService, lookup: F) -> Vec<(String, Vec3)>
    where
        F: Fn(usize) -> &'t PlacedTile,
    {
        self.indices_available()
            .map(|i| {
                let rec = &self.records[i];
                let tile = lookup(rec.tile_index);
                (rec.label.clone(), tile.cell_world(orient, rec.cell))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExitRecord> {
        self.records.iter()
    }
}
