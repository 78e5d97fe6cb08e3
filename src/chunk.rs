//! Chunk coordinates, the world grid, and per-chunk lifecycle state.
//!
//! The world is cut into fixed-size rectangular cells. Every cell exists as a
//! [`Chunk`] placeholder from editor start; only its contents stream in and
//! out. Coordinates are keyed as `"i,j"` both in the scene graph (chunk
//! container names) and in store paths.

#[cfg(test)]
#[path = "chunk_test.rs"]
mod chunk_test;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::geom::{Rect, Vector};
use crate::node::ObjectNode;
use crate::object::ObjectName;
use crate::render::NodeId;
use crate::store::SubscriptionId;

/// Integer index of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub i: i32,
    pub j: i32,
}

impl ChunkCoord {
    #[must_use]
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid chunk key: {0:?}")]
pub struct ChunkCoordParseError(pub String);

impl FromStr for ChunkCoord {
    type Err = ChunkCoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ChunkCoordParseError(s.to_owned());
        let (i, j) = s.split_once(',').ok_or_else(err)?;
        let i = i.trim().parse::<i32>().map_err(|_| err())?;
        let j = j.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self { i, j })
    }
}

/// Maps world positions onto chunk coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkGrid {
    bounds: Rect,
    cell: Vector,
    columns: i32,
    rows: i32,
}

impl ChunkGrid {
    /// Grid covering `bounds` with cells of `cell` world units. Each axis
    /// has `ceil(extent / cell)` cells, at least one.
    #[must_use]
    pub fn new(bounds: Rect, cell: Vector) -> Self {
        Self {
            bounds,
            cell,
            columns: cell_count(bounds.width(), cell.x),
            rows: cell_count(bounds.height(), cell.y),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[must_use]
    pub fn cell_size(&self) -> Vector {
        self.cell
    }

    #[must_use]
    pub fn columns(&self) -> i32 {
        self.columns
    }

    #[must_use]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        (0..self.columns).contains(&coord.i) && (0..self.rows).contains(&coord.j)
    }

    /// Chunk owning `p`: `floor(p / cell)`, clamped into the grid so points
    /// on (or beyond) the far world edge land in the last cell. The grid has
    /// `ceil(extent / cell)` cells per axis and no extra cell past the edge,
    /// so a point exactly on the far edge of a world whose extent is a whole
    /// number of cells maps one lower than a bare `floor(p / cell)` would
    /// (`(90000, 2400)` is `149,3`, not `150,4`). Chunk keys shared with
    /// other clients agree everywhere else.
    #[must_use]
    pub fn coord_of(&self, p: Vector) -> ChunkCoord {
        ChunkCoord {
            i: floor_index(p.x - self.bounds.start.x, self.cell.x, self.columns),
            j: floor_index(p.y - self.bounds.start.y, self.cell.y, self.rows),
        }
    }

    /// Every cell overlapping `rect` with positive area, after clamping
    /// `rect` into the grid bounds. The result is a contiguous block. A
    /// degenerate rectangle yields the single cell containing it.
    #[must_use]
    pub fn cells_overlapping(&self, rect: &Rect) -> BTreeSet<ChunkCoord> {
        let r = rect.clamped(&self.bounds);
        let i0 = floor_index(r.start.x - self.bounds.start.x, self.cell.x, self.columns);
        let j0 = floor_index(r.start.y - self.bounds.start.y, self.cell.y, self.rows);
        let i1 = last_index(r.end.x - self.bounds.start.x, self.cell.x, self.columns).max(i0);
        let j1 = last_index(r.end.y - self.bounds.start.y, self.cell.y, self.rows).max(j0);
        let mut out = BTreeSet::new();
        for i in i0..=i1 {
            for j in j0..=j1 {
                out.insert(ChunkCoord { i, j });
            }
        }
        out
    }

    /// World rectangle of a cell.
    #[must_use]
    pub fn cell_rect(&self, coord: ChunkCoord) -> Rect {
        let start = Vector::new(
            self.bounds.start.x + f64::from(coord.i) * self.cell.x,
            self.bounds.start.y + f64::from(coord.j) * self.cell.y,
        );
        Rect::new(start, start + self.cell)
    }

    /// Every coordinate of the grid, column-major.
    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + use<> {
        let rows = self.rows;
        (0..self.columns).flat_map(move |i| (0..rows).map(move |j| ChunkCoord { i, j }))
    }
}

/// Index of the cell containing `offset`.
fn floor_index(offset: f64, cell: f64, count: i32) -> i32 {
    to_index((offset / cell).floor(), count)
}

/// Index of the last cell a span ending at `offset` overlaps with positive
/// length.
fn last_index(offset: f64, cell: f64, count: i32) -> i32 {
    to_index((offset / cell).ceil() - 1.0, count)
}

#[allow(clippy::cast_possible_truncation)]
fn cell_count(extent: f64, cell: f64) -> i32 {
    if cell.is_nan() || cell <= 0.0 || !extent.is_finite() || extent <= 0.0 {
        return 1;
    }
    ((extent / cell).ceil().min(f64::from(i32::MAX)) as i32).max(1)
}

#[allow(clippy::cast_possible_truncation)]
fn to_index(value: f64, count: i32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, f64::from(count - 1))) as i32
}

/// Streaming state of a chunk's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkState {
    /// No objects materialized and no subscription.
    #[default]
    Unloaded,
    /// Subscription issued; waiting for the first data.
    Loading,
    /// Objects materialized and kept in sync.
    Loaded,
}

/// One cell of the world and the object nodes it owns.
#[derive(Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub state: ChunkState,
    /// Whether the chunk is in the current visible set.
    pub visible: bool,
    /// Last time (ms) the chunk was part of the visible set.
    pub last_time_visible: f64,
    /// Live subscription, while loading or loaded.
    pub subscription: Option<SubscriptionId>,
    /// Container node grouping this chunk's objects.
    pub container: NodeId,
    pub(crate) objects: BTreeMap<ObjectName, ObjectNode>,
}

impl Chunk {
    #[must_use]
    pub fn new(coord: ChunkCoord, container: NodeId) -> Self {
        Self {
            coord,
            state: ChunkState::Unloaded,
            visible: false,
            last_time_visible: 0.0,
            subscription: None,
            container,
            objects: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn object(&self, name: &str) -> Option<&ObjectNode> {
        self.objects.get(name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectNode> {
        self.objects.values()
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state == ChunkState::Loaded
    }
}
