//! Uniform spatial grid for broad-phase proximity queries
//!
//! Divides a fixed `width x height` world into `cell_count x cell_count`
//! cells. Every entity is recorded in each cell its square footprint
//! (`center ± radius`) touches, so a rectangle query only has to union the
//! memberships of the cells it covers. Results are a superset of the entities
//! really overlapping the rectangle; callers re-check with an exact distance test.

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::config::{ConfigError, WorldConfig};
use crate::game::entity::EntityId;
use crate::util::vec2::Vec2;

/// Set of entity ids returned by grid queries
pub type EntitySet = HashSet<EntityId, FxBuildHasher>;

/// Initial capacity for a single cell's membership set
const CELL_INITIAL_CAPACITY: usize = 8;

/// Position and radius an entity was indexed with.
///
/// The grid keeps no per-entity state, so removal needs the footprint that
/// was used when the entity was added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub position: Vec2,
    pub radius: f32,
}

impl Footprint {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Axis-aligned bounding box of the circle
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.position, self.radius)
    }
}

/// Axis-aligned rectangle in world coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Square of side `2 * half_extent` centered on `center`
    pub fn centered(center: Vec2, half_extent: f32) -> Self {
        Self {
            left: center.x - half_extent,
            top: center.y - half_extent,
            width: half_extent * 2.0,
            height: half_extent * 2.0,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Inclusive range of cell indices covered by a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    left: usize,
    right: usize,
    top: usize,
    bottom: usize,
}

/// Uniform grid over a fixed-size world
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    width: f32,
    height: f32,
    cell_count: usize,
    /// Integer-truncated cell dimensions in world units
    cell_width: i64,
    cell_height: i64,
    /// Row-major cells: index = y * cell_count + x
    cells: Vec<EntitySet>,
}

impl SpatialGrid {
    /// Create a grid over `width x height` with `cell_count` cells per axis.
    ///
    /// Fails fast on a zero cell count, non-positive dimensions or cells that
    /// truncate to zero size.
    pub fn new(width: f32, height: f32, cell_count: usize) -> Result<Self, ConfigError> {
        WorldConfig::new(width, height, cell_count).validate()?;

        let cells = (0..cell_count * cell_count)
            .map(|_| EntitySet::with_capacity_and_hasher(CELL_INITIAL_CAPACITY, FxBuildHasher))
            .collect();

        Ok(Self {
            width,
            height,
            cell_count,
            cell_width: (width as i64) / cell_count as i64,
            cell_height: (height as i64) / cell_count as i64,
            cells,
        })
    }

    pub fn from_config(config: &WorldConfig) -> Result<Self, ConfigError> {
        Self::new(config.width, config.height, config.cell_count)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Cell dimensions (width, height) in world units
    pub fn cell_size(&self) -> (i64, i64) {
        (self.cell_width, self.cell_height)
    }

    /// Map one coordinate to a clamped cell index.
    ///
    /// The coordinate is truncated to an integer before the (flooring)
    /// division, then clamped into the grid. NaN maps to 0.
    #[inline]
    fn axis_index(&self, coord: f32, cell_size: i64) -> usize {
        let max_index = (self.cell_count - 1) as i64;
        let truncated = coord.floor() as i64;
        truncated.div_euclid(cell_size).clamp(0, max_index) as usize
    }

    fn cell_range(&self, rect: &Rect) -> CellRange {
        CellRange {
            left: self.axis_index(rect.left, self.cell_width),
            right: self.axis_index(rect.right(), self.cell_width),
            top: self.axis_index(rect.top, self.cell_height),
            bottom: self.axis_index(rect.bottom(), self.cell_height),
        }
    }

    #[inline]
    fn cell_index(&self, x: usize, y: usize) -> usize {
        y * self.cell_count + x
    }

    /// Insert an entity into every cell its footprint touches
    pub fn add(&mut self, id: EntityId, footprint: Footprint) {
        let range = self.cell_range(&footprint.bounds());
        for y in range.top..=range.bottom {
            for x in range.left..=range.right {
                let idx = self.cell_index(x, y);
                self.cells[idx].insert(id);
            }
        }
    }

    /// Remove an entity using the footprint it was added with.
    ///
    /// Cells the entity is not a member of are skipped silently.
    pub fn remove(&mut self, id: EntityId, footprint: Footprint) {
        let range = self.cell_range(&footprint.bounds());
        for y in range.top..=range.bottom {
            for x in range.left..=range.right {
                let idx = self.cell_index(x, y);
                self.cells[idx].remove(&id);
            }
        }
    }

    /// Re-bucket an entity whose footprint changed from `old` to `new`
    pub fn relocate(&mut self, id: EntityId, old: Footprint, new: Footprint) {
        if self.cell_range(&old.bounds()) == self.cell_range(&new.bounds()) {
            return;
        }
        self.remove(id, old);
        self.add(id, new);
    }

    /// All entities recorded in the cells covered by `rect`.
    ///
    /// This over-approximates: entities sharing a covered cell are returned
    /// even if they do not overlap the rectangle itself.
    pub fn query(&self, rect: &Rect) -> EntitySet {
        let mut result = EntitySet::default();
        self.query_into(rect, &mut result);
        result
    }

    /// Same as [`query`](Self::query) but appends into a caller-owned set
    pub fn query_into(&self, rect: &Rect, out: &mut EntitySet) {
        let range = self.cell_range(rect);
        for y in range.top..=range.bottom {
            for x in range.left..=range.right {
                out.extend(self.cells[self.cell_index(x, y)].iter().copied());
            }
        }
    }

    /// Entities recorded in cell (x, y); empty for out-of-range cells
    pub fn cell_members(&self, x: usize, y: usize) -> impl Iterator<Item = EntityId> + '_ {
        let cell = (x < self.cell_count && y < self.cell_count)
            .then(|| &self.cells[self.cell_index(x, y)]);
        cell.into_iter().flat_map(|c| c.iter().copied())
    }

    /// Clear all entities from the grid
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Get statistics about the grid
    pub fn stats(&self) -> SpatialGridStats {
        let non_empty_cells = self.cells.iter().filter(|c| !c.is_empty()).count();
        let memberships: usize = self.cells.iter().map(|c| c.len()).sum();
        let max_per_cell = self.cells.iter().map(|c| c.len()).max().unwrap_or(0);

        SpatialGridStats {
            non_empty_cells,
            memberships,
            max_per_cell,
        }
    }
}

/// Statistics about the spatial grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialGridStats {
    pub non_empty_cells: usize,
    /// Total (entity, cell) pairs; an entity spanning several cells counts once per cell
    pub memberships: usize,
    pub max_per_cell: usize,
}
