//! Rectangular tile grid with gravity and column packing
//!
//! Cells are stored in a flat array indexed by `row * width + col`, with
//! row 0 at the bottom and column 0 at the left. Between player actions the
//! grid keeps two invariants:
//!
//! - gravity: in every column the occupied cells form a contiguous run
//!   starting at row 0
//! - packing: the occupied columns form a contiguous run starting at column 0
//!
//! [`Grid::remove_and_compact`] is the only operation that restores them.

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::layout::Layout;
use crate::presenter::{Element, Presenter};

/// Tile category, valid values are `0..tile_types` of the level
pub type TileType = u8;

/// Flat cell index (`row * width + col`)
pub type CellIndex = usize;

// ============================================================================
// GEOMETRY
// ============================================================================

/// World-space position
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// World-space size of one cell
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f32,
    pub height: f32,
}

impl CellSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Placement of the grid in world space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Bottom-left corner of cell 0
    pub origin: Point,
    pub cell_size: CellSize,
}

impl Geometry {
    pub const fn new(origin: Point, cell_size: CellSize) -> Self {
        Self { origin, cell_size }
    }

    /// Geometry placing a `width` x `height` grid centred on the world origin
    pub fn centered(width: usize, height: usize, cell_size: CellSize) -> Self {
        let origin = Point::new(
            -(cell_size.width * width as f32 * 0.5),
            -(cell_size.height * height as f32 * 0.5),
        );
        Self { origin, cell_size }
    }
}

/// What a call to [`Grid::remove_and_compact`] did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compaction {
    /// Occupied cells cleared
    pub removed: usize,
    /// Slot-to-slot transfers of occupied cells (gravity and packing)
    pub cells_moved: usize,
    /// Columns moved to the left
    pub columns_shifted: usize,
}

// ============================================================================
// GRID
// ============================================================================

/// Fixed-size grid of tiles; owns the visual handle of every tile it holds
pub struct Grid<P: Presenter> {
    width: usize,
    height: usize,
    geometry: Geometry,
    cells: Vec<Option<Element<P::Handle>>>,
    presenter: P,
}

impl<P: Presenter> Grid<P> {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Create an empty grid
    pub fn new(width: usize, height: usize, geometry: Geometry, presenter: P) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        if !geometry.cell_size.is_valid() {
            return Err(GridError::InvalidConfig(format!(
                "cell size must be positive, got {}x{}",
                geometry.cell_size.width, geometry.cell_size.height
            )));
        }

        let mut cells = Vec::with_capacity(width * height);
        cells.resize_with(width * height, || None);

        Ok(Self {
            width,
            height,
            geometry,
            cells,
            presenter,
        })
    }

    /// Create a grid holding the tiles of `layout`, spawning one visual per tile.
    ///
    /// The layout must already satisfy gravity and packing; otherwise the
    /// spawned visuals are released and `InvariantViolation` is returned.
    pub fn from_layout(layout: &Layout, geometry: Geometry, presenter: P) -> Result<Self, GridError> {
        let mut grid = Self::new(layout.width(), layout.height(), geometry, presenter)?;

        let len = grid.cells.len();
        for (index, tile) in layout.cells().iter().take(len).enumerate() {
            if let Some(tile) = *tile {
                let center = grid.cell_center(index);
                let visual = grid.presenter.spawn(tile, center)?;
                grid.cells[index] = Some(Element::new(tile, visual));
            }
        }

        if let Err(e) = grid.check_invariants() {
            tracing::warn!("Grid::from_layout -> {}", e);
            grid.release_all();
            return Err(e);
        }

        Ok(grid)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Consume the grid, handing back the presenter. Remaining handles are dropped
    /// without notification; call [`Grid::release_all`] first to release them.
    pub fn into_presenter(self) -> P {
        self.presenter
    }

    // ========================================================================
    // INDEXING
    // ========================================================================

    pub fn is_valid(&self, index: CellIndex) -> bool {
        index < self.cells.len()
    }

    /// Index of the cell at (`col`, `row`), `None` outside the grid
    pub fn index_of(&self, col: usize, row: usize) -> Option<CellIndex> {
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    /// (`col`, `row`) of a cell index
    pub fn coords(&self, index: CellIndex) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Centre of a cell in world space
    pub fn cell_center(&self, index: CellIndex) -> Point {
        let (col, row) = self.coords(index);
        let size = self.geometry.cell_size;
        Point::new(
            self.geometry.origin.x + (col as f32 + 0.5) * size.width,
            self.geometry.origin.y + (row as f32 + 0.5) * size.height,
        )
    }

    /// Cell enclosing a world-space point. Points outside the grid's extent
    /// have no cell; that is not an error.
    pub fn cell_index_of(&self, point: Point) -> Option<CellIndex> {
        let size = self.geometry.cell_size;
        let col = ((point.x - self.geometry.origin.x) / size.width).floor();
        let row = ((point.y - self.geometry.origin.y) / size.height).floor();

        // NaN fails both comparisons
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }
        self.index_of(col as usize, row as usize)
    }

    fn ensure_valid(&self, index: CellIndex, op: &str) -> Result<(), GridError> {
        if self.is_valid(index) {
            return Ok(());
        }
        tracing::warn!("Grid::{} -> index {} out of range", op, index);
        Err(GridError::OutOfRange {
            index,
            len: self.cells.len(),
        })
    }

    fn ensure_column(&self, column: usize, op: &str) -> Result<(), GridError> {
        if column < self.width {
            return Ok(());
        }
        tracing::warn!("Grid::{} -> column {} out of range", op, column);
        Err(GridError::ColumnOutOfRange {
            column,
            width: self.width,
        })
    }

    // ========================================================================
    // CELL ACCESS
    // ========================================================================

    /// Element at `index`; `Ok(None)` for an empty cell
    pub fn get(&self, index: CellIndex) -> Result<Option<&Element<P::Handle>>, GridError> {
        match self.cells.get(index) {
            Some(cell) => Ok(cell.as_ref()),
            None => Err(GridError::OutOfRange {
                index,
                len: self.cells.len(),
            }),
        }
    }

    /// Tile type at `index`, `None` for empty or invalid cells
    pub fn tile(&self, index: CellIndex) -> Option<TileType> {
        self.cells.get(index)?.as_ref().map(|e| e.tile)
    }

    pub fn is_occupied(&self, index: CellIndex) -> bool {
        self.tile(index).is_some()
    }

    /// Occupied cells with their tile types, in index order
    pub fn tiles(&self) -> impl Iterator<Item = (CellIndex, TileType)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.as_ref().map(|e| (i, e.tile)))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Store `element` at `index`, moving its visual to the cell centre.
    /// Returns the element previously held by the slot.
    pub fn set(
        &mut self,
        index: CellIndex,
        mut element: Element<P::Handle>,
    ) -> Result<Option<Element<P::Handle>>, GridError> {
        self.ensure_valid(index, "set")?;

        let center = self.cell_center(index);
        self.reposition(&mut element.visual, center);
        Ok(self.cells[index].replace(element))
    }

    /// Empty a cell, releasing its visual. Returns whether the cell was occupied.
    pub fn clear(&mut self, index: CellIndex) -> Result<bool, GridError> {
        self.ensure_valid(index, "clear")?;

        match self.cells[index].take() {
            Some(element) => {
                self.release(element.visual);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Move the element at `from` to `to`. Returns the element displaced from `to`.
    pub fn move_cell(
        &mut self,
        from: CellIndex,
        to: CellIndex,
    ) -> Result<Option<Element<P::Handle>>, GridError> {
        self.ensure_valid(from, "move_cell")?;
        self.ensure_valid(to, "move_cell")?;
        Ok(self.transfer(from, to).1)
    }

    /// Move every cell of column `from` into column `to`. Elements displaced
    /// from `to` are released.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        self.ensure_column(from, "move_column")?;
        self.ensure_column(to, "move_column")?;
        if from != to {
            self.shift_column(from, to);
        }
        Ok(())
    }

    /// Whether a column holds no tiles; `false` for columns outside the grid
    pub fn column_is_empty(&self, column: usize) -> bool {
        column < self.width && (0..self.height).all(|row| self.cells[row * self.width + column].is_none())
    }

    // ========================================================================
    // NEIGHBOURHOOD
    // ========================================================================

    /// In-bounds 4-neighbours of a cell, ordered left, right, down, up
    pub fn adjacent4(&self, index: CellIndex) -> [Option<CellIndex>; 4] {
        if !self.is_valid(index) {
            return [None; 4];
        }
        let (col, row) = self.coords(index);
        [
            col.checked_sub(1).and_then(|c| self.index_of(c, row)),
            self.index_of(col + 1, row),
            row.checked_sub(1).and_then(|r| self.index_of(col, r)),
            self.index_of(col, row + 1),
        ]
    }

    /// Occupied 4-neighbours of a cell, ordered left, right, down, up
    pub fn neighbors4(&self, index: CellIndex) -> Vec<CellIndex> {
        self.adjacent4(index)
            .into_iter()
            .flatten()
            .filter(|&n| self.cells[n].is_some())
            .collect()
    }

    // ========================================================================
    // REMOVAL AND COMPACTION
    // ========================================================================

    /// Remove the given cells, then let tiles fall and close empty columns.
    ///
    /// Fails without touching the grid if any index is out of range.
    /// Duplicate and empty indices are accepted.
    pub fn remove_and_compact(&mut self, indices: &[CellIndex]) -> Result<Compaction, GridError> {
        if let Some(&index) = indices.iter().find(|&&i| !self.is_valid(i)) {
            tracing::warn!("Grid::remove_and_compact -> index {} out of range", index);
            return Err(GridError::OutOfRange {
                index,
                len: self.cells.len(),
            });
        }

        let mut seen = FxHashSet::default();
        let mut touched = vec![false; self.width];
        let mut report = Compaction::default();

        for &index in indices {
            if !seen.insert(index) {
                continue;
            }
            if let Some(element) = self.cells[index].take() {
                self.release(element.visual);
                report.removed += 1;
            }
            touched[index % self.width] = true;
        }

        for column in 0..self.width {
            if touched[column] {
                report.cells_moved += self.settle_column(column);
            }
        }

        let (shifted, moved) = self.pack_columns();
        report.columns_shifted = shifted;
        report.cells_moved += moved;

        tracing::debug!(
            "Removed {} cells: {} transfers, {} columns shifted",
            report.removed,
            report.cells_moved,
            report.columns_shifted
        );

        Ok(report)
    }

    /// Let the tiles of one column fall onto row 0. Single bottom-up pass.
    fn settle_column(&mut self, column: usize) -> usize {
        let mut gap = 0;
        let mut moved = 0;

        for row in 0..self.height {
            let from = row * self.width + column;
            if self.cells[from].is_none() {
                gap += 1;
            } else if gap > 0 {
                let to = from - gap * self.width;
                let (did_move, displaced) = self.transfer(from, to);
                debug_assert!(displaced.is_none(), "gravity moved onto an occupied cell");
                moved += usize::from(did_move);
            }
        }

        moved
    }

    /// Close empty columns by moving occupied ones to the left. Single
    /// left-to-right pass. Returns (columns shifted, cells moved).
    fn pack_columns(&mut self) -> (usize, usize) {
        let mut gap = 0;
        let mut shifted = 0;
        let mut moved = 0;

        for column in 0..self.width {
            // Gravity holds here, so a column is empty iff its bottom cell is
            if self.cells[column].is_none() {
                gap += 1;
            } else if gap > 0 {
                moved += self.shift_column(column, column - gap);
                shifted += 1;
            }
        }

        (shifted, moved)
    }

    /// Transfer every occupied cell of column `from` into column `to`, top row first
    fn shift_column(&mut self, from: usize, to: usize) -> usize {
        let mut moved = 0;

        for row in (0..self.height).rev() {
            let src = row * self.width + from;
            let dst = row * self.width + to;
            let (did_move, displaced) = self.transfer(src, dst);
            if let Some(element) = displaced {
                self.release(element.visual);
            }
            moved += usize::from(did_move);
        }

        moved
    }

    /// Slot-to-slot transfer of an element. Returns whether anything moved and
    /// the element previously held by `to`.
    fn transfer(&mut self, from: CellIndex, to: CellIndex) -> (bool, Option<Element<P::Handle>>) {
        let Some(mut element) = self.cells[from].take() else {
            return (false, None);
        };

        let center = self.cell_center(to);
        self.reposition(&mut element.visual, center);
        (true, self.cells[to].replace(element))
    }

    // ========================================================================
    // PRESENTER NOTIFICATIONS
    // ========================================================================

    fn reposition(&mut self, visual: &mut P::Handle, center: Point) {
        if let Err(e) = self.presenter.reposition(visual, center) {
            tracing::warn!("Grid::reposition -> {}", e);
        }
    }

    fn release(&mut self, visual: P::Handle) {
        if let Err(e) = self.presenter.release(visual) {
            tracing::warn!("Grid::release -> {}", e);
        }
    }

    /// Release every visual and empty the grid. Returns the number released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for index in 0..self.cells.len() {
            if let Some(element) = self.cells[index].take() {
                self.release(element.visual);
                released += 1;
            }
        }
        released
    }

    // ========================================================================
    // SNAPSHOTS AND CHECKS
    // ========================================================================

    /// Tile map of the current grid contents
    pub fn layout(&self) -> Layout {
        Layout::from_fn(self.width, self.height, |index| self.tile(index))
    }

    /// Verify the gravity and packing invariants
    pub fn check_invariants(&self) -> Result<(), GridError> {
        for column in 0..self.width {
            let mut seen_empty = false;
            for row in 0..self.height {
                let occupied = self.cells[row * self.width + column].is_some();
                if occupied && seen_empty {
                    return Err(GridError::InvariantViolation(format!(
                        "column {} has a gap below row {}",
                        column, row
                    )));
                }
                seen_empty |= !occupied;
            }
        }

        let mut seen_empty_column = false;
        for column in 0..self.width {
            let empty = self.column_is_empty(column);
            if !empty && seen_empty_column {
                return Err(GridError::InvariantViolation(format!(
                    "column {} is occupied but an empty column lies to its left",
                    column
                )));
            }
            seen_empty_column |= empty;
        }

        Ok(())
    }
}

impl<P: Presenter> fmt::Debug for Grid<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("geometry", &self.geometry)
            .field("occupied", &self.occupied_count())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{NullPresenter, PresenterEvent, RecordingPresenter};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn grid(text: &str) -> Grid<NullPresenter> {
        let layout: Layout = text.parse().unwrap();
        Grid::from_layout(&layout, Geometry::default(), NullPresenter).unwrap()
    }

    fn recorded(text: &str) -> Grid<RecordingPresenter> {
        let layout: Layout = text.parse().unwrap();
        Grid::from_layout(&layout, Geometry::default(), RecordingPresenter::new()).unwrap()
    }

    /// Grid filled cell by cell, bypassing the layout checks of `from_layout`
    fn unchecked(text: &str) -> Grid<NullPresenter> {
        let layout: Layout = text.parse().unwrap();
        let mut g = Grid::new(layout.width(), layout.height(), Geometry::default(), NullPresenter).unwrap();
        for (index, tile) in layout.cells().iter().enumerate() {
            if let Some(tile) = *tile {
                g.set(index, Element::new(tile, ())).unwrap();
            }
        }
        g
    }

    fn tile_counts<P: Presenter>(grid: &Grid<P>) -> [usize; 26] {
        let mut counts = [0; 26];
        for (_, tile) in grid.tiles() {
            counts[tile as usize] += 1;
        }
        counts
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        assert!(Grid::new(0, 3, Geometry::default(), NullPresenter).is_err());
        assert!(Grid::new(3, 0, Geometry::default(), NullPresenter).is_err());
        let bad = Geometry::new(Point::default(), CellSize::new(0.0, 1.0));
        assert!(Grid::new(3, 3, bad, NullPresenter).is_err());
    }

    #[test]
    fn test_index_mapping() {
        let g = grid("ABC\nDEF");
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.index_of(2, 1), Some(5));
        assert_eq!(g.index_of(3, 0), None);
        assert_eq!(g.coords(4), (1, 1));
        // Bottom row is the last text line
        assert_eq!(g.tile(0), Some(3));
        assert_eq!(g.tile(5), Some(2));
    }

    #[test]
    fn test_cell_index_of_point() {
        let geometry = Geometry::new(Point::new(-1.0, -2.0), CellSize::new(0.5, 1.0));
        let g = Grid::new(4, 3, geometry, NullPresenter).unwrap();

        assert_eq!(g.cell_index_of(Point::new(-1.0, -2.0)), Some(0));
        assert_eq!(g.cell_index_of(Point::new(-0.26, -1.5)), Some(1));
        assert_eq!(g.cell_index_of(Point::new(0.99, 0.99)), Some(11));
        // Left of and below the origin
        assert_eq!(g.cell_index_of(Point::new(-1.01, -1.5)), None);
        assert_eq!(g.cell_index_of(Point::new(-0.5, -2.01)), None);
        // Right of the last column must not wrap into the next row
        assert_eq!(g.cell_index_of(Point::new(1.1, -1.5)), None);
        assert_eq!(g.cell_index_of(Point::new(0.0, 1.0)), None);
        assert_eq!(g.cell_index_of(Point::new(f32::NAN, 0.0)), None);
    }

    #[test]
    fn test_cell_center_round_trips() {
        let geometry = Geometry::centered(15, 15, CellSize::new(1.2, 1.2));
        let g = Grid::new(15, 15, geometry, NullPresenter).unwrap();
        let c = g.cell_center(0);
        assert!((c.x - (-9.0 + 0.6)).abs() < 1e-5);
        assert!((c.y - (-9.0 + 0.6)).abs() < 1e-5);
        for index in [0, 14, 100, 224] {
            assert_eq!(g.cell_index_of(g.cell_center(index)), Some(index));
        }
    }

    #[test]
    fn test_get_reports_out_of_range() {
        let g = grid("A.");
        assert!(matches!(g.get(0), Ok(Some(e)) if e.tile == 0));
        assert!(matches!(g.get(1), Ok(None)));
        assert_eq!(g.get(2).unwrap_err(), GridError::OutOfRange { index: 2, len: 2 });
        assert_eq!(g.tile(99), None);
    }

    #[test]
    fn test_set_repositions_visual() {
        let mut g = recorded("..\n..");
        let center = g.cell_center(3);
        let displaced = g.set(3, Element::new(4, 77)).unwrap();
        assert!(displaced.is_none());
        assert_eq!(g.tile(3), Some(4));
        assert_eq!(
            g.presenter().events().last(),
            Some(&PresenterEvent::Moved { id: 77, center })
        );
        assert!(g.set(4, Element::new(0, 1)).is_err());
    }

    #[test]
    fn test_neighbors_order_and_occupancy() {
        let g = unchecked("AAA\nA.A\nAAA");
        // Centre cell is empty but its neighbours are all occupied
        assert_eq!(g.neighbors4(4), vec![3, 5, 1, 7]);
        // Corner: only right and up exist
        assert_eq!(g.neighbors4(0), vec![1, 3]);
        // Left of the hole: the right neighbour is empty
        assert_eq!(g.neighbors4(3), vec![0, 6]);
        assert!(g.neighbors4(9).is_empty());
    }

    #[test]
    fn test_gravity_closes_gaps() {
        let mut g = grid("C\nB\nA");
        g.remove_and_compact(&[1]).unwrap();
        assert_eq!(g.layout().to_string(), ".\nC\nA");
        assert!(g.check_invariants().is_ok());
    }

    #[test]
    fn test_empty_columns_are_packed() {
        let mut g = grid("AB.C\nABDC");
        let report = g.remove_and_compact(&[1, 5]).unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(report.columns_shifted, 2);
        assert_eq!(g.layout().to_string(), "A.C.\nADC.");
        assert!(g.check_invariants().is_ok());
    }

    #[test]
    fn test_relative_order_is_preserved() {
        let mut g = grid("D..\nCE.\nBFG\nAAA");
        g.remove_and_compact(&[0, 1, 2]).unwrap();
        assert_eq!(g.layout().to_string(), "...\nD..\nCE.\nBFG");
        g.remove_and_compact(&[0, 3, 6]).unwrap();
        assert_eq!(g.layout().to_string(), "...\n...\nE..\nFG.");
    }

    #[test]
    fn test_invalid_index_leaves_grid_untouched() {
        let mut g = recorded("AB");
        g.presenter_mut().clear_events();
        let err = g.remove_and_compact(&[0, 7]).unwrap_err();
        assert_eq!(err, GridError::OutOfRange { index: 7, len: 2 });
        assert_eq!(g.occupied_count(), 2);
        assert!(g.presenter().events().is_empty());
    }

    #[test]
    fn test_duplicate_indices_are_removed_once() {
        let mut g = recorded("AAB");
        let report = g.remove_and_compact(&[0, 1, 0, 1]).unwrap();
        assert_eq!(report.removed, 2);
        assert_eq!(g.presenter().release_count(), 2);
        assert_eq!(g.layout().to_string(), "B..");
    }

    #[test]
    fn test_presenter_tracks_every_transfer() {
        let mut g = recorded("BC\nAA");
        g.presenter_mut().clear_events();
        g.remove_and_compact(&[0, 1]).unwrap();

        // B and C fall one row each
        assert_eq!(g.presenter().release_count(), 2);
        assert_eq!(g.presenter().move_count(), 2);
        assert_eq!(g.presenter().live_visuals(), 2);
        for event in g.presenter().events() {
            if let PresenterEvent::Moved { center, .. } = event {
                assert!((center.y - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_failing_presenter_does_not_abort_compaction() {
        let layout: Layout = "B.\nAC".parse().unwrap();
        let mut g = Grid::from_layout(&layout, Geometry::default(), RecordingPresenter::failing()).unwrap();
        g.remove_and_compact(&[0]).unwrap();
        assert_eq!(g.layout().to_string(), "..\nBC");
        assert!(g.check_invariants().is_ok());
    }

    #[test]
    fn test_move_column_releases_displaced() {
        let mut g = recorded("AB\nAB");
        g.move_column(1, 0).unwrap();
        assert_eq!(g.layout().to_string(), "B.\nB.");
        assert_eq!(g.presenter().live_visuals(), 2);
        assert!(g.move_column(0, 5).is_err());
    }

    #[test]
    fn test_move_cell_and_clear() {
        let mut g = recorded("A.");
        assert!(g.move_cell(0, 1).unwrap().is_none());
        assert_eq!(g.layout().to_string(), ".A");
        assert!(g.clear(1).unwrap());
        assert!(!g.clear(1).unwrap());
        assert!(g.clear(2).is_err());
        assert_eq!(g.presenter().live_visuals(), 0);
    }

    #[test]
    fn test_check_invariants_detects_violations() {
        assert!(unchecked("A\n.").check_invariants().is_err());
        assert!(unchecked(".A").check_invariants().is_err());
        assert!(unchecked("..\nA.").check_invariants().is_ok());
    }

    #[test]
    fn test_from_layout_rejects_floating_and_unpacked_tiles() {
        for text in ["CAB\n.AB", "A\n.", ".A", "AB.\nA.B"] {
            let layout: Layout = text.parse().unwrap();
            let result = Grid::from_layout(&layout, Geometry::default(), RecordingPresenter::new());
            assert!(matches!(result, Err(GridError::InvariantViolation(_))), "{:?} accepted", text);
        }
        assert!(Grid::from_layout(&"..\nA.".parse().unwrap(), Geometry::default(), NullPresenter).is_ok());
    }

    #[test]
    fn test_column_is_empty_outside_grid() {
        let g = grid("A.\nAB");
        assert!(!g.column_is_empty(0));
        assert!(!g.column_is_empty(2));
        assert!(!g.column_is_empty(usize::MAX));
        assert!(unchecked("A.\nA.").column_is_empty(1));
    }

    #[test]
    fn test_release_all() {
        let mut g = recorded("AB\nCD");
        assert_eq!(g.release_all(), 4);
        assert!(g.is_empty());
        assert_eq!(g.presenter().live_visuals(), 0);
    }

    #[test]
    fn test_random_removals_keep_invariants_and_tiles() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            let width = rng.gen_range(1..8);
            let height = rng.gen_range(1..8);
            let layout = Layout::random(width, height, 4, &mut rng);
            let mut g = Grid::from_layout(&layout, Geometry::default(), RecordingPresenter::new()).unwrap();

            while !g.is_empty() {
                let occupied: Vec<CellIndex> = g.tiles().map(|(i, _)| i).collect();
                let picks: Vec<CellIndex> = occupied
                    .iter()
                    .copied()
                    .filter(|_| rng.gen_bool(0.3))
                    .collect();
                let picks = if picks.is_empty() { vec![occupied[0]] } else { picks };

                let mut expected = tile_counts(&g);
                for &i in &picks {
                    expected[g.tile(i).unwrap() as usize] -= 1;
                }

                g.remove_and_compact(&picks).unwrap();

                assert!(g.check_invariants().is_ok(), "{}", g.layout());
                assert_eq!(tile_counts(&g), expected);
                assert_eq!(g.presenter().live_visuals(), g.occupied_count());
            }
        }
    }
}
